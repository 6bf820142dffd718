//! Event normalization.
//!
//! Maps heterogeneous provider payloads into one canonical `NormalizedEvent`
//! the reconciler understands. Partial payloads normalize fine; only a
//! missing subscription id is structural failure, because without it the
//! event cannot be correlated to any record.

use crate::domain::foundation::{ExternalSubscriptionId, Timestamp};

use super::provider_event::{ProviderEvent, ProviderEventKind};
use super::{SubscriptionStatus, WebhookError};

/// Canonical event kinds the reconciler handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SubscriptionCreated => "subscription_created",
            EventKind::SubscriptionUpdated => "subscription_updated",
            EventKind::SubscriptionDeleted => "subscription_deleted",
            EventKind::InvoicePaymentSucceeded => "invoice_payment_succeeded",
            EventKind::InvoicePaymentFailed => "invoice_payment_failed",
        }
    }

    /// True for the invoice kinds, which carry payment outcomes rather
    /// than a subscription status.
    pub fn is_payment_outcome(&self) -> bool {
        matches!(
            self,
            EventKind::InvoicePaymentSucceeded | EventKind::InvoicePaymentFailed
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical, provider-agnostic view of one webhook event.
///
/// Ephemeral: built per delivery, handed to the reconciler, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub kind: EventKind,

    /// Provider id of the event itself, kept for causation tracking.
    pub provider_event_id: String,

    /// Correlation key to the subscription record.
    pub external_subscription_id: ExternalSubscriptionId,

    /// Raw provider status string, when the payload carried one.
    pub provider_status: Option<String>,

    /// Billing period reported by the event.
    pub period_start: Option<Timestamp>,
    pub period_end: Option<Timestamp>,

    /// Invoice facts, for payment-outcome kinds. Amounts in cents.
    pub invoice_id: Option<String>,
    pub amount_paid: Option<i64>,
    pub amount_due: Option<i64>,

    /// Provider-reported event time; drives the staleness fence.
    pub occurred_at: Timestamp,

    /// Local receipt time.
    pub received_at: Timestamp,
}

/// Maps a raw provider status string to the internal state it proposes.
///
/// Unmapped statuses propose nothing; the reconciler then only refreshes
/// diagnostic fields.
pub fn proposed_status(raw: &str) -> Option<SubscriptionStatus> {
    match raw {
        "active" => Some(SubscriptionStatus::Active),
        "trialing" => Some(SubscriptionStatus::Trial),
        "past_due" => Some(SubscriptionStatus::PastDue),
        "unpaid" => Some(SubscriptionStatus::PastDue),
        "canceled" => Some(SubscriptionStatus::Cancelled),
        _ => None,
    }
}

/// Normalize a provider event into the canonical internal shape.
///
/// Tolerates absent optional fields (period dates, invoice amounts, status).
/// Fails only when the event cannot be interpreted at all: an unsupported
/// type, a missing subscription id, or an unrepresentable timestamp.
pub fn normalize(event: &ProviderEvent) -> Result<NormalizedEvent, WebhookError> {
    let kind = match event.parsed_kind() {
        ProviderEventKind::SubscriptionCreated => EventKind::SubscriptionCreated,
        ProviderEventKind::SubscriptionUpdated => EventKind::SubscriptionUpdated,
        ProviderEventKind::SubscriptionDeleted => EventKind::SubscriptionDeleted,
        ProviderEventKind::InvoicePaymentSucceeded => EventKind::InvoicePaymentSucceeded,
        ProviderEventKind::InvoicePaymentFailed => EventKind::InvoicePaymentFailed,
        ProviderEventKind::Unknown(other) => {
            return Err(WebhookError::UnsupportedEventType(other));
        }
    };

    let object = &event.data.object;

    // Subscription events carry their own id; invoice events reference the
    // subscription they bill.
    let external_subscription_id = if kind.is_payment_outcome() {
        object.get("subscription").and_then(|v| v.as_str())
    } else {
        object.get("id").and_then(|v| v.as_str())
    };
    let external_subscription_id = external_subscription_id
        .and_then(|id| ExternalSubscriptionId::new(id).ok())
        .ok_or(WebhookError::MissingSubscriptionId)?;

    let occurred_at = Timestamp::from_unix_secs(event.created)
        .ok_or(WebhookError::MalformedTimestamp("created"))?;

    let period_start = unix_field(object, "current_period_start");
    let period_end = unix_field(object, "current_period_end");

    let (invoice_id, amount_paid, amount_due) = if kind.is_payment_outcome() {
        (
            object
                .get("id")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            object.get("amount_paid").and_then(|v| v.as_i64()),
            object.get("amount_due").and_then(|v| v.as_i64()),
        )
    } else {
        (None, None, None)
    };

    Ok(NormalizedEvent {
        kind,
        provider_event_id: event.id.clone(),
        external_subscription_id,
        provider_status: object
            .get("status")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        period_start,
        period_end,
        invoice_id,
        amount_paid,
        amount_due,
        occurred_at,
        received_at: Timestamp::now(),
    })
}

/// Reads an optional Unix-seconds field, dropping unrepresentable values.
fn unix_field(object: &serde_json::Value, field: &str) -> Option<Timestamp> {
    object
        .get(field)
        .and_then(|v| v.as_i64())
        .and_then(Timestamp::from_unix_secs)
}
