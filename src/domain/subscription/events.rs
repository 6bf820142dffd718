//! Subscription domain events.
//!
//! Emitted on lifecycle changes and fanned out by the dispatcher to billing
//! notifications, analytics, and other consumers. Dispatch is best-effort:
//! the persisted state change is the durable fact, events are derived from it.
//!
//! Events are named in past tense; each carries the subscription id, the
//! tenant id, and the before/after status where a status changed.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventEnvelope, SubscriptionId, TenantId, Timestamp};

use super::{CancellationReason, SubscriptionStatus};

/// Events that occur during the subscription lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionEvent {
    /// A new subscription record was created (internal purchase action).
    Created {
        subscription_id: SubscriptionId,
        tenant_id: TenantId,
        external_id: String,
        status: SubscriptionStatus,
        occurred_at: Timestamp,
    },

    /// The lifecycle state changed for a reason other than cancellation
    /// or expiry.
    Updated {
        subscription_id: SubscriptionId,
        tenant_id: TenantId,
        previous_status: SubscriptionStatus,
        new_status: SubscriptionStatus,
        occurred_at: Timestamp,
    },

    /// The subscription was cancelled; access runs until `ends_at`.
    Cancelled {
        subscription_id: SubscriptionId,
        tenant_id: TenantId,
        previous_status: SubscriptionStatus,
        reason: Option<CancellationReason>,
        ends_at: Option<Timestamp>,
        occurred_at: Timestamp,
    },

    /// The lifecycle finished; access revoked.
    Expired {
        subscription_id: SubscriptionId,
        tenant_id: TenantId,
        previous_status: SubscriptionStatus,
        occurred_at: Timestamp,
    },

    /// The provider reported a successful invoice payment.
    PaymentSucceeded {
        subscription_id: SubscriptionId,
        tenant_id: TenantId,
        previous_status: SubscriptionStatus,
        new_status: SubscriptionStatus,
        invoice_id: Option<String>,
        amount_paid: Option<i64>,
        occurred_at: Timestamp,
    },

    /// The provider reported a failed invoice payment.
    PaymentFailed {
        subscription_id: SubscriptionId,
        tenant_id: TenantId,
        previous_status: SubscriptionStatus,
        new_status: SubscriptionStatus,
        invoice_id: Option<String>,
        amount_due: Option<i64>,
        occurred_at: Timestamp,
    },
}

impl SubscriptionEvent {
    /// Returns the event type string for routing and filtering.
    pub fn event_type(&self) -> &'static str {
        match self {
            SubscriptionEvent::Created { .. } => "subscription.created",
            SubscriptionEvent::Updated { .. } => "subscription.updated",
            SubscriptionEvent::Cancelled { .. } => "subscription.cancelled",
            SubscriptionEvent::Expired { .. } => "subscription.expired",
            SubscriptionEvent::PaymentSucceeded { .. } => "payment.succeeded",
            SubscriptionEvent::PaymentFailed { .. } => "payment.failed",
        }
    }

    /// Returns the subscription this event is about.
    pub fn subscription_id(&self) -> &SubscriptionId {
        match self {
            SubscriptionEvent::Created {
                subscription_id, ..
            }
            | SubscriptionEvent::Updated {
                subscription_id, ..
            }
            | SubscriptionEvent::Cancelled {
                subscription_id, ..
            }
            | SubscriptionEvent::Expired {
                subscription_id, ..
            }
            | SubscriptionEvent::PaymentSucceeded {
                subscription_id, ..
            }
            | SubscriptionEvent::PaymentFailed {
                subscription_id, ..
            } => subscription_id,
        }
    }

    /// Returns the owning tenant.
    pub fn tenant_id(&self) -> &TenantId {
        match self {
            SubscriptionEvent::Created { tenant_id, .. }
            | SubscriptionEvent::Updated { tenant_id, .. }
            | SubscriptionEvent::Cancelled { tenant_id, .. }
            | SubscriptionEvent::Expired { tenant_id, .. }
            | SubscriptionEvent::PaymentSucceeded { tenant_id, .. }
            | SubscriptionEvent::PaymentFailed { tenant_id, .. } => tenant_id,
        }
    }

    /// Returns when this event occurred.
    pub fn occurred_at(&self) -> Timestamp {
        match self {
            SubscriptionEvent::Created { occurred_at, .. }
            | SubscriptionEvent::Updated { occurred_at, .. }
            | SubscriptionEvent::Cancelled { occurred_at, .. }
            | SubscriptionEvent::Expired { occurred_at, .. }
            | SubscriptionEvent::PaymentSucceeded { occurred_at, .. }
            | SubscriptionEvent::PaymentFailed { occurred_at, .. } => *occurred_at,
        }
    }

    /// Wraps the event for transport through the dispatcher.
    pub fn to_envelope(&self) -> EventEnvelope {
        EventEnvelope::new(
            self.event_type(),
            self.subscription_id().to_string(),
            "Subscription",
            self.occurred_at(),
            serde_json::to_value(self)
                .expect("Event serialization should never fail for well-formed events"),
        )
        .with_tenant_id(self.tenant_id().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription_id() -> SubscriptionId {
        SubscriptionId::new()
    }

    fn tenant_id() -> TenantId {
        TenantId::new("tenant-1").unwrap()
    }

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    #[test]
    fn all_event_types_are_namespaced() {
        let events = vec![
            SubscriptionEvent::Created {
                subscription_id: subscription_id(),
                tenant_id: tenant_id(),
                external_id: "sub_1".to_string(),
                status: SubscriptionStatus::Trial,
                occurred_at: ts(1_700_000_000),
            },
            SubscriptionEvent::Updated {
                subscription_id: subscription_id(),
                tenant_id: tenant_id(),
                previous_status: SubscriptionStatus::Trial,
                new_status: SubscriptionStatus::Active,
                occurred_at: ts(1_700_000_000),
            },
            SubscriptionEvent::Cancelled {
                subscription_id: subscription_id(),
                tenant_id: tenant_id(),
                previous_status: SubscriptionStatus::Active,
                reason: Some(CancellationReason::CustomerRequest),
                ends_at: Some(ts(1_700_100_000)),
                occurred_at: ts(1_700_000_000),
            },
            SubscriptionEvent::Expired {
                subscription_id: subscription_id(),
                tenant_id: tenant_id(),
                previous_status: SubscriptionStatus::Cancelled,
                occurred_at: ts(1_700_000_000),
            },
            SubscriptionEvent::PaymentSucceeded {
                subscription_id: subscription_id(),
                tenant_id: tenant_id(),
                previous_status: SubscriptionStatus::PastDue,
                new_status: SubscriptionStatus::Active,
                invoice_id: Some("in_1".to_string()),
                amount_paid: Some(4900),
                occurred_at: ts(1_700_000_000),
            },
            SubscriptionEvent::PaymentFailed {
                subscription_id: subscription_id(),
                tenant_id: tenant_id(),
                previous_status: SubscriptionStatus::Active,
                new_status: SubscriptionStatus::PastDue,
                invoice_id: None,
                amount_due: Some(4900),
                occurred_at: ts(1_700_000_000),
            },
        ];

        for event in events {
            let event_type = event.event_type();
            assert!(
                event_type.starts_with("subscription.") || event_type.starts_with("payment."),
                "Event type {} should be namespaced",
                event_type
            );
        }
    }

    #[test]
    fn envelope_carries_routing_and_tenant_metadata() {
        let id = subscription_id();
        let event = SubscriptionEvent::Cancelled {
            subscription_id: id,
            tenant_id: tenant_id(),
            previous_status: SubscriptionStatus::Active,
            reason: Some(CancellationReason::ProviderInitiated),
            ends_at: Some(ts(1_700_100_000)),
            occurred_at: ts(1_700_000_000),
        };

        let envelope = event.to_envelope();

        assert_eq!(envelope.event_type, "subscription.cancelled");
        assert_eq!(envelope.aggregate_id, id.to_string());
        assert_eq!(envelope.aggregate_type, "Subscription");
        assert_eq!(envelope.occurred_at, ts(1_700_000_000));
        assert_eq!(envelope.metadata.tenant_id.as_deref(), Some("tenant-1"));
    }

    #[test]
    fn payment_events_carry_before_and_after_status() {
        let event = SubscriptionEvent::PaymentFailed {
            subscription_id: subscription_id(),
            tenant_id: tenant_id(),
            previous_status: SubscriptionStatus::Active,
            new_status: SubscriptionStatus::PastDue,
            invoice_id: Some("in_9".to_string()),
            amount_due: Some(2900),
            occurred_at: ts(1_700_000_000),
        };

        let envelope = event.to_envelope();
        assert_eq!(envelope.payload["PaymentFailed"]["previous_status"], "active");
        assert_eq!(envelope.payload["PaymentFailed"]["new_status"], "past_due");
    }

    #[test]
    fn event_serializes_round_trip() {
        let event = SubscriptionEvent::Updated {
            subscription_id: subscription_id(),
            tenant_id: tenant_id(),
            previous_status: SubscriptionStatus::PastDue,
            new_status: SubscriptionStatus::Active,
            occurred_at: ts(1_700_000_000),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: SubscriptionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.event_type(), "subscription.updated");
    }
}
