//! Subscription status state machine.
//!
//! Defines all lifecycle states and the legal transitions between them.
//! Every mutation of a subscription's status goes through this table;
//! webhook handlers never encode transition legality themselves.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Subscription lifecycle status.
///
/// The authoritative state used by the rest of the system for feature
/// gating and billing dashboards. The raw provider status string is kept
/// separately on the aggregate as a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Evaluation window before the first payment.
    Trial,

    /// Paid up, full access.
    Active,

    /// Latest payment failed; provider is retrying.
    PastDue,

    /// Voluntarily suspended by the customer. No access, no billing.
    Paused,

    /// Payment retries exhausted; access retained until the grace
    /// deadline passes.
    GracePeriod,

    /// Cancellation requested or provider-terminated. Access continues
    /// until `ends_at`.
    Cancelled,

    /// Lifecycle finished. No access; terminal.
    Expired,
}

impl SubscriptionStatus {
    /// Returns true if this status grants access to the product.
    ///
    /// Cancelled access additionally depends on `ends_at`, which only the
    /// aggregate knows; see `Subscription::has_access`.
    pub fn grants_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Trial
                | SubscriptionStatus::Active
                | SubscriptionStatus::PastDue
                | SubscriptionStatus::GracePeriod
                | SubscriptionStatus::Cancelled
        )
    }

    /// Stable snake_case name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::GracePeriod => "grace_period",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StateMachine for SubscriptionStatus {
    /// Legal transition table.
    ///
    /// The identity transition is always legal: providers resend "updated"
    /// events redundantly, and a self-transition is the diagnostic-refresh
    /// path. It is excluded from `valid_transitions` so `is_terminal`
    /// still identifies Expired.
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        if self == target {
            return true;
        }
        matches!(
            (self, target),
            // From TRIAL
            (Trial, Active)
                | (Trial, PastDue)
                | (Trial, Cancelled)
            // From ACTIVE
                | (Active, PastDue)
                | (Active, Paused)
                | (Active, Cancelled)
            // From PAST_DUE
                | (PastDue, Active)
                | (PastDue, GracePeriod)
                | (PastDue, Cancelled)
            // From PAUSED
                | (Paused, Active)
                | (Paused, Cancelled)
            // From GRACE_PERIOD
                | (GracePeriod, Active)
                | (GracePeriod, Cancelled)
                | (GracePeriod, Expired)
            // From CANCELLED
                | (Cancelled, Expired)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Trial => vec![Active, PastDue, Cancelled],
            Active => vec![PastDue, Paused, Cancelled],
            PastDue => vec![Active, GracePeriod, Cancelled],
            Paused => vec![Active, Cancelled],
            GracePeriod => vec![Active, Cancelled, Expired],
            Cancelled => vec![Expired],
            Expired => vec![],
        }
    }
}
