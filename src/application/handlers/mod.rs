//! Subscription lifecycle handlers.
//!
//! ## Commands
//! - Creating subscriptions for completed purchases
//! - Cancelling subscriptions on user request
//! - Escalating delinquent subscriptions into the grace period
//! - Expiring subscriptions whose grace or cancellation window closed
//!
//! ## Reconciliation
//! - Merging normalized provider webhook events into the record

mod cancel_subscription;
mod create_subscription;
mod expire_subscription;
mod reconcile_event;
mod start_grace_period;

pub use cancel_subscription::{CancelSubscriptionCommand, CancelSubscriptionHandler};
pub use create_subscription::{CreateSubscriptionCommand, CreateSubscriptionHandler};
pub use expire_subscription::{ExpireSubscriptionCommand, ExpireSubscriptionHandler};
pub use reconcile_event::{IgnoreReason, ReconcileEventHandler, ReconcileOutcome};
pub use start_grace_period::{
    StartGracePeriodCommand, StartGracePeriodHandler, StartGracePeriodResult,
};
