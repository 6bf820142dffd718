//! Application layer - Commands and Handlers.
//!
//! Orchestrates domain operations and coordinates between ports. The
//! reconciler is the webhook-facing entry point; the command handlers are
//! driven by internal flows (checkout, dunning, scheduled sweeps).

pub mod handlers;

pub use handlers::{
    CancelSubscriptionCommand, CancelSubscriptionHandler,
    CreateSubscriptionCommand, CreateSubscriptionHandler,
    ExpireSubscriptionCommand, ExpireSubscriptionHandler,
    IgnoreReason, ReconcileEventHandler, ReconcileOutcome,
    StartGracePeriodCommand, StartGracePeriodHandler, StartGracePeriodResult,
};
