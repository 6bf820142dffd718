//! Subscription domain module.
//!
//! The reconciliation core: lifecycle state machine, the subscription
//! aggregate, provider event normalization, and the domain events emitted
//! on lifecycle changes.
//!
//! # Module Structure
//!
//! - `status` - SubscriptionStatus state machine
//! - `transition` - pure transition engine (decisions + side-effect intents)
//! - `aggregate` - Subscription aggregate entity
//! - `provider_event` - deserialized provider webhook payload
//! - `normalizer` - field-mapping into NormalizedEvent
//! - `events` - SubscriptionEvent domain events
//! - `errors` - webhook error taxonomy

mod aggregate;
mod errors;
mod events;
mod normalizer;
mod provider_event;
mod status;
mod transition;

pub use aggregate::Subscription;
pub use errors::WebhookError;
pub use events::SubscriptionEvent;
pub use normalizer::{normalize, proposed_status, EventKind, NormalizedEvent};
pub use provider_event::{ProviderEvent, ProviderEventData, ProviderEventKind};
pub use status::SubscriptionStatus;
pub use transition::{
    decide, CancellationReason, Decision, RejectReason, SideEffectIntent, TransitionContext,
};

#[cfg(test)]
pub use provider_event::ProviderEventBuilder;
