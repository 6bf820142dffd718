//! Foundation module - shared kernel for the domain layer.
//!
//! - `errors` - DomainError and validation errors
//! - `ids` - strongly-typed identifiers
//! - `timestamp` - UTC timestamp value object
//! - `state_machine` - transition-table trait for status enums
//! - `events` - event envelope infrastructure for the dispatcher

mod errors;
mod events;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{EventEnvelope, EventId, EventMetadata};
pub use ids::{ExternalSubscriptionId, SubscriptionId, TenantId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
