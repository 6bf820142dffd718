//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the reconciliation core and the outside world. Adapters implement them.
//!
//! - `SubscriptionStore` - record persistence with optimistic concurrency
//! - `EventPublisher` - fire-and-forget domain event dispatch
//! - `EventSubscriber` / `EventHandler` - consumer-side fan-out

mod event_publisher;
mod event_subscriber;
mod subscription_store;

pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber};
pub use subscription_store::{SaveOutcome, SubscriptionStore};
