//! EventPublisher port - Interface for publishing domain events.
//!
//! Defines how the core publishes events without knowing the transport
//! (in-memory, message broker, outbox table).

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
///
/// Delivery is at-least-once: consumers may receive duplicates and must
/// deduplicate on `event_id`. The reconciler treats publication as
/// fire-and-forget - a failed publish is logged, never rolled back into the
/// persisted state change.
///
/// # Example
///
/// ```ignore
/// let envelope = event.to_envelope().with_causation_id(provider_event_id);
/// publisher.publish(envelope).await?;
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish multiple events.
    ///
    /// Atomic where the adapter supports it; otherwise sequential with
    /// best-effort delivery.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError>;
}
