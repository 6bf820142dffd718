//! Event infrastructure for domain event dispatch.
//!
//! - `EventId` - unique identifier for events (deduplication)
//! - `EventMetadata` - tracing and correlation context
//! - `EventEnvelope` - transport wrapper handed to the dispatcher

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

use super::Timestamp;

/// Unique identifier for events (used for deduplication by consumers).
///
/// Uses a String internally to allow various ID formats (UUID, ULID,
/// provider-issued ids) while staying serializable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a new random EventId using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates an EventId from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata for tracing and correlation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// ID linking related events across a single delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// ID of the event that directly caused this event (e.g. the provider
    /// webhook event id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,

    /// Tenant the event belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Distributed tracing span/trace ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// Transport envelope for domain events.
///
/// Wraps event-specific data with what consumers need for routing
/// (event_type), deduplication (event_id), correlation (aggregate_id,
/// metadata), and ordering (occurred_at).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique ID for this event instance.
    pub event_id: EventId,

    /// Event type for routing (e.g., "subscription.cancelled").
    pub event_type: String,

    /// ID of the aggregate that emitted this event.
    pub aggregate_id: String,

    /// Type of aggregate (e.g., "Subscription").
    pub aggregate_type: String,

    /// When the event occurred.
    pub occurred_at: Timestamp,

    /// Event-specific payload as JSON.
    pub payload: JsonValue,

    /// Tracing and correlation metadata.
    pub metadata: EventMetadata,
}

impl EventEnvelope {
    /// Creates a new EventEnvelope with a fresh event id and empty metadata.
    pub fn new(
        event_type: impl Into<String>,
        aggregate_id: impl Into<String>,
        aggregate_type: impl Into<String>,
        occurred_at: Timestamp,
        payload: JsonValue,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: event_type.into(),
            aggregate_id: aggregate_id.into(),
            aggregate_type: aggregate_type.into(),
            occurred_at,
            payload,
            metadata: EventMetadata::default(),
        }
    }

    /// Add correlation ID for delivery tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.correlation_id = Some(id.into());
        self
    }

    /// Add causation ID (ID of the event that caused this one).
    pub fn with_causation_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.causation_id = Some(id.into());
        self
    }

    /// Add tenant ID for consumer-side scoping.
    pub fn with_tenant_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.tenant_id = Some(id.into());
        self
    }

    /// Add trace ID for distributed tracing.
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.trace_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_ids_are_unique() {
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn event_id_from_string_preserves_value() {
        let id = EventId::from_string("evt_provider_123");
        assert_eq!(id.as_str(), "evt_provider_123");
    }

    #[test]
    fn envelope_new_populates_defaults() {
        let envelope = EventEnvelope::new(
            "subscription.updated",
            "sub-1",
            "Subscription",
            Timestamp::now(),
            json!({"status": "active"}),
        );

        assert_eq!(envelope.event_type, "subscription.updated");
        assert_eq!(envelope.aggregate_id, "sub-1");
        assert_eq!(envelope.aggregate_type, "Subscription");
        assert_eq!(envelope.metadata, EventMetadata::default());
    }

    #[test]
    fn envelope_builder_methods_set_metadata() {
        let envelope = EventEnvelope::new(
            "payment.failed",
            "sub-1",
            "Subscription",
            Timestamp::now(),
            json!({}),
        )
        .with_causation_id("evt_9")
        .with_tenant_id("acme")
        .with_correlation_id("corr-1")
        .with_trace_id("trace-1");

        assert_eq!(envelope.metadata.causation_id.as_deref(), Some("evt_9"));
        assert_eq!(envelope.metadata.tenant_id.as_deref(), Some("acme"));
        assert_eq!(envelope.metadata.correlation_id.as_deref(), Some("corr-1"));
        assert_eq!(envelope.metadata.trace_id.as_deref(), Some("trace-1"));
    }

    #[test]
    fn envelope_serializes_round_trip() {
        let envelope = EventEnvelope::new(
            "subscription.cancelled",
            "sub-2",
            "Subscription",
            Timestamp::now(),
            json!({"reason": "customer_request"}),
        );

        let json = serde_json::to_string(&envelope).unwrap();
        let back: EventEnvelope = serde_json::from_str(&json).unwrap();

        assert_eq!(back.event_id, envelope.event_id);
        assert_eq!(back.event_type, envelope.event_type);
        assert_eq!(back.payload["reason"], "customer_request");
    }

    #[test]
    fn empty_metadata_fields_are_omitted_from_json() {
        let envelope = EventEnvelope::new(
            "subscription.updated",
            "sub-3",
            "Subscription",
            Timestamp::now(),
            json!({}),
        );

        let json = serde_json::to_string(&envelope).unwrap();
        assert!(!json.contains("correlation_id"));
        assert!(!json.contains("trace_id"));
    }
}
