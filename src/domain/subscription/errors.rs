//! Webhook error taxonomy.
//!
//! Only structural failures are errors here. Business-level non-actions
//! (unknown subscription, stale event, illegal transition) are reconciler
//! *outcomes*, because surfacing them as delivery failures would make the
//! provider retry payloads whose handling can never change.

use http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur while interpreting or persisting a webhook event.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Event type the normalizer has no mapping for.
    #[error("Unsupported event type: {0}")]
    UnsupportedEventType(String),

    /// Payload carries no subscription id to correlate against.
    #[error("Missing subscription id in event payload")]
    MissingSubscriptionId,

    /// A required timestamp field cannot be represented.
    #[error("Malformed timestamp field: {0}")]
    MalformedTimestamp(&'static str),

    /// Subscription store unavailable or failing.
    #[error("Store error: {0}")]
    Store(String),
}

impl WebhookError {
    /// Returns true if the provider should redeliver this event.
    ///
    /// Only infrastructure trouble qualifies; malformed payloads will be
    /// exactly as malformed on the next attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Store(_))
    }

    /// Maps the error to the status code the webhook boundary should answer
    /// with. The boundary owns the HTTP layer; this keeps the retry
    /// semantics decided in one place.
    ///
    /// - 2xx: acknowledged, no redelivery
    /// - 4xx: uninterpretable payload, no redelivery
    /// - 5xx: transient, provider will redeliver
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Not ours to handle; acknowledge so the provider stops sending it.
            WebhookError::UnsupportedEventType(_) => StatusCode::OK,

            // Structurally uninterpretable - redelivery of the same payload
            // cannot help, but a corrected batch might.
            WebhookError::MissingSubscriptionId | WebhookError::MalformedTimestamp(_) => {
                StatusCode::BAD_REQUEST
            }

            // Transient - redelivery expected to succeed.
            WebhookError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Store(err.to_string())
    }
}
