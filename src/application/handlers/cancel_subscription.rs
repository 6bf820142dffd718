//! CancelSubscriptionHandler - Command handler for requested cancellations.
//!
//! Unlike webhook reconciliation, an internal command surfaces an illegal
//! transition as an error: the caller is a user-facing flow that can react,
//! not a provider retry loop that cannot.

use std::sync::Arc;

use tracing::warn;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::domain::subscription::{
    CancellationReason, Decision, Subscription, SubscriptionEvent, SubscriptionStatus,
    TransitionContext,
};
use crate::ports::{EventPublisher, SaveOutcome, SubscriptionStore};

/// Command to cancel a subscription.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    pub reason: CancellationReason,
    /// Free-text feedback given at cancellation.
    pub feedback: Option<String>,
    /// Keep access until the current period ends instead of immediately.
    pub at_period_end: bool,
}

/// Handler for cancellation requests.
pub struct CancelSubscriptionHandler {
    store: Arc<dyn SubscriptionStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl CancelSubscriptionHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the record does not exist
    /// - `InvalidStateTransition` if the current state cannot cancel
    /// - `VersionConflict` if a concurrent writer won; callers may retry
    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<Subscription, DomainError> {
        let mut subscription = self
            .store
            .find_by_id(&cmd.subscription_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::SubscriptionNotFound,
                    format!("No subscription {}", cmd.subscription_id),
                )
            })?;

        // Re-cancelling would land on the engine's diagnostic-refresh path;
        // for a user-facing command that is a caller mistake, not a no-op.
        if subscription.status == SubscriptionStatus::Cancelled {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Subscription {} is already cancelled", subscription.id),
            ));
        }

        let now = Timestamp::now();
        let previous = subscription.status;
        let mut ctx = TransitionContext::at(now);
        ctx.cancellation_reason = Some(cmd.reason);
        ctx.cancellation_feedback = cmd.feedback;
        if cmd.at_period_end {
            ctx.ends_at = Some(subscription.current_period_end);
        }

        let expected_version = subscription.version;
        if let Decision::Rejected(reject) =
            subscription.apply_transition(SubscriptionStatus::Cancelled, &ctx)
        {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                reject.to_string(),
            ));
        }

        match self.store.save(&subscription, expected_version).await? {
            SaveOutcome::Saved => {}
            SaveOutcome::Conflict => {
                return Err(DomainError::new(
                    ErrorCode::VersionConflict,
                    format!("Concurrent update on subscription {}", subscription.id),
                ));
            }
        }

        let event = SubscriptionEvent::Cancelled {
            subscription_id: subscription.id,
            tenant_id: subscription.tenant_id.clone(),
            previous_status: previous,
            reason: subscription.cancellation_reason,
            ends_at: subscription.ends_at,
            occurred_at: now,
        };
        if let Err(err) = self.publisher.publish(event.to_envelope()).await {
            warn!(
                subscription_id = %subscription.id,
                error = %err,
                "event dispatch failed, cancellation already persisted"
            );
        }

        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryEventBus, InMemorySubscriptionStore};
    use crate::domain::foundation::{ExternalSubscriptionId, TenantId};

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    fn active_subscription() -> Subscription {
        Subscription::start_active(
            SubscriptionId::new(),
            TenantId::new("tenant-1").unwrap(),
            ExternalSubscriptionId::new("sub_123").unwrap(),
            1,
            ts(1_700_000_000),
            ts(1_702_600_000),
        )
        .unwrap()
    }

    async fn handler_with(
        subscription: &Subscription,
    ) -> (
        CancelSubscriptionHandler,
        Arc<InMemorySubscriptionStore>,
        Arc<InMemoryEventBus>,
    ) {
        let store = Arc::new(InMemorySubscriptionStore::new());
        store.insert(subscription).await.unwrap();
        let bus = Arc::new(InMemoryEventBus::new());
        let handler = CancelSubscriptionHandler::new(store.clone(), bus.clone());
        (handler, store, bus)
    }

    #[tokio::test]
    async fn cancellation_at_period_end_defers_access_loss() {
        let subscription = active_subscription();
        let (handler, store, bus) = handler_with(&subscription).await;

        let cancelled = handler
            .handle(CancelSubscriptionCommand {
                subscription_id: subscription.id,
                reason: CancellationReason::CustomerRequest,
                feedback: Some("too expensive".to_string()),
                at_period_end: true,
            })
            .await
            .unwrap();

        assert_eq!(cancelled.status, SubscriptionStatus::Cancelled);
        assert_eq!(cancelled.ends_at, Some(ts(1_702_600_000)));
        assert_eq!(
            cancelled.cancellation_reason,
            Some(CancellationReason::CustomerRequest)
        );
        assert_eq!(
            cancelled.cancellation_feedback.as_deref(),
            Some("too expensive")
        );
        assert_eq!(store.len(), 1);
        assert!(bus.has_event("subscription.cancelled"));
    }

    #[tokio::test]
    async fn immediate_cancellation_ends_access_now() {
        let subscription = active_subscription();
        let (handler, _store, _bus) = handler_with(&subscription).await;

        let cancelled = handler
            .handle(CancelSubscriptionCommand {
                subscription_id: subscription.id,
                reason: CancellationReason::Fraud,
                feedback: None,
                at_period_end: false,
            })
            .await
            .unwrap();

        // Immediate cancellation stamps the request time, not the period end.
        let ends_at = cancelled.ends_at.unwrap();
        assert_ne!(ends_at, cancelled.current_period_end);
    }

    #[tokio::test]
    async fn cancelling_missing_subscription_fails() {
        let (handler, _store, _bus) = handler_with(&active_subscription()).await;

        let err = handler
            .handle(CancelSubscriptionCommand {
                subscription_id: SubscriptionId::new(),
                reason: CancellationReason::CustomerRequest,
                feedback: None,
                at_period_end: true,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
    }

    #[tokio::test]
    async fn cancelling_twice_is_an_invalid_transition() {
        let subscription = active_subscription();
        let (handler, _store, _bus) = handler_with(&subscription).await;

        let cmd = CancelSubscriptionCommand {
            subscription_id: subscription.id,
            reason: CancellationReason::CustomerRequest,
            feedback: None,
            at_period_end: true,
        };
        handler.handle(cmd.clone()).await.unwrap();

        let err = handler.handle(cmd).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }
}
