//! ExpireSubscriptionHandler - Command handler for lifecycle termination.
//!
//! Invoked by the scheduler that executes `ScheduleGraceExpiryCheck`
//! intents, and by the period-end sweep over cancelled subscriptions.
//! Expiry is a state, not a deletion; records survive for retention policy
//! to deal with.

use std::sync::Arc;

use tracing::warn;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::domain::subscription::{
    Decision, Subscription, SubscriptionEvent, SubscriptionStatus, TransitionContext,
};
use crate::ports::{EventPublisher, SaveOutcome, SubscriptionStore};

/// Command to expire a subscription whose grace or cancellation window closed.
#[derive(Debug, Clone)]
pub struct ExpireSubscriptionCommand {
    pub subscription_id: SubscriptionId,
}

/// Handler terminating subscriptions.
pub struct ExpireSubscriptionHandler {
    store: Arc<dyn SubscriptionStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl ExpireSubscriptionHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the record does not exist
    /// - `InvalidStateTransition` unless the subscription is GracePeriod
    ///   or Cancelled (or already Expired, which is reported the same way
    ///   so sweep jobs can treat reruns uniformly)
    /// - `VersionConflict` if a concurrent writer won; callers may retry
    pub async fn handle(
        &self,
        cmd: ExpireSubscriptionCommand,
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

        let now = Timestamp::now();
        let previous = subscription.status;
        let expected_version = subscription.version;

        match subscription.apply_transition(SubscriptionStatus::Expired, &TransitionContext::at(now))
        {
            Decision::Applied { .. } => {}
            Decision::Refreshed | Decision::Rejected(_) => {
                return Err(DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!(
                        "Subscription {} cannot expire from {:?}",
                        subscription.id, previous
                    ),
                ));
            }
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

        let event = SubscriptionEvent::Expired {
            subscription_id: subscription.id,
            tenant_id: subscription.tenant_id.clone(),
            previous_status: previous,
            occurred_at: now,
        };
        if let Err(err) = self.publisher.publish(event.to_envelope()).await {
            warn!(
                subscription_id = %subscription.id,
                error = %err,
                "event dispatch failed, expiry already persisted"
            );
        }

        Ok(subscription)
    }
}
