//! StartGracePeriodHandler - Command handler for dunning escalation.
//!
//! Invoked by the dunning process once provider payment retries are
//! exhausted: the subscription moves from PastDue into a bounded grace
//! period, after which access is revoked.

use std::sync::Arc;

use tracing::warn;

use crate::config::BillingConfig;
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::domain::subscription::{
    Decision, SideEffectIntent, Subscription, SubscriptionEvent, SubscriptionStatus,
    TransitionContext,
};
use crate::ports::{EventPublisher, SaveOutcome, SubscriptionStore};

/// Command to move a delinquent subscription into its grace period.
#[derive(Debug, Clone)]
pub struct StartGracePeriodCommand {
    pub subscription_id: SubscriptionId,
}

/// Result carrying the escalated record and the scheduling intents.
#[derive(Debug, Clone)]
pub struct StartGracePeriodResult {
    pub subscription: Subscription,
    /// Includes the grace-expiry check the caller must schedule.
    pub side_effects: Vec<SideEffectIntent>,
}

/// Handler escalating PastDue subscriptions.
pub struct StartGracePeriodHandler {
    store: Arc<dyn SubscriptionStore>,
    publisher: Arc<dyn EventPublisher>,
    billing: BillingConfig,
}

impl StartGracePeriodHandler {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        publisher: Arc<dyn EventPublisher>,
        billing: BillingConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            billing,
        }
    }

    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the record does not exist
    /// - `InvalidStateTransition` unless the subscription is PastDue
    /// - `VersionConflict` if a concurrent writer won; callers may retry
    pub async fn handle(
        &self,
        cmd: StartGracePeriodCommand,
    ) -> Result<StartGracePeriodResult, DomainError> {
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
        let mut ctx = TransitionContext::at(now);
        ctx.grace_period_ends_at = Some(now.add_days(self.billing.grace_period_days as i64));

        let expected_version = subscription.version;
        let side_effects =
            match subscription.apply_transition(SubscriptionStatus::GracePeriod, &ctx) {
                Decision::Applied { side_effects } => side_effects,
                Decision::Refreshed => {
                    return Err(DomainError::new(
                        ErrorCode::InvalidStateTransition,
                        format!("Subscription {} is already in its grace period", subscription.id),
                    ));
                }
                Decision::Rejected(reject) => {
                    return Err(DomainError::new(
                        ErrorCode::InvalidStateTransition,
                        reject.to_string(),
                    ));
                }
            };

        match self.store.save(&subscription, expected_version).await? {
            SaveOutcome::Saved => {}
            SaveOutcome::Conflict => {
                return Err(DomainError::new(
                    ErrorCode::VersionConflict,
                    format!("Concurrent update on subscription {}", subscription.id),
                ));
            }
        }

        let event = SubscriptionEvent::Updated {
            subscription_id: subscription.id,
            tenant_id: subscription.tenant_id.clone(),
            previous_status: previous,
            new_status: subscription.status,
            occurred_at: now,
        };
        if let Err(err) = self.publisher.publish(event.to_envelope()).await {
            warn!(
                subscription_id = %subscription.id,
                error = %err,
                "event dispatch failed, escalation already persisted"
            );
        }

        Ok(StartGracePeriodResult {
            subscription,
            side_effects,
        })
    }
}
