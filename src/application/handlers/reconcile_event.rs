//! ReconcileEventHandler - merges one normalized provider event into the
//! subscription record.
//!
//! This is the single entry point for webhook-driven mutation. Every
//! business-level non-action (unknown subscription, stale event, illegal
//! transition) is an `Ignored` outcome rather than an error: delivery
//! acknowledgment must not depend on whether the event changed anything,
//! or the provider would retry payloads whose handling can never change.
//!
//! ## Concurrency
//!
//! Two deliveries for the same subscription may race. Each attempt re-reads
//! the record and commits with a version check; the loser retries its whole
//! derivation once against the fresh record, then reports `Conflicted` for
//! external backoff.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::foundation::{StateMachine, SubscriptionId};
use crate::domain::subscription::{
    proposed_status, Decision, EventKind, NormalizedEvent, SideEffectIntent, Subscription,
    SubscriptionEvent, SubscriptionStatus, TransitionContext, WebhookError,
};
use crate::ports::{EventPublisher, SaveOutcome, SubscriptionStore};

/// Why an event was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No record with the event's external id. Legitimate: other tenants
    /// and environments share the provider account.
    UnknownSubscription,

    /// The event predates the last applied event for this subscription.
    StaleEvent,

    /// The proposed transition is not legal from the current state.
    IllegalTransition {
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    },
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IgnoreReason::UnknownSubscription => write!(f, "unknown subscription"),
            IgnoreReason::StaleEvent => write!(f, "stale event"),
            IgnoreReason::IllegalTransition { from, to } => {
                write!(f, "illegal transition {} -> {}", from, to)
            }
        }
    }
}

/// Result of reconciling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The lifecycle state changed and was persisted.
    Applied {
        subscription_id: SubscriptionId,
        previous_status: SubscriptionStatus,
        new_status: SubscriptionStatus,
        side_effects: Vec<SideEffectIntent>,
    },

    /// No lifecycle change; diagnostic fields were refreshed and persisted.
    Refreshed { subscription_id: SubscriptionId },

    /// Expected non-action; nothing was written.
    Ignored(IgnoreReason),

    /// Two consecutive version conflicts; external scheduling should retry.
    Conflicted,
}

enum Attempt {
    Done(ReconcileOutcome),
    Conflict,
}

/// Handler merging provider events into subscription records.
pub struct ReconcileEventHandler {
    store: Arc<dyn SubscriptionStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl ReconcileEventHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    /// Reconcile one normalized event.
    ///
    /// Safe to invoke any number of times with the same or reordered
    /// payloads; the staleness fence and the transition table keep state
    /// from regressing.
    ///
    /// # Errors
    ///
    /// Only infrastructure failure (`WebhookError::Store`) is an error;
    /// the webhook boundary maps it to a retryable response.
    pub async fn reconcile(
        &self,
        event: &NormalizedEvent,
    ) -> Result<ReconcileOutcome, WebhookError> {
        match self.attempt(event).await? {
            Attempt::Done(outcome) => Ok(outcome),
            Attempt::Conflict => match self.attempt(event).await? {
                Attempt::Done(outcome) => Ok(outcome),
                Attempt::Conflict => {
                    warn!(
                        external_id = %event.external_subscription_id,
                        provider_event_id = %event.provider_event_id,
                        "reconciliation conflicted twice, reporting for external retry"
                    );
                    Ok(ReconcileOutcome::Conflicted)
                }
            },
        }
    }

    /// One full read-decide-write pass.
    async fn attempt(&self, event: &NormalizedEvent) -> Result<Attempt, WebhookError> {
        // 1. Locate the record.
        let Some(mut subscription) = self
            .store
            .find_by_external_id(&event.external_subscription_id)
            .await?
        else {
            info!(
                external_id = %event.external_subscription_id,
                kind = %event.kind,
                reason = %IgnoreReason::UnknownSubscription,
                "event ignored"
            );
            return Ok(Attempt::Done(ReconcileOutcome::Ignored(
                IgnoreReason::UnknownSubscription,
            )));
        };

        // 2. Staleness fence. Strict comparison: a same-timestamp
        // redelivery falls through to the idempotent refresh path.
        if let Some(last_event_at) = subscription.last_event_at {
            if event.occurred_at.is_before(&last_event_at) {
                info!(
                    subscription_id = %subscription.id,
                    occurred_at = %event.occurred_at,
                    last_event_at = %last_event_at,
                    reason = %IgnoreReason::StaleEvent,
                    "event ignored"
                );
                return Ok(Attempt::Done(ReconcileOutcome::Ignored(
                    IgnoreReason::StaleEvent,
                )));
            }
        }

        let current = subscription.status;
        let target = derive_target(current, event);

        // 3. Terminal guard. The table already rejects every exit from
        // Expired; this additionally stops diagnostic refreshes from
        // touching a finished record.
        if current.is_terminal() {
            let reason = IgnoreReason::IllegalTransition {
                from: current,
                to: target.unwrap_or(current),
            };
            warn!(subscription_id = %subscription.id, %reason, "event ignored");
            return Ok(Attempt::Done(ReconcileOutcome::Ignored(reason)));
        }

        // 4. Decide and fold into the record. No proposal means an
        // identity transition: diagnostics only.
        let target = target.unwrap_or(current);
        let ctx = transition_context(event);
        let expected_version = subscription.version;
        let decision = subscription.apply_transition(target, &ctx);

        let outcome = match &decision {
            Decision::Rejected(reject) => {
                let reason = IgnoreReason::IllegalTransition {
                    from: current,
                    to: target,
                };
                warn!(
                    subscription_id = %subscription.id,
                    detail = %reject,
                    %reason,
                    "event ignored"
                );
                return Ok(Attempt::Done(ReconcileOutcome::Ignored(reason)));
            }
            Decision::Applied { side_effects } => ReconcileOutcome::Applied {
                subscription_id: subscription.id,
                previous_status: current,
                new_status: target,
                side_effects: side_effects.clone(),
            },
            Decision::Refreshed => ReconcileOutcome::Refreshed {
                subscription_id: subscription.id,
            },
        };

        // 5. Persist atomically; a lost race restarts the whole pass.
        match self.store.save(&subscription, expected_version).await? {
            SaveOutcome::Conflict => {
                info!(
                    subscription_id = %subscription.id,
                    "concurrent write detected, re-reading"
                );
                return Ok(Attempt::Conflict);
            }
            SaveOutcome::Saved => {}
        }

        if let ReconcileOutcome::Applied {
            previous_status,
            new_status,
            ..
        } = &outcome
        {
            info!(
                subscription_id = %subscription.id,
                from = %previous_status,
                to = %new_status,
                "transition applied"
            );
        }

        // 6. Dispatch is best-effort: the persisted write is the durable
        // fact and is never rolled back over a notification failure.
        let events = derive_domain_events(&subscription, current, event, &outcome);
        if !events.is_empty() {
            let envelopes = events
                .iter()
                .map(|e| {
                    e.to_envelope()
                        .with_causation_id(event.provider_event_id.clone())
                })
                .collect();
            if let Err(err) = self.publisher.publish_all(envelopes).await {
                warn!(
                    subscription_id = %subscription.id,
                    error = %err,
                    "event dispatch failed, state change already persisted"
                );
            }
        }

        Ok(Attempt::Done(outcome))
    }
}

/// Derives the proposed target state, if the event proposes one.
///
/// Status-bearing kinds go through the provider status mapping. Payment
/// outcomes derive implicitly: failure attempts PastDue, success attempts
/// Active only from PastDue so it never force-activates a deliberately
/// paused or cancelled subscription.
fn derive_target(
    current: SubscriptionStatus,
    event: &NormalizedEvent,
) -> Option<SubscriptionStatus> {
    match event.kind {
        EventKind::SubscriptionCreated | EventKind::SubscriptionUpdated => event
            .provider_status
            .as_deref()
            .and_then(proposed_status),
        EventKind::SubscriptionDeleted => Some(SubscriptionStatus::Cancelled),
        EventKind::InvoicePaymentFailed => Some(SubscriptionStatus::PastDue),
        EventKind::InvoicePaymentSucceeded => {
            (current == SubscriptionStatus::PastDue).then_some(SubscriptionStatus::Active)
        }
    }
}

fn transition_context(event: &NormalizedEvent) -> TransitionContext {
    TransitionContext {
        provider_initiated: true,
        provider_status: event.provider_status.clone(),
        period_start: event.period_start,
        period_end: event.period_end,
        ..TransitionContext::at(event.occurred_at)
    }
}

/// Maps a persisted outcome to the domain events the dispatcher fans out.
///
/// Payment facts are reported even when the lifecycle state did not change;
/// lifecycle events are reported only for applied transitions.
fn derive_domain_events(
    subscription: &Subscription,
    previous: SubscriptionStatus,
    event: &NormalizedEvent,
    outcome: &ReconcileOutcome,
) -> Vec<SubscriptionEvent> {
    let new_status = subscription.status;

    match event.kind {
        EventKind::InvoicePaymentSucceeded => vec![SubscriptionEvent::PaymentSucceeded {
            subscription_id: subscription.id,
            tenant_id: subscription.tenant_id.clone(),
            previous_status: previous,
            new_status,
            invoice_id: event.invoice_id.clone(),
            amount_paid: event.amount_paid,
            occurred_at: event.occurred_at,
        }],
        EventKind::InvoicePaymentFailed => vec![SubscriptionEvent::PaymentFailed {
            subscription_id: subscription.id,
            tenant_id: subscription.tenant_id.clone(),
            previous_status: previous,
            new_status,
            invoice_id: event.invoice_id.clone(),
            amount_due: event.amount_due,
            occurred_at: event.occurred_at,
        }],
        _ => match outcome {
            ReconcileOutcome::Applied { .. } => {
                let lifecycle_event = match new_status {
                    SubscriptionStatus::Cancelled => SubscriptionEvent::Cancelled {
                        subscription_id: subscription.id,
                        tenant_id: subscription.tenant_id.clone(),
                        previous_status: previous,
                        reason: subscription.cancellation_reason,
                        ends_at: subscription.ends_at,
                        occurred_at: event.occurred_at,
                    },
                    SubscriptionStatus::Expired => SubscriptionEvent::Expired {
                        subscription_id: subscription.id,
                        tenant_id: subscription.tenant_id.clone(),
                        previous_status: previous,
                        occurred_at: event.occurred_at,
                    },
                    _ => SubscriptionEvent::Updated {
                        subscription_id: subscription.id,
                        tenant_id: subscription.tenant_id.clone(),
                        previous_status: previous,
                        new_status,
                        occurred_at: event.occurred_at,
                    },
                };
                vec![lifecycle_event]
            }
            _ => vec![],
        },
    }
}
