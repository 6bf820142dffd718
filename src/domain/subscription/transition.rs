//! Pure transition engine.
//!
//! `decide` evaluates a requested transition against the legality table and
//! context preconditions, producing the side-effect intents the transition
//! implies. It never touches I/O and never panics; illegality is a returned
//! value, not an error, because callers reconciling provider webhooks must
//! treat it as a no-op rather than a delivery failure.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{StateMachine, Timestamp};

use super::SubscriptionStatus;

/// Why a subscription was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationReason {
    /// The customer asked to cancel.
    CustomerRequest,

    /// Cancelled after unrecoverable payment failure.
    PaymentFailure,

    /// The provider terminated the subscription (e.g. a
    /// `customer.subscription.deleted` webhook).
    ProviderInitiated,

    /// Cancelled by an operator for abuse or fraud.
    Fraud,

    /// Anything else; details go in `cancellation_feedback`.
    Other,
}

impl CancellationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancellationReason::CustomerRequest => "customer_request",
            CancellationReason::PaymentFailure => "payment_failure",
            CancellationReason::ProviderInitiated => "provider_initiated",
            CancellationReason::Fraud => "fraud",
            CancellationReason::Other => "other",
        }
    }
}

impl std::fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Context accompanying a transition request.
///
/// Carries the data the target state needs (deadlines, reasons) and the
/// diagnostic fields to refresh regardless of outcome. Fields the event did
/// not carry stay `None` and leave the record untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionContext {
    /// When the triggering event occurred (provider-reported time for
    /// webhooks, local time for internal commands).
    pub effective_at: Timestamp,

    /// True when the provider initiated this change; relaxes the
    /// cancellation-reason precondition.
    pub provider_initiated: bool,

    /// Raw provider status string, recorded as a diagnostic.
    pub provider_status: Option<String>,

    /// New billing period, when the event carried one.
    pub period_start: Option<Timestamp>,
    pub period_end: Option<Timestamp>,

    /// When access ends for a scheduled cancellation. Defaults to
    /// `effective_at` when absent.
    pub ends_at: Option<Timestamp>,

    /// Deadline for a grace-period transition. Required for GracePeriod.
    pub grace_period_ends_at: Option<Timestamp>,

    /// Cancellation context. A reason (or `provider_initiated`) is
    /// required for Cancelled.
    pub cancellation_reason: Option<CancellationReason>,
    pub cancellation_feedback: Option<String>,
}

impl TransitionContext {
    /// A minimal context effective at the given time.
    pub fn at(effective_at: Timestamp) -> Self {
        Self {
            effective_at,
            provider_initiated: false,
            provider_status: None,
            period_start: None,
            period_end: None,
            ends_at: None,
            grace_period_ends_at: None,
            cancellation_reason: None,
            cancellation_feedback: None,
        }
    }
}

/// Declarative side effect produced by a transition.
///
/// The engine only states intent; scheduling and notification execution
/// belong to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "intent")]
pub enum SideEffectIntent {
    /// The trial window closed with a successful conversion.
    TrialEnded,

    /// A previously failing subscription is paying again.
    PaymentRecoveryNotice,

    /// A payment failed; dunning communication should start.
    PaymentFailureNotice,

    /// The subscription was cancelled; send the cancellation notice.
    CancellationNotice,

    /// Check back at the deadline whether the grace period lapsed.
    ScheduleGraceExpiryCheck { check_at: Timestamp },

    /// Access has been revoked for good.
    AccessRevoked,
}

/// Why a requested transition was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The target is not reachable from the current state.
    UnreachableTarget {
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    },

    /// Cancelled requires a cancellation reason or a provider-initiated flag.
    MissingCancellationContext,

    /// GracePeriod requires a grace deadline.
    MissingGraceDeadline,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::UnreachableTarget { from, to } => {
                write!(f, "transition {} -> {} is not legal", from, to)
            }
            RejectReason::MissingCancellationContext => {
                write!(f, "cancellation requires a reason or provider initiation")
            }
            RejectReason::MissingGraceDeadline => {
                write!(f, "grace period requires a deadline")
            }
        }
    }
}

/// Outcome of evaluating a transition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Legal lifecycle change; apply the new status and execute the intents.
    Applied {
        side_effects: Vec<SideEffectIntent>,
    },

    /// Identity transition: refresh diagnostic fields, no lifecycle
    /// side effects.
    Refreshed,

    /// Not applied. Callers treat this as a no-op.
    Rejected(RejectReason),
}

/// Evaluates a requested transition.
///
/// Pure over (current, target, context): the same inputs always produce the
/// same decision, which keeps every lifecycle rule testable without I/O.
pub fn decide(
    current: SubscriptionStatus,
    target: SubscriptionStatus,
    ctx: &TransitionContext,
) -> Decision {
    use SubscriptionStatus::*;

    if current == target {
        return Decision::Refreshed;
    }

    if !current.can_transition_to(&target) {
        return Decision::Rejected(RejectReason::UnreachableTarget {
            from: current,
            to: target,
        });
    }

    match target {
        Cancelled if ctx.cancellation_reason.is_none() && !ctx.provider_initiated => {
            return Decision::Rejected(RejectReason::MissingCancellationContext);
        }
        GracePeriod if ctx.grace_period_ends_at.is_none() => {
            return Decision::Rejected(RejectReason::MissingGraceDeadline);
        }
        _ => {}
    }

    let mut side_effects = Vec::new();
    match (current, target) {
        (Trial, Active) => side_effects.push(SideEffectIntent::TrialEnded),
        (PastDue, Active) | (GracePeriod, Active) => {
            side_effects.push(SideEffectIntent::PaymentRecoveryNotice)
        }
        (_, PastDue) => side_effects.push(SideEffectIntent::PaymentFailureNotice),
        (_, Cancelled) => side_effects.push(SideEffectIntent::CancellationNotice),
        (_, GracePeriod) => side_effects.push(SideEffectIntent::ScheduleGraceExpiryCheck {
            // Precondition above guarantees the deadline is present.
            check_at: ctx
                .grace_period_ends_at
                .unwrap_or(ctx.effective_at),
        }),
        (_, Expired) => side_effects.push(SideEffectIntent::AccessRevoked),
        _ => {}
    }

    Decision::Applied { side_effects }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    fn ctx() -> TransitionContext {
        TransitionContext::at(ts(1_700_000_000))
    }

    #[test]
    fn trial_to_active_emits_trial_ended() {
        let decision = decide(
            SubscriptionStatus::Trial,
            SubscriptionStatus::Active,
            &ctx(),
        );
        assert_eq!(
            decision,
            Decision::Applied {
                side_effects: vec![SideEffectIntent::TrialEnded]
            }
        );
    }

    #[test]
    fn active_to_past_due_emits_payment_failure_notice() {
        let decision = decide(
            SubscriptionStatus::Active,
            SubscriptionStatus::PastDue,
            &ctx(),
        );
        assert_eq!(
            decision,
            Decision::Applied {
                side_effects: vec![SideEffectIntent::PaymentFailureNotice]
            }
        );
    }

    #[test]
    fn past_due_recovery_emits_recovery_notice() {
        let decision = decide(
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Active,
            &ctx(),
        );
        assert_eq!(
            decision,
            Decision::Applied {
                side_effects: vec![SideEffectIntent::PaymentRecoveryNotice]
            }
        );
    }

    #[test]
    fn grace_period_requires_deadline() {
        let decision = decide(
            SubscriptionStatus::PastDue,
            SubscriptionStatus::GracePeriod,
            &ctx(),
        );
        assert_eq!(
            decision,
            Decision::Rejected(RejectReason::MissingGraceDeadline)
        );
    }

    #[test]
    fn grace_period_schedules_expiry_check_at_deadline() {
        let deadline = ts(1_700_500_000);
        let mut context = ctx();
        context.grace_period_ends_at = Some(deadline);

        let decision = decide(
            SubscriptionStatus::PastDue,
            SubscriptionStatus::GracePeriod,
            &context,
        );
        assert_eq!(
            decision,
            Decision::Applied {
                side_effects: vec![SideEffectIntent::ScheduleGraceExpiryCheck {
                    check_at: deadline
                }]
            }
        );
    }

    #[test]
    fn cancellation_requires_reason_or_provider_initiation() {
        let decision = decide(
            SubscriptionStatus::Active,
            SubscriptionStatus::Cancelled,
            &ctx(),
        );
        assert_eq!(
            decision,
            Decision::Rejected(RejectReason::MissingCancellationContext)
        );
    }

    #[test]
    fn cancellation_with_reason_emits_notice() {
        let mut context = ctx();
        context.cancellation_reason = Some(CancellationReason::CustomerRequest);

        let decision = decide(
            SubscriptionStatus::Active,
            SubscriptionStatus::Cancelled,
            &context,
        );
        assert_eq!(
            decision,
            Decision::Applied {
                side_effects: vec![SideEffectIntent::CancellationNotice]
            }
        );
    }

    #[test]
    fn provider_initiated_cancellation_needs_no_reason() {
        let mut context = ctx();
        context.provider_initiated = true;

        let decision = decide(
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Cancelled,
            &context,
        );
        assert!(matches!(decision, Decision::Applied { .. }));
    }

    #[test]
    fn expiry_revokes_access() {
        let decision = decide(
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Expired,
            &ctx(),
        );
        assert_eq!(
            decision,
            Decision::Applied {
                side_effects: vec![SideEffectIntent::AccessRevoked]
            }
        );
    }

    #[test]
    fn self_transition_is_refresh_without_side_effects() {
        for status in [
            SubscriptionStatus::Trial,
            SubscriptionStatus::Active,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Paused,
            SubscriptionStatus::GracePeriod,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Expired,
        ] {
            assert_eq!(decide(status, status, &ctx()), Decision::Refreshed);
        }
    }

    #[test]
    fn unreachable_target_is_rejected_not_panicked() {
        let decision = decide(
            SubscriptionStatus::Expired,
            SubscriptionStatus::Active,
            &ctx(),
        );
        assert_eq!(
            decision,
            Decision::Rejected(RejectReason::UnreachableTarget {
                from: SubscriptionStatus::Expired,
                to: SubscriptionStatus::Active,
            })
        );
    }

    #[test]
    fn pause_and_resume_have_no_notification_side_effects() {
        let decision = decide(
            SubscriptionStatus::Active,
            SubscriptionStatus::Paused,
            &ctx(),
        );
        assert_eq!(
            decision,
            Decision::Applied {
                side_effects: vec![]
            }
        );

        let decision = decide(
            SubscriptionStatus::Paused,
            SubscriptionStatus::Active,
            &ctx(),
        );
        assert_eq!(
            decision,
            Decision::Applied {
                side_effects: vec![]
            }
        );
    }

    mod properties {
        use super::*;
        use crate::domain::foundation::StateMachine;
        use proptest::prelude::*;

        const ALL: [SubscriptionStatus; 7] = [
            SubscriptionStatus::Trial,
            SubscriptionStatus::Active,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Paused,
            SubscriptionStatus::GracePeriod,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Expired,
        ];

        fn any_status() -> impl Strategy<Value = SubscriptionStatus> {
            prop::sample::select(ALL.to_vec())
        }

        proptest! {
            /// Every pair outside the legality table is rejected, and every
            /// rejection for a distinct pair names an unreachable target or
            /// a missing precondition.
            #[test]
            fn pairs_outside_the_table_are_always_rejected(
                current in any_status(),
                target in any_status(),
            ) {
                let context = TransitionContext {
                    provider_initiated: true,
                    grace_period_ends_at: Some(Timestamp::from_unix_secs(2_000_000_000).unwrap()),
                    ..TransitionContext::at(Timestamp::from_unix_secs(1_700_000_000).unwrap())
                };
                let decision = decide(current, target, &context);

                if current == target {
                    prop_assert_eq!(decision, Decision::Refreshed);
                } else if current.can_transition_to(&target) {
                    let is_applied = matches!(decision, Decision::Applied { .. });
                    prop_assert!(is_applied);
                } else {
                    prop_assert_eq!(
                        decision,
                        Decision::Rejected(RejectReason::UnreachableTarget {
                            from: current,
                            to: target,
                        })
                    );
                }
            }
        }
    }
}
