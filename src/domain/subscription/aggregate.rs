//! Subscription aggregate entity.
//!
//! The reconciled record: one per provider subscription, looked up by the
//! provider's id on every webhook.
//!
//! # Design Decisions
//!
//! - **Money in cents**: monetary amounts are i64 cents, never floats
//! - **Status changes go through the engine**: `apply_transition` is the
//!   only door; neither the reconciler nor command handlers write fields
//!   directly
//! - **Versioned writes**: `version` backs optimistic concurrency in the
//!   store; `last_event_at` fences out stale provider events

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ExternalSubscriptionId, SubscriptionId, TenantId, Timestamp, ValidationError,
};

use super::transition::{decide, CancellationReason, Decision, TransitionContext};
use super::SubscriptionStatus;

/// Subscription aggregate.
///
/// # Invariants
///
/// - `external_id` is immutable once set and unique across subscriptions
/// - `status` is always a defined lifecycle state
/// - `grace_period_ends_at` is set only while in GracePeriod
/// - `ends_at` non-null implies a terminal-bound trajectory
/// - period fields change only when a transition carries new values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Internal identifier, stable for the record's lifetime.
    pub id: SubscriptionId,

    /// Tenant that owns this subscription.
    pub tenant_id: TenantId,

    /// The billing provider's subscription id; webhook correlation key.
    pub external_id: ExternalSubscriptionId,

    /// Authoritative lifecycle state.
    pub status: SubscriptionStatus,

    /// Last raw status string seen from the provider. Diagnostic only.
    pub provider_status: Option<String>,

    /// Current billing period.
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,

    /// When the trial window closes (or closed).
    pub trial_ends_at: Option<Timestamp>,

    /// When access ends; set once cancellation is scheduled or effective.
    pub ends_at: Option<Timestamp>,

    /// When the subscription was paused.
    pub paused_at: Option<Timestamp>,

    /// Grace deadline while delinquent.
    pub grace_period_ends_at: Option<Timestamp>,

    /// Why and how the subscription was cancelled.
    pub cancellation_reason: Option<CancellationReason>,
    pub cancellation_feedback: Option<String>,

    /// Provenance and free-form annotations (e.g. "created_via").
    pub metadata: HashMap<String, String>,

    /// Seat/unit count; always at least 1.
    pub quantity: u32,

    /// Optimistic-concurrency marker, incremented by the store on every
    /// successful save.
    pub version: u64,

    /// Provider-reported time of the last applied event; events older than
    /// this are stale and must not regress state.
    pub last_event_at: Option<Timestamp>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Create a subscription that starts in a trial window.
    ///
    /// Purchases are internal actions, never webhooks; the provider learns
    /// about the record through checkout, and later webhooks reconcile
    /// against it.
    pub fn start_trial(
        id: SubscriptionId,
        tenant_id: TenantId,
        external_id: ExternalSubscriptionId,
        quantity: u32,
        now: Timestamp,
        trial_ends_at: Timestamp,
    ) -> Result<Self, DomainError> {
        Self::validate_quantity(quantity)?;
        Ok(Self {
            id,
            tenant_id,
            external_id,
            status: SubscriptionStatus::Trial,
            provider_status: None,
            current_period_start: now,
            current_period_end: trial_ends_at,
            trial_ends_at: Some(trial_ends_at),
            ends_at: None,
            paused_at: None,
            grace_period_ends_at: None,
            cancellation_reason: None,
            cancellation_feedback: None,
            metadata: HashMap::new(),
            quantity,
            version: 0,
            last_event_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a subscription that is active immediately (no trial).
    pub fn start_active(
        id: SubscriptionId,
        tenant_id: TenantId,
        external_id: ExternalSubscriptionId,
        quantity: u32,
        now: Timestamp,
        period_end: Timestamp,
    ) -> Result<Self, DomainError> {
        Self::validate_quantity(quantity)?;
        Ok(Self {
            id,
            tenant_id,
            external_id,
            status: SubscriptionStatus::Active,
            provider_status: None,
            current_period_start: now,
            current_period_end: period_end,
            trial_ends_at: None,
            ends_at: None,
            paused_at: None,
            grace_period_ends_at: None,
            cancellation_reason: None,
            cancellation_feedback: None,
            metadata: HashMap::new(),
            quantity,
            version: 0,
            last_event_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn validate_quantity(quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(ValidationError::below_minimum("quantity", 1, 0).into());
        }
        Ok(())
    }

    /// Check if this subscription currently grants product access.
    ///
    /// Cancelled subscriptions keep access until `ends_at`.
    pub fn has_access(&self, now: Timestamp) -> bool {
        if !self.status.grants_access() {
            return false;
        }
        if self.status == SubscriptionStatus::Cancelled {
            return match self.ends_at {
                Some(ends_at) => now <= ends_at,
                None => false,
            };
        }
        true
    }

    /// Run the transition engine and, when the decision allows, fold the
    /// result into the record.
    ///
    /// - `Applied`: status changes; the fields the target state owns are
    ///   set from the context and diagnostics refresh.
    /// - `Refreshed`: only diagnostics refresh (provider status, period
    ///   dates when carried, `last_event_at`, `updated_at`).
    /// - `Rejected`: the record is left untouched.
    ///
    /// The decision is returned so callers can log the reason or publish
    /// the implied side effects.
    pub fn apply_transition(
        &mut self,
        target: SubscriptionStatus,
        ctx: &TransitionContext,
    ) -> Decision {
        let decision = decide(self.status, target, ctx);

        match &decision {
            Decision::Applied { .. } => {
                let previous = self.status;
                self.status = target;
                self.apply_target_fields(previous, target, ctx);
                self.refresh_diagnostics(ctx);
            }
            Decision::Refreshed => {
                self.refresh_diagnostics(ctx);
            }
            Decision::Rejected(_) => {}
        }

        decision
    }

    fn apply_target_fields(
        &mut self,
        previous: SubscriptionStatus,
        target: SubscriptionStatus,
        ctx: &TransitionContext,
    ) {
        use SubscriptionStatus::*;

        // The grace deadline only survives inside the grace period.
        if target != GracePeriod {
            self.grace_period_ends_at = None;
        }

        match target {
            Active => {
                self.paused_at = None;
                if previous == Trial && self.trial_ends_at.is_none() {
                    self.trial_ends_at = Some(ctx.effective_at);
                }
            }
            Paused => {
                self.paused_at = Some(ctx.effective_at);
            }
            GracePeriod => {
                self.grace_period_ends_at = ctx.grace_period_ends_at;
            }
            Cancelled => {
                self.ends_at = Some(ctx.ends_at.unwrap_or(ctx.effective_at));
                self.cancellation_reason = ctx.cancellation_reason.or(if ctx.provider_initiated {
                    Some(CancellationReason::ProviderInitiated)
                } else {
                    None
                });
                if ctx.cancellation_feedback.is_some() {
                    self.cancellation_feedback = ctx.cancellation_feedback.clone();
                }
            }
            Expired => {
                if self.ends_at.is_none() {
                    self.ends_at = Some(ctx.effective_at);
                }
            }
            Trial | PastDue => {}
        }
    }

    fn refresh_diagnostics(&mut self, ctx: &TransitionContext) {
        if let Some(provider_status) = &ctx.provider_status {
            self.provider_status = Some(provider_status.clone());
        }
        if let Some(period_start) = ctx.period_start {
            self.current_period_start = period_start;
        }
        if let Some(period_end) = ctx.period_end {
            self.current_period_end = period_end;
        }
        self.last_event_at = Some(ctx.effective_at);
        self.updated_at = Timestamp::now();
    }
}
