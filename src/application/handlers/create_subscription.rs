//! CreateSubscriptionHandler - Command handler for new purchases.
//!
//! Subscription records are created by internal purchase flows, never by
//! webhooks; later provider events reconcile against the record created here.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::config::BillingConfig;
use crate::domain::foundation::{
    DomainError, ErrorCode, ExternalSubscriptionId, SubscriptionId, TenantId, Timestamp,
};
use crate::domain::subscription::{Subscription, SubscriptionEvent};
use crate::ports::{EventPublisher, SubscriptionStore};

/// Command to create a subscription for a completed purchase.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub tenant_id: TenantId,
    /// Provider subscription id from checkout.
    pub external_id: ExternalSubscriptionId,
    /// Seat/unit count; at least 1.
    pub quantity: u32,
    /// Start in a trial window instead of immediately active.
    pub with_trial: bool,
    /// Provenance annotations (e.g. "created_via").
    pub metadata: HashMap<String, String>,
}

/// Handler creating subscription records.
pub struct CreateSubscriptionHandler {
    store: Arc<dyn SubscriptionStore>,
    publisher: Arc<dyn EventPublisher>,
    billing: BillingConfig,
}

impl CreateSubscriptionHandler {
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

    /// Create and persist the record, then announce it.
    ///
    /// # Errors
    ///
    /// - `DuplicateExternalId` if the provider id is already registered
    /// - `ValidationFailed` for a zero quantity
    /// - `StoreError` on persistence failure
    pub async fn handle(
        &self,
        cmd: CreateSubscriptionCommand,
    ) -> Result<Subscription, DomainError> {
        if self
            .store
            .find_by_external_id(&cmd.external_id)
            .await?
            .is_some()
        {
            return Err(DomainError::new(
                ErrorCode::DuplicateExternalId,
                format!(
                    "Subscription with external id {} already exists",
                    cmd.external_id
                ),
            ));
        }

        let now = Timestamp::now();
        let mut subscription = if cmd.with_trial {
            Subscription::start_trial(
                SubscriptionId::new(),
                cmd.tenant_id,
                cmd.external_id,
                cmd.quantity,
                now,
                now.add_days(self.billing.trial_days as i64),
            )?
        } else {
            Subscription::start_active(
                SubscriptionId::new(),
                cmd.tenant_id,
                cmd.external_id,
                cmd.quantity,
                now,
                now.add_days(self.billing.default_period_days as i64),
            )?
        };
        subscription.metadata = cmd.metadata;

        self.store.insert(&subscription).await?;

        let event = SubscriptionEvent::Created {
            subscription_id: subscription.id,
            tenant_id: subscription.tenant_id.clone(),
            external_id: subscription.external_id.to_string(),
            status: subscription.status,
            occurred_at: now,
        };
        if let Err(err) = self.publisher.publish(event.to_envelope()).await {
            warn!(
                subscription_id = %subscription.id,
                error = %err,
                "event dispatch failed, subscription already persisted"
            );
        }

        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryEventBus, InMemorySubscriptionStore};
    use crate::domain::subscription::SubscriptionStatus;

    fn command(with_trial: bool) -> CreateSubscriptionCommand {
        CreateSubscriptionCommand {
            tenant_id: TenantId::new("tenant-1").unwrap(),
            external_id: ExternalSubscriptionId::new("sub_123").unwrap(),
            quantity: 2,
            with_trial,
            metadata: HashMap::from([("created_via".to_string(), "checkout".to_string())]),
        }
    }

    fn handler() -> (
        CreateSubscriptionHandler,
        Arc<InMemorySubscriptionStore>,
        Arc<InMemoryEventBus>,
    ) {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let handler =
            CreateSubscriptionHandler::new(store.clone(), bus.clone(), BillingConfig::default());
        (handler, store, bus)
    }

    #[tokio::test]
    async fn trial_purchase_starts_in_trial() {
        let (handler, store, bus) = handler();

        let subscription = handler.handle(command(true)).await.unwrap();

        assert_eq!(subscription.status, SubscriptionStatus::Trial);
        assert!(subscription.trial_ends_at.is_some());
        assert_eq!(subscription.quantity, 2);
        assert_eq!(
            subscription.metadata.get("created_via").unwrap(),
            "checkout"
        );
        assert_eq!(store.len(), 1);
        assert!(bus.has_event("subscription.created"));
    }

    #[tokio::test]
    async fn direct_purchase_starts_active() {
        let (handler, _store, _bus) = handler();

        let subscription = handler.handle(command(false)).await.unwrap();

        assert_eq!(subscription.status, SubscriptionStatus::Active);
        assert!(subscription.trial_ends_at.is_none());
    }

    #[tokio::test]
    async fn duplicate_external_id_is_rejected() {
        let (handler, store, _bus) = handler();
        handler.handle(command(false)).await.unwrap();

        let err = handler.handle(command(true)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::DuplicateExternalId);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let (handler, store, _bus) = handler();
        let mut cmd = command(false);
        cmd.quantity = 0;

        assert!(handler.handle(cmd).await.is_err());
        assert!(store.is_empty());
    }
}
