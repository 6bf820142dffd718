//! In-memory subscription store.
//!
//! Implements the full optimistic-concurrency contract, so it doubles as the
//! deterministic store for tests and as an embedded store for single-process
//! deployments. Version check and write happen under one lock, which gives
//! the same atomicity a database compare-and-set would.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::{
    DomainError, ErrorCode, ExternalSubscriptionId, SubscriptionId,
};
use crate::domain::subscription::Subscription;
use crate::ports::{SaveOutcome, SubscriptionStore};

/// In-memory subscription store keyed by external id.
pub struct InMemorySubscriptionStore {
    records: RwLock<HashMap<String, Subscription>>,
}

impl InMemorySubscriptionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored subscriptions (for test assertions).
    pub fn len(&self) -> usize {
        self.records
            .read()
            .expect("InMemorySubscriptionStore: lock poisoned")
            .len()
    }

    /// Returns true when no subscriptions are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut records = self
            .records
            .write()
            .expect("InMemorySubscriptionStore: lock poisoned");

        let key = subscription.external_id.as_str().to_string();
        if records.contains_key(&key) {
            return Err(DomainError::new(
                ErrorCode::DuplicateExternalId,
                format!("Subscription with external id {} already exists", key),
            ));
        }

        records.insert(key, subscription.clone());
        Ok(())
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalSubscriptionId,
    ) -> Result<Option<Subscription>, DomainError> {
        let records = self
            .records
            .read()
            .expect("InMemorySubscriptionStore: lock poisoned");
        Ok(records.get(external_id.as_str()).cloned())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        let records = self
            .records
            .read()
            .expect("InMemorySubscriptionStore: lock poisoned");
        Ok(records.values().find(|s| &s.id == id).cloned())
    }

    async fn save(
        &self,
        subscription: &Subscription,
        expected_version: u64,
    ) -> Result<SaveOutcome, DomainError> {
        let mut records = self
            .records
            .write()
            .expect("InMemorySubscriptionStore: lock poisoned");

        let key = subscription.external_id.as_str().to_string();
        let current = records.get(&key).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("No subscription with external id {}", key),
            )
        })?;

        if current.version != expected_version {
            return Ok(SaveOutcome::Conflict);
        }

        let mut updated = subscription.clone();
        updated.version = expected_version + 1;
        records.insert(key, updated);
        Ok(SaveOutcome::Saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{TenantId, Timestamp};

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    fn subscription(external_id: &str) -> Subscription {
        Subscription::start_active(
            SubscriptionId::new(),
            TenantId::new("tenant-1").unwrap(),
            ExternalSubscriptionId::new(external_id).unwrap(),
            1,
            ts(1_700_000_000),
            ts(1_702_600_000),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_and_find_by_external_id() {
        let store = InMemorySubscriptionStore::new();
        let sub = subscription("sub_1");

        store.insert(&sub).await.unwrap();

        let found = store
            .find_by_external_id(&sub.external_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, sub.id);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_external_id() {
        let store = InMemorySubscriptionStore::new();
        store.insert(&subscription("sub_1")).await.unwrap();

        let err = store.insert(&subscription("sub_1")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateExternalId);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn find_by_id_locates_record() {
        let store = InMemorySubscriptionStore::new();
        let sub = subscription("sub_1");
        store.insert(&sub).await.unwrap();

        let found = store.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(found.external_id, sub.external_id);
    }

    #[tokio::test]
    async fn find_returns_none_for_unknown_subscription() {
        let store = InMemorySubscriptionStore::new();
        let unknown = ExternalSubscriptionId::new("sub_ghost").unwrap();
        assert!(store.find_by_external_id(&unknown).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_increments_version_on_match() {
        let store = InMemorySubscriptionStore::new();
        let sub = subscription("sub_1");
        store.insert(&sub).await.unwrap();

        let outcome = store.save(&sub, 0).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);

        let stored = store
            .find_by_external_id(&sub.external_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn save_conflicts_on_version_mismatch() {
        let store = InMemorySubscriptionStore::new();
        let sub = subscription("sub_1");
        store.insert(&sub).await.unwrap();

        // First writer commits, bumping the stored version to 1.
        store.save(&sub, 0).await.unwrap();

        // Second writer still holds version 0.
        let outcome = store.save(&sub, 0).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Conflict);

        let stored = store
            .find_by_external_id(&sub.external_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn save_fails_for_missing_record() {
        let store = InMemorySubscriptionStore::new();
        let err = store.save(&subscription("sub_1"), 0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
    }
}
