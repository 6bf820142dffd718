//! Subscription store port.
//!
//! Defines the persistence contract for Subscription records. Persistence
//! mechanics are an adapter concern; the core only relies on atomic,
//! version-checked writes.
//!
//! # Concurrency
//!
//! Webhook deliveries for the same subscription may race. `save` is a
//! compare-and-set on `version`: the record is written (and the stored
//! version incremented) only when the stored version still equals
//! `expected_version`. The loser observes `Conflict`, re-reads, and decides
//! whether to retry. No lock is held between read and write.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ExternalSubscriptionId, SubscriptionId};
use crate::domain::subscription::Subscription;

/// Result of a version-checked write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The write committed; the stored version is now `expected_version + 1`.
    Saved,

    /// Another writer committed first; nothing was written.
    Conflict,
}

/// Repository port for Subscription persistence.
///
/// Implementations must ensure:
/// - Unique `external_id` across all records
/// - `save` commits the whole record atomically (state plus diagnostics)
/// - Version checks and increments are atomic with the write
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert a new subscription.
    ///
    /// # Errors
    ///
    /// - `DuplicateExternalId` if a record with the same external id exists
    /// - `StoreError` on persistence failure
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Find a subscription by the provider's id.
    ///
    /// Returns `None` if not found. This is the primary lookup: every
    /// webhook is correlated through the external id.
    async fn find_by_external_id(
        &self,
        external_id: &ExternalSubscriptionId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Find a subscription by its internal id.
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// Write the record if the stored version still equals `expected_version`.
    ///
    /// On `Saved` the stored record carries `expected_version + 1`; the
    /// caller's in-memory copy is stale either way and must be re-read
    /// before another write.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the record does not exist
    /// - `StoreError` on persistence failure
    async fn save(
        &self,
        subscription: &Subscription,
        expected_version: u64,
    ) -> Result<SaveOutcome, DomainError>;
}
