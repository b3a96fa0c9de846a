//! Lock table persistence trait
//!
//! Defines the storage contract for lease-based locks. The store enforces
//! uniqueness of `action` and nothing else: it performs no retries and takes
//! no locks of its own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::model::{LockFilter, LockRow};

/// Lock table operations
#[async_trait]
pub trait LockPersistence: Send + Sync {
    /// Insert a new lock row
    ///
    /// Fails with [`StoreError::UniqueViolation`](crate::StoreError::UniqueViolation)
    /// when any row already exists for the same action.
    async fn lock_insert(&self, row: &LockRow) -> StoreResult<()>;

    /// Delete every row matching the filter, returning the number removed
    async fn lock_delete_where(&self, filter: &LockFilter) -> StoreResult<u64>;

    /// Move the expiry of the row owned by `holder` for `action`
    ///
    /// Returns the number of rows updated. Zero means the row is gone, which
    /// is not a storage error.
    async fn lock_update_expiry(
        &self,
        action: &str,
        holder: &str,
        expired_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<u64>;

    /// Find the row for an action, if any
    async fn lock_find(&self, action: &str) -> StoreResult<Option<LockRow>>;
}
