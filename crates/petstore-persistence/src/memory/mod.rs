//! In-memory lock store
//!
//! Keeps rows in a map keyed by action, so the unique index on `action`
//! behaves like the SQL backend: an insert fails while *any* row exists for
//! the action, expired or not. Reclaiming an expired row is the caller's job.
//!
//! Failure injection switches let tests exercise storage outages.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::model::{LockFilter, LockRow};
use crate::traits::LockPersistence;

/// In-process lock store
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    rows: Mutex<HashMap<String, LockRow>>,
    fail_inserts: AtomicBool,
    fail_deletes: AtomicBool,
    fail_updates: AtomicBool,
    update_calls: AtomicU64,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every insert fail with a storage error
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make every delete fail with a storage error
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make every expiry update fail with a storage error
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Number of expiry updates attempted, failed ones included
    pub fn update_calls(&self) -> u64 {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Number of rows currently stored
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    /// Put a row in place without any checks
    pub fn seed(&self, row: LockRow) {
        self.rows.lock().insert(row.action.clone(), row);
    }
}

fn injected(op: &str) -> StoreError {
    StoreError::Storage(format!("injected {} failure", op))
}

#[async_trait]
impl LockPersistence for MemoryLockStore {
    async fn lock_insert(&self, row: &LockRow) -> StoreResult<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(injected("insert"));
        }

        let mut rows = self.rows.lock();
        if rows.contains_key(&row.action) {
            return Err(StoreError::UniqueViolation {
                action: row.action.clone(),
            });
        }
        rows.insert(row.action.clone(), row.clone());
        Ok(())
    }

    async fn lock_delete_where(&self, filter: &LockFilter) -> StoreResult<u64> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(injected("delete"));
        }

        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|_, row| !filter.matches(row));
        Ok((before - rows.len()) as u64)
    }

    async fn lock_update_expiry(
        &self,
        action: &str,
        holder: &str,
        expired_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<u64> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(injected("update"));
        }

        let mut rows = self.rows.lock();
        match rows.get_mut(action) {
            Some(row) if row.holder == holder => {
                row.expired_at = expired_at;
                row.updated_at = updated_at;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn lock_find(&self, action: &str) -> StoreResult<Option<LockRow>> {
        Ok(self.rows.lock().get(action).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_insert_enforces_unique_action() {
        let store = MemoryLockStore::new();
        store
            .lock_insert(&LockRow::new("init", "a", at(0), at(10)))
            .await
            .unwrap();

        let err = store
            .lock_insert(&LockRow::new("init", "b", at(0), at(10)))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        // Other actions are independent
        store
            .lock_insert(&LockRow::new("migrate", "b", at(0), at(10)))
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_expired_row_still_blocks_insert() {
        let store = MemoryLockStore::new();
        store.seed(LockRow::new("init", "a", at(0), at(1)));

        let err = store
            .lock_insert(&LockRow::new("init", "b", at(5), at(15)))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_delete_where_matches_filter() {
        let store = MemoryLockStore::new();
        store.seed(LockRow::new("init", "a", at(0), at(1)));
        store.seed(LockRow::new("migrate", "a", at(0), at(100)));

        let removed = store
            .lock_delete_where(&LockFilter::action("init").with_holder("b"))
            .await
            .unwrap();
        assert_eq!(removed, 0);

        let removed = store
            .lock_delete_where(&LockFilter::default().expired_before(at(5)))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.lock_find("init").await.unwrap().is_none());
        assert!(store.lock_find("migrate").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_expiry_requires_matching_holder() {
        let store = MemoryLockStore::new();
        store.seed(LockRow::new("init", "a", at(0), at(10)));

        let updated = store
            .lock_update_expiry("init", "b", at(20), at(5))
            .await
            .unwrap();
        assert_eq!(updated, 0);

        let updated = store
            .lock_update_expiry("init", "a", at(20), at(5))
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let row = store.lock_find("init").await.unwrap().unwrap();
        assert_eq!(row.expired_at, at(20));
        assert_eq!(row.updated_at, at(5));
        assert_eq!(store.update_calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryLockStore::new();
        store.set_fail_inserts(true);
        let err = store
            .lock_insert(&LockRow::new("init", "a", at(0), at(10)))
            .await
            .unwrap_err();
        assert!(!err.is_unique_violation());

        store.set_fail_inserts(false);
        store.set_fail_updates(true);
        store
            .lock_insert(&LockRow::new("init", "a", at(0), at(10)))
            .await
            .unwrap();
        assert!(store.lock_update_expiry("init", "a", at(20), at(5)).await.is_err());

        store.set_fail_deletes(true);
        assert!(store
            .lock_delete_where(&LockFilter::action("init"))
            .await
            .is_err());
        assert_eq!(store.len(), 1);
    }
}
