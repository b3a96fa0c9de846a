//! Domain model types for the persistence abstraction layer
//!
//! These types are used as arguments and return values of the persistence
//! traits, decoupled from specific storage backends.

use chrono::{DateTime, Utc};

use petstore_common::new_ulid;

use crate::entity::lock;

/// A persisted lock row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRow {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
    pub action: String,
    pub holder: String,
}

impl LockRow {
    /// Build a fresh row with a new ULID id, created and updated at `now`
    pub fn new(
        action: impl Into<String>,
        holder: impl Into<String>,
        now: DateTime<Utc>,
        expired_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_ulid(),
            created_at: now,
            updated_at: now,
            expired_at,
            action: action.into(),
            holder: holder.into(),
        }
    }

    /// A row whose expiry has passed no longer confers exclusivity
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expired_at < now
    }
}

impl From<lock::Model> for LockRow {
    fn from(model: lock::Model) -> Self {
        Self {
            id: model.id,
            created_at: model.created_at,
            updated_at: model.updated_at,
            expired_at: model.expired_at,
            action: model.action,
            holder: model.holder,
        }
    }
}

/// Row predicate for conditional deletes
///
/// Every field that is set must match. An empty filter matches all rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockFilter {
    pub action: Option<String>,
    pub holder: Option<String>,
    /// Matches rows with `expired_at` strictly before this instant
    pub expired_before: Option<DateTime<Utc>>,
}

impl LockFilter {
    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Default::default()
        }
    }

    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = Some(holder.into());
        self
    }

    pub fn expired_before(mut self, at: DateTime<Utc>) -> Self {
        self.expired_before = Some(at);
        self
    }

    pub fn matches(&self, row: &LockRow) -> bool {
        self.action.as_ref().is_none_or(|a| *a == row.action)
            && self.holder.as_ref().is_none_or(|h| *h == row.holder)
            && self.expired_before.is_none_or(|at| row.expired_at < at)
    }
}
