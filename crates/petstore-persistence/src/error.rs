//! Store error taxonomy
//!
//! Insert conflicts on the unique `action` index are reported separately from
//! every other storage failure so callers can treat contention as an outcome.

use sea_orm::DbErr;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("lock row for action '{action}' already exists")]
    UniqueViolation { action: String },

    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        StoreError::Storage(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
