//! SQL-based persistence backend (MySQL/PostgreSQL via SeaORM)
//!
//! Implements the lock table contract on a SeaORM `DatabaseConnection`.
//! Unique index conflicts are recognized through `DbErr::sql_err()` so the
//! classification works the same for every supported driver.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{prelude::Expr, *};
use tracing::debug;

use crate::entity::lock;
use crate::error::{StoreError, StoreResult};
use crate::model::{LockFilter, LockRow};
use crate::traits::LockPersistence;

/// External database lock store
///
/// Wraps a SeaORM `DatabaseConnection` and implements [`LockPersistence`]
/// with direct entity queries.
#[derive(Clone)]
pub struct ExternalDbLockStore {
    db: DatabaseConnection,
}

impl ExternalDbLockStore {
    /// Create a new ExternalDbLockStore with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Map an insert failure onto the store error taxonomy
fn classify_insert_error(err: DbErr, action: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::UniqueViolation {
            action: action.to_string(),
        },
        _ => StoreError::Storage(err.to_string()),
    }
}

/// Translate a [`LockFilter`] into a SeaORM condition
fn filter_condition(filter: &LockFilter) -> Condition {
    Condition::all()
        .add_option(
            filter
                .action
                .as_ref()
                .map(|action| lock::Column::Action.eq(action.as_str())),
        )
        .add_option(
            filter
                .holder
                .as_ref()
                .map(|holder| lock::Column::Holder.eq(holder.as_str())),
        )
        .add_option(
            filter
                .expired_before
                .map(|at| lock::Column::ExpiredAt.lt(at)),
        )
}

#[async_trait]
impl LockPersistence for ExternalDbLockStore {
    async fn lock_insert(&self, row: &LockRow) -> StoreResult<()> {
        let model = lock::ActiveModel {
            id: Set(row.id.clone()),
            created_at: Set(row.created_at),
            updated_at: Set(row.updated_at),
            expired_at: Set(row.expired_at),
            action: Set(row.action.clone()),
            holder: Set(row.holder.clone()),
        };

        lock::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| classify_insert_error(e, &row.action))?;

        debug!(action = %row.action, holder = %row.holder, "Lock row inserted");
        Ok(())
    }

    async fn lock_delete_where(&self, filter: &LockFilter) -> StoreResult<u64> {
        let result = lock::Entity::delete_many()
            .filter(filter_condition(filter))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    async fn lock_update_expiry(
        &self,
        action: &str,
        holder: &str,
        expired_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let result = lock::Entity::update_many()
            .col_expr(lock::Column::ExpiredAt, Expr::value(expired_at))
            .col_expr(lock::Column::UpdatedAt, Expr::value(updated_at))
            .filter(lock::Column::Action.eq(action))
            .filter(lock::Column::Holder.eq(holder))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    async fn lock_find(&self, action: &str) -> StoreResult<Option<LockRow>> {
        let model = lock::Entity::find()
            .filter(lock::Column::Action.eq(action))
            .one(&self.db)
            .await?;

        Ok(model.map(LockRow::from))
    }
}
