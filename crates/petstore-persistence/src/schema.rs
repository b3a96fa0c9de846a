//! Table setup for the lock entity
//!
//! Creates `tb_locks` and its unique index from the entity definition when
//! auto-migrate is enabled. Existing tables are left untouched.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};
use tracing::info;

use crate::entity::lock;

/// Create the lock table if it does not exist yet
pub async fn setup_lock_table(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut stmt = schema.create_table_from_entity(lock::Entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;

    info!("Lock table ready");
    Ok(())
}
