//! Initial data seeding
//!
//! Runs under the `"init"` lease lock, so at most one node of a fleet executes
//! it at a time.

use anyhow::Context;
use sea_orm::DatabaseConnection;
use tracing::info;

pub async fn seed_initial_data(db: &DatabaseConnection) -> anyhow::Result<()> {
    info!("begin init data");
    db.ping()
        .await
        .context("database unreachable while seeding initial data")?;
    info!("init data done");
    Ok(())
}
