//! Main entry point for the pet store server.

use std::sync::Arc;

use petstore_common::node_identity;
use petstore_core::{DataInitializer, InitOutcome};
use petstore_persistence::{ExternalDbLockStore, setup_lock_table};
use petstore_server::{Configuration, seed, startup};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let configuration = Configuration::new()?;

    let logging_config = configuration.logging_config();
    let _logging_guard = startup::init_logging(&logging_config)?;

    petstore_server::metrics::init_metrics();

    let database_connection = configuration.database_connection().await?;

    if configuration.db_auto_migrate() {
        setup_lock_table(&database_connection).await?;
    }

    let holder = node_identity();
    let store = Arc::new(ExternalDbLockStore::new(database_connection.clone()));
    let initializer = DataInitializer::new(store, holder.as_str(), configuration.init_lease());

    match initializer
        .run(|| seed::seed_initial_data(&database_connection))
        .await?
    {
        InitOutcome::Seeded => info!(holder = %holder, "Initial data seeded by this node"),
        InitOutcome::Skipped => info!(holder = %holder, "Initial data seeded by another node"),
    }

    let signal = startup::wait_for_shutdown_signal().await?;
    info!(signal, "Shutting down");

    database_connection.close().await?;

    Ok(())
}
