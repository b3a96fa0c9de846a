//! Bootstrap path against an in-memory SQLite database

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use petstore_core::{DataInitializer, INIT_ACTION, InitOutcome};
use petstore_persistence::{
    ExternalDbLockStore, LockPersistence, LockRow, sea_orm::DatabaseConnection, setup_lock_table,
};
use petstore_server::{Configuration, seed};

async fn bootstrap() -> (tempfile::NamedTempFile, DatabaseConnection) {
    let mut file = tempfile::Builder::new()
        .suffix(".yml")
        .tempfile()
        .unwrap();
    // One connection, otherwise each pooled connection sees its own database
    writeln!(
        file,
        "db:\n  url: \"sqlite::memory:\"\n  max_open_conns: 1\n  max_idle_conns: 1\nlease:\n  init_seconds: 30\n"
    )
    .unwrap();
    let path = file.path().to_string_lossy().to_string();

    let configuration =
        Configuration::try_parse_from(["petstore-server", "--config", path.as_str()]).unwrap();
    assert!(configuration.db_auto_migrate());
    assert_eq!(configuration.init_lease(), Duration::from_secs(30));

    let db = configuration.database_connection().await.unwrap();
    setup_lock_table(&db).await.unwrap();
    (file, db)
}

#[tokio::test]
async fn test_first_boot_seeds_and_frees_init_lock() {
    let (_file, db) = bootstrap().await;
    let store = Arc::new(ExternalDbLockStore::new(db.clone()));

    let outcome = DataInitializer::new(store.clone(), "node-a", Duration::from_secs(30))
        .run(|| seed::seed_initial_data(&db))
        .await
        .unwrap();

    assert_eq!(outcome, InitOutcome::Seeded);
    assert!(store.lock_find(INIT_ACTION).await.unwrap().is_none());
}

#[tokio::test]
async fn test_boot_skips_seed_while_another_node_holds_init_lock() {
    let (_file, db) = bootstrap().await;
    let store = Arc::new(ExternalDbLockStore::new(db.clone()));

    let now = Utc::now();
    store
        .lock_insert(&LockRow::new(
            INIT_ACTION,
            "node-b",
            now,
            now + chrono::Duration::seconds(30),
        ))
        .await
        .unwrap();

    let outcome = DataInitializer::new(store.clone(), "node-a", Duration::from_secs(30))
        .run(|| seed::seed_initial_data(&db))
        .await
        .unwrap();

    assert_eq!(outcome, InitOutcome::Skipped);
    let row = store.lock_find(INIT_ACTION).await.unwrap().unwrap();
    assert_eq!(row.holder, "node-b");
}

#[tokio::test]
async fn test_boot_reclaims_init_lock_of_crashed_node() {
    let (_file, db) = bootstrap().await;
    let store = Arc::new(ExternalDbLockStore::new(db.clone()));

    let long_ago = Utc::now() - chrono::Duration::minutes(10);
    store
        .lock_insert(&LockRow::new(
            INIT_ACTION,
            "node-b",
            long_ago,
            long_ago + chrono::Duration::seconds(30),
        ))
        .await
        .unwrap();

    let outcome = DataInitializer::new(store.clone(), "node-a", Duration::from_secs(30))
        .run(|| seed::seed_initial_data(&db))
        .await
        .unwrap();

    assert_eq!(outcome, InitOutcome::Seeded);
    assert!(store.lock_find(INIT_ACTION).await.unwrap().is_none());
}
