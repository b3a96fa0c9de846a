//! Pet Store Persistence - Lock table entity and persistence layer
//!
//! This crate provides:
//! - SeaORM entity definition for the lock table
//! - The [`LockPersistence`] storage contract
//! - An external database backend and an in-memory backend
//! - Table setup for auto-migrate

pub mod entity;
pub mod error;
pub mod memory;
pub mod model;
pub mod schema;
pub mod sql;
pub mod traits;

// Re-export sea-orm for convenience
pub use sea_orm;

pub use entity::prelude::*;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryLockStore;
pub use model::{LockFilter, LockRow};
pub use schema::setup_lock_table;
pub use sql::ExternalDbLockStore;
pub use traits::LockPersistence;
