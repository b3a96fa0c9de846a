//! Persistence traits
//!
//! Storage backends implement these traits; coordination logic lives above
//! them and never talks to a concrete database type.

pub mod lock;

pub use lock::LockPersistence;
