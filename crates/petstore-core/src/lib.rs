//! Pet Store Core - Coordination primitives on top of the persistence layer
//!
//! This crate provides:
//! - [`LeaseLock`]: a lease-based mutual-exclusion lock backed by the lock table
//! - [`DataInitializer`]: one-time data seeding guarded by that lock

pub mod init;
pub mod lease;

pub use init::{DataInitializer, INIT_ACTION, InitError, InitOutcome};
pub use lease::{
    AcquireResult, DEFAULT_LEASE, LEASE_ACQUIRE_TOTAL, LEASE_RELEASE_TOTAL, LEASE_RENEW_TOTAL,
    LeaseError, LeaseLock, LeaseObserver, LockState, RenewalError, TracingObserver,
};
