//! Lease error types

use std::fmt;
use std::time::Duration;

use petstore_persistence::StoreError;

/// Lifecycle state of a [`LeaseLock`](super::LeaseLock)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Not held; acquisition may be attempted
    Idle,
    /// Row inserted and renewal loop running
    Held,
    /// Released by its holder (terminal)
    Released,
    /// The lock can never be acquired with this configuration (terminal)
    AcquireFailed,
}

impl LockState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockState::Idle => "idle",
            LockState::Held => "held",
            LockState::Released => "released",
            LockState::AcquireFailed => "acquire-failed",
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors surfaced synchronously by acquire and release
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LeaseError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid lease duration {0:?}")]
    InvalidLease(Duration),

    #[error("cannot {op} a lock in state {state}")]
    InvalidState { op: &'static str, state: LockState },
}

impl From<StoreError> for LeaseError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Storage(msg) => LeaseError::Storage(msg),
            // Only reachable when a caller maps an insert conflict itself
            other => LeaseError::Storage(other.to_string()),
        }
    }
}

/// Failure of a single background renewal tick
///
/// Never returned to a caller; reported through the observer only.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenewalError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("lock row for action '{action}' held by '{holder}' no longer exists")]
    RowMissing { action: String, holder: String },
}
