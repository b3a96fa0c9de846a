//! Pet Store Common - Shared types and utilities
//!
//! This crate provides the foundational pieces used across all pet store components:
//! - Error types
//! - Clock abstraction (wall clock, tokio-anchored clock, manual test clock)
//! - Row id generation and node identity helpers

pub mod clock;
pub mod error;
pub mod utils;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock, TokioClock, add_saturating};
pub use error::PetstoreError;
pub use utils::{new_ulid, node_identity};
