//! Pet Store Server - process bootstrap
//!
//! Loads configuration, sets up logging, connects to the database, creates the
//! lock table when migrations are enabled and runs the one-time data seeding
//! step under the `"init"` lease lock.

pub mod metrics;
pub mod model;
pub mod seed;
pub mod startup;

pub use model::config::{Cli, Configuration};
