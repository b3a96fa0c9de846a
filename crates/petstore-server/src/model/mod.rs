//! Server-side model types

pub mod config;
pub mod constants;
