//! Error types for the pet store

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum PetstoreError {
    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}
