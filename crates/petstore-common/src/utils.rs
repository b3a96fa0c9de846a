//! Utility functions shared across the pet store
//!
//! Row id generation and holder identity for coordination rows.

use ulid::Ulid;

/// Fallback holder name when the host name cannot be read
const UNKNOWN_HOST: &str = "unknown-host";

/// Generate a new time-sortable row id
///
/// ULIDs sort lexicographically by creation time, so primary keys created by
/// the same table stay roughly insertion-ordered.
///
/// # Examples
///
/// ```
/// use petstore_common::new_ulid;
///
/// let id = new_ulid();
/// assert_eq!(id.len(), 26);
/// ```
pub fn new_ulid() -> String {
    Ulid::new().to_string()
}

/// Get the identity of this node for lock ownership
///
/// Formatted as `<host name>-<process id>` so two processes on the same
/// machine never share a holder string.
pub fn node_identity() -> String {
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string());

    format!("{}-{}", host, std::process::id())
}
