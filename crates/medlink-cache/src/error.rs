//! Error types for the cache store.

use thiserror::Error;

/// Errors that can occur in cache operations.
///
/// A missing or expired key is not an error; `get` reports both as
/// `Ok(None)`.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Cache backend could not be reached.
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    /// Payload could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
