//! Error types for HIS communication and reconciliation.

use medlink_cache::CacheError;
use thiserror::Error;

/// Errors from talking to the hospital information system.
#[derive(Debug, Error)]
pub enum HisError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("HIS request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The HIS answered with a non-success status.
    #[error("HIS returned status {0}")]
    Status(reqwest::StatusCode),

    /// The response body was not the expected shape.
    #[error("failed to decode HIS response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors from one reconciliation pass.
///
/// The worker logs these and keeps running; they never stop the loop.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    His(#[from] HisError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
