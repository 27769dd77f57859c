//! Error types for update ingestion.

use medlink_cache::CacheError;
use thiserror::Error;

/// Errors that can occur while ingesting an update.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Payload is missing its identifying field or carries no body.
    /// Rejected at the boundary; nothing is cached and nothing is broadcast.
    #[error("invalid update payload: {0}")]
    Validation(String),

    /// Cache backend failed. The update was not cached, so no notification
    /// fires and the webhook delivery fails (the HIS retries).
    #[error(transparent)]
    Cache(#[from] CacheError),
}
