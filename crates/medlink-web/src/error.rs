//! Error types for the web surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use medlink_hub::HubError;
use medlink_ingest::IngestError;

/// Errors that can occur while handling a request.
#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Hub(#[from] HubError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            // The sender's payload is wrong; retrying it unchanged won't help.
            WebError::Ingest(IngestError::Validation(_)) => StatusCode::BAD_REQUEST,
            // The cache backend is down; the HIS should retry delivery.
            WebError::Ingest(IngestError::Cache(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            WebError::Hub(HubError::Closed) => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
