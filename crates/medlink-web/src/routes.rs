//! Web routes.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use medlink_hub::Hub;
use medlink_ingest::{HisUpdate, Ingestor};

use crate::WebError;
use crate::socket::serve_connection;

/// Shared state for the web server.
pub struct AppState {
    pub hub: Hub,
    pub ingestor: Ingestor,
}

/// Create the web router.
pub fn create_router(hub: Hub, ingestor: Ingestor) -> Router {
    let state = Arc::new(AppState { hub, ingestor });

    Router::new()
        .route("/api/updates", post(receive_update))
        .route("/ws/{user_id}", get(ws_connect))
        .route("/ws/{user_id}/disconnect", post(ws_disconnect))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HIS webhook intake.
async fn receive_update(
    State(state): State<Arc<AppState>>,
    Json(update): Json<HisUpdate>,
) -> Result<StatusCode, WebError> {
    state.ingestor.ingest(update).await?;
    Ok(StatusCode::OK)
}

/// Upgrade to a notification WebSocket for the given user.
async fn ws_connect(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<u64>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    info!(user_id, "websocket upgrade requested");
    let hub = state.hub.clone();
    upgrade.on_upgrade(move |socket| serve_connection(hub, user_id, socket))
}

/// Administrative disconnect: drop the user's registration, which closes
/// their queue and terminates the connection task.
async fn ws_disconnect(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<u64>,
) -> Result<Json<serde_json::Value>, WebError> {
    state.hub.unregister(user_id).await?;
    Ok(Json(json!({ "status": "disconnected", "user_id": user_id })))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let clients = state.hub.client_count().await.ok();

    Json(json!({
        "status": if clients.is_some() { "ok" } else { "degraded" },
        "connected_clients": clients.unwrap_or(0),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
