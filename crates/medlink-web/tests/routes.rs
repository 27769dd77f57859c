//! Router-level tests driven through tower without a bound listener.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use tower::ServiceExt;

use medlink_cache::{CacheStore, MemoryStore};
use medlink_hub::{Hub, HubConfig};
use medlink_ingest::Ingestor;
use medlink_web::create_router;

fn test_app() -> (Router, Arc<MemoryStore>, Hub) {
    let cache = Arc::new(MemoryStore::new());
    let hub = Hub::spawn(HubConfig::default());
    let ingestor = Ingestor::new(cache.clone(), hub.clone(), Duration::from_secs(60));
    (create_router(hub.clone(), ingestor), cache, hub)
}

fn post_update(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/updates")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn valid_update_is_accepted_cached_and_broadcast() {
    let (app, cache, hub) = test_app();
    let mut client = hub.register(1).await.unwrap();

    let response = app
        .oneshot(post_update(
            r#"{"kind":"reception","call_id":42,"receptions":[{"slot":"10:30"}]}"#,
        ))
        .await
        .unwrap();
    // Webhook success is 200 with an empty body.
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());

    assert!(cache.get("receptions:42").await.unwrap().is_some());
    let notification = client.queue.recv().await.unwrap();
    assert_eq!(notification.reference, "receptions");
    assert_eq!(notification.reference_id, 42);
}

#[tokio::test]
async fn update_without_identifier_is_rejected_with_400() {
    let (app, cache, _hub) = test_app();

    let response = app
        .oneshot(post_update(r#"{"kind":"reception","receptions":[]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(parsed["error"].as_str().unwrap().contains("call_id"));

    assert!(cache.get("receptions:0").await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_update_kind_is_a_client_error() {
    let (app, _cache, _hub) = test_app();

    let response = app
        .oneshot(post_update(r#"{"kind":"discharge","id":1}"#))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn disconnect_drops_the_registration() {
    let (app, _cache, hub) = test_app();
    let mut client = hub.register(7).await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ws/7/disconnect")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["status"], "disconnected");
    assert_eq!(parsed["user_id"], 7);

    // The queue closes, which is what terminates the connection task.
    assert!(client.queue.recv().await.is_none());
    assert_eq!(hub.client_count().await.unwrap(), 0);
}

#[tokio::test]
async fn health_reports_ok_and_client_count() {
    let (app, _cache, hub) = test_app();
    let _client = hub.register(3).await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["connected_clients"], 1);
}
