//! Common test utilities.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use gantry_catalog::{CatalogStore, MemoryStore};
use gantry_cloud::{AppState, create_router};
use gantry_core::config::CloudConfig;
use gantry_core::ManualClock;
use gantry_queue::InMemoryQueue;
use serde_json::Value;
use std::sync::Arc;
use time::macros::datetime;
use tower::ServiceExt;

/// A cloud catalogue wired over in-memory backends and a manual clock.
pub struct TestServer {
    pub router: Router,
    pub state: AppState,
    pub queue: Arc<InMemoryQueue>,
    pub clock: Arc<ManualClock>,
}

impl TestServer {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 12:00 UTC)));
        let catalog: Arc<dyn CatalogStore> = Arc::new(MemoryStore::new());
        let queue = Arc::new(InMemoryQueue::new(clock.clone()));

        let state = AppState::new(
            CloudConfig::for_testing(),
            catalog,
            queue.clone(),
            clock.clone(),
        );
        let router = create_router(state.clone());

        Self {
            router,
            state,
            queue,
            clock,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        &self.state.catalog
    }
}

/// POST a JSON body and decode the JSON response (if any).
pub async fn json_request(
    router: &Router,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// POST an octet-stream video payload with identity headers.
pub async fn upload_video(
    router: &Router,
    album_uid: &str,
    provider_id: &str,
    database_id: &str,
    user_id: &str,
    video_uid: &str,
    data: &[u8],
) -> StatusCode {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/v1/album/{album_uid}/videoupload"))
        .header("Content-Type", "application/octet-stream")
        .header("X-Provider-ID", provider_id)
        .header("X-Database-ID", database_id)
        .header("X-User-ID", user_id)
        .header("X-Video-UID", video_uid)
        .body(Body::from(data.to_vec()))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    response.status()
}
