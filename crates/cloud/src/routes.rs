//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Maximum accepted video payload (64 MiB).
const MAX_VIDEO_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handlers::health_check))
        .route("/v1/useralbums", post(handlers::post_user_albums))
        .route(
            "/v1/albummanifestupload",
            post(handlers::post_album_manifest_upload),
        )
        .route(
            "/v1/album/{album_uid}/videoupload",
            post(handlers::post_video_upload),
        )
        .layer(DefaultBodyLimit::max(MAX_VIDEO_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
