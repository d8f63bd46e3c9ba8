//! HTTP handlers.

pub mod albums;
pub mod videos;

pub use albums::{post_album_manifest_upload, post_user_albums};
pub use videos::post_video_upload;

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

/// Health check. Intentionally unauthenticated for probes.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.catalog.health_check().await?;
    Ok(Json(json!({ "status": "ok" })))
}
