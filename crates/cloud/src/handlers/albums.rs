//! User-albums and manifest-upload endpoints.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use gantry_core::messages::{AlbumManifestUploadRequest, UserAlbumsRequest};

/// `POST /v1/useralbums` — accept a user's album listing from the agent.
pub async fn post_user_albums(
    State(state): State<AppState>,
    Json(req): Json<UserAlbumsRequest>,
) -> ApiResult<StatusCode> {
    tracing::debug!(
        provider_id = %req.provider_id,
        user_id = %req.user_id,
        albums = req.album_uids.len(),
        "user albums received"
    );
    state.user_albums.process(&req).await?;
    Ok(StatusCode::OK)
}

/// `POST /v1/albummanifestupload` — accept a manifest snapshot.
///
/// Returns 409 when the album exists under a different user.
pub async fn post_album_manifest_upload(
    State(state): State<AppState>,
    Json(req): Json<AlbumManifestUploadRequest>,
) -> ApiResult<StatusCode> {
    state.manifest.process(&req).await?;
    Ok(StatusCode::OK)
}
