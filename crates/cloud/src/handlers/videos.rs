//! Video admission endpoint.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use gantry_core::messages::VideoUploadRequest;

fn required_header(headers: &HeaderMap, name: &str) -> Result<String, ApiError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest(format!("missing required header: {name}")))
}

/// `POST /v1/album/{album_uid}/videoupload` — admit one video payload.
///
/// The payload is the octet-stream body; identity rides in headers.
/// Returns 409 when the video is not in the album's stored manifest.
pub async fn post_video_upload(
    State(state): State<AppState>,
    Path(album_uid): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let provider_id = required_header(&headers, "X-Provider-ID")?;
    let database_id = required_header(&headers, "X-Database-ID")?;
    let user_id = required_header(&headers, "X-User-ID")?;
    let video_uid = required_header(&headers, "X-Video-UID")?;

    let req = VideoUploadRequest {
        provider_id,
        database_id,
        user_id,
        album_uid,
        video_uid,
        data: body.to_vec(),
    };

    state.admission.process(&req).await?;
    Ok(StatusCode::OK)
}
