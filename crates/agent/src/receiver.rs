//! The agent's receiver endpoint: the vault pushes each payload here and
//! the receiver forwards it to the cloud.

use crate::client::CloudClient;
use crate::retry::with_backoff;
use crate::vault::VaultRegistry;
use axum::Json;
use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use bytes::Bytes;
use gantry_core::RETRY_BACKOFF_BASE;
use gantry_core::messages::VideoUploadRequest;
use gantry_staging::{StagingStore, staging_key};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Maximum accepted payload (64 MiB).
const MAX_PAYLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ReceiverError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// Receiver wiring shared across requests.
#[derive(Clone)]
pub struct ReceiverState {
    pub staging: Arc<dyn StagingStore>,
    pub cloud: Arc<dyn CloudClient>,
    pub vaults: Arc<dyn VaultRegistry>,
    pub max_retries: u32,
    pub retry_base: Duration,
}

impl ReceiverState {
    pub fn new(
        staging: Arc<dyn StagingStore>,
        cloud: Arc<dyn CloudClient>,
        vaults: Arc<dyn VaultRegistry>,
        max_retries: u32,
    ) -> Self {
        Self {
            staging,
            cloud,
            vaults,
            max_retries: max_retries.max(1),
            retry_base: RETRY_BACKOFF_BASE,
        }
    }

    /// Override the retry backoff base. For tests.
    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }
}

/// Create the receiver router.
pub fn create_receiver_router(state: ReceiverState) -> Router {
    Router::new()
        .route("/receive-video", post(receive_video))
        .layer(DefaultBodyLimit::max(MAX_PAYLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn required_header(headers: &HeaderMap, name: &str) -> Result<String, ReceiverError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ReceiverError::BadRequest(format!("missing required header: {name}")))
}

/// `POST /receive-video` — stage, resolve, forward, clean up.
///
/// The payload is staged to durable storage before the upload so a
/// terminal failure never loses bytes; the staged file is only deleted on
/// success. On terminal failure the file stays behind (known gap: nothing
/// garbage-collects it yet) and a 500 fails the vault's transfer.
async fn receive_video(
    State(state): State<ReceiverState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ReceiverError> {
    let provider_id = required_header(&headers, "X-Provider-ID")?;
    let database_id = required_header(&headers, "X-Database-ID")?;
    let album_uid = required_header(&headers, "X-Album-UID")?;
    let video_uid = required_header(&headers, "X-Video-UID")?;

    let key = staging_key(&provider_id, &database_id, &album_uid, &video_uid);
    state
        .staging
        .store(&key, body)
        .await
        .map_err(|e| ReceiverError::Internal(format!("failed to stage payload: {e}")))?;

    let vault = state
        .vaults
        .get(&database_id)
        .map_err(|e| ReceiverError::Internal(format!("failed to resolve vault: {e}")))?;
    let user_id = vault
        .user_id_for_album(&album_uid)
        .await
        .map_err(|e| ReceiverError::Internal(format!("failed to resolve user: {e}")))?;

    // Re-read from staging: what we forward is exactly what survived disk.
    let data = state
        .staging
        .load(&key)
        .await
        .map_err(|e| ReceiverError::Internal(format!("failed to reload staged payload: {e}")))?;

    let req = VideoUploadRequest {
        provider_id,
        database_id,
        user_id,
        album_uid,
        video_uid,
        data: data.to_vec(),
    };

    let upload = with_backoff(state.max_retries, state.retry_base, || {
        state.cloud.post_video_upload(&req)
    })
    .await;

    if let Err(err) = upload {
        // The staged file stays for a later retry; failing here fails the
        // vault's transfer.
        tracing::error!(
            staging_key = %key,
            error = %err,
            "terminal upload failure, staged payload kept"
        );
        return Err(ReceiverError::Internal(format!(
            "failed to upload to cloud after {} attempts: {err}",
            state.max_retries
        )));
    }

    if let Err(err) = state.staging.delete(&key).await {
        tracing::warn!(staging_key = %key, error = %err, "failed to delete staged payload");
    }

    Ok(StatusCode::OK)
}
