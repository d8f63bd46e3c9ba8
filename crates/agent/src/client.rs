//! HTTP client for the cloud catalogue API.

use async_trait::async_trait;
use gantry_core::messages::{
    AlbumManifestUploadRequest, UserAlbumsRequest, VideoUploadRequest,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The cloud refused the video as outside the accepted manifest (409).
    /// A semantic outcome, not a transport failure.
    #[error("video not in manifest")]
    NotInManifest,

    /// The cloud refused the manifest for a different user (409).
    #[error("user ID mismatch for existing album")]
    UserMismatch,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),
}

/// Outbound calls the agent makes against the cloud.
#[async_trait]
pub trait CloudClient: Send + Sync {
    async fn post_user_albums(&self, req: &UserAlbumsRequest) -> Result<(), ClientError>;

    async fn post_album_manifest_upload(
        &self,
        req: &AlbumManifestUploadRequest,
    ) -> Result<(), ClientError>;

    async fn post_video_upload(&self, req: &VideoUploadRequest) -> Result<(), ClientError>;
}

/// Reqwest-backed cloud client.
pub struct HttpCloudClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpCloudClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CloudClient for HttpCloudClient {
    async fn post_user_albums(&self, req: &UserAlbumsRequest) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!("{}/v1/useralbums", self.base_url))
            .json(req)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus(status.as_u16()));
        }
        Ok(())
    }

    async fn post_album_manifest_upload(
        &self,
        req: &AlbumManifestUploadRequest,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!("{}/v1/albummanifestupload", self.base_url))
            .json(req)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::CONFLICT {
            return Err(ClientError::UserMismatch);
        }
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus(status.as_u16()));
        }
        Ok(())
    }

    async fn post_video_upload(&self, req: &VideoUploadRequest) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!(
                "{}/v1/album/{}/videoupload",
                self.base_url, req.album_uid
            ))
            .header("Content-Type", "application/octet-stream")
            .header("X-Provider-ID", &req.provider_id)
            .header("X-Database-ID", &req.database_id)
            .header("X-User-ID", &req.user_id)
            .header("X-Video-UID", &req.video_uid)
            .body(req.data.clone())
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::CONFLICT {
            return Err(ClientError::NotInManifest);
        }
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus(status.as_u16()));
        }
        Ok(())
    }
}
