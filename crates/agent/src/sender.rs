//! Video push: vault to agent receiver.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SenderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),
}

/// Delivers one payload to a receiver. The simulated vault calls this once
/// per video during a `c_move`.
#[async_trait]
pub trait VideoSender: Send + Sync {
    async fn send_video(
        &self,
        database_id: &str,
        album_uid: &str,
        video_uid: &str,
        data: Bytes,
    ) -> Result<(), SenderError>;
}

/// Pushes payloads to the agent's `/receive-video` endpoint.
pub struct HttpVideoSender {
    receiver_url: String,
    provider_id: String,
    http: reqwest::Client,
}

impl HttpVideoSender {
    pub fn new(receiver_url: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            receiver_url: receiver_url.into(),
            provider_id: provider_id.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl VideoSender for HttpVideoSender {
    async fn send_video(
        &self,
        database_id: &str,
        album_uid: &str,
        video_uid: &str,
        data: Bytes,
    ) -> Result<(), SenderError> {
        let response = self
            .http
            .post(format!("{}/receive-video", self.receiver_url))
            .header("Content-Type", "application/octet-stream")
            .header("X-Provider-ID", &self.provider_id)
            .header("X-Database-ID", database_id)
            .header("X-Album-UID", album_uid)
            .header("X-Video-UID", video_uid)
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SenderError::UnexpectedStatus(status.as_u16()));
        }
        Ok(())
    }
}
