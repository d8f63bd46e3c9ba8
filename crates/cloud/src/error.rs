//! API error types.

use crate::services::{AdmissionError, ManifestError, UserAlbumsError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] gantry_catalog::CatalogError),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
            Self::Catalog(_) => "catalog_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ManifestError> for ApiError {
    fn from(err: ManifestError) -> Self {
        match err {
            // Semantic outcome, not a retryable failure.
            ManifestError::UserMismatch => Self::Conflict(err.to_string()),
            ManifestError::Catalog(e) => Self::Catalog(e),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<AdmissionError> for ApiError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::NotInManifest => Self::Conflict(err.to_string()),
            AdmissionError::Catalog(e) => Self::Catalog(e),
        }
    }
}

impl From<UserAlbumsError> for ApiError {
    fn from(err: UserAlbumsError) -> Self {
        match err {
            UserAlbumsError::Catalog(e) => Self::Catalog(e),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
