//! API error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use anistream_core::ScrapeError;

/// Error body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

/// Errors surfaced by API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed request parameter.
    BadRequest(String),
    NotFound(String),
    /// Details are logged, the client gets a generic message.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        match err {
            ScrapeError::SiteNotFound(id) => ApiError::NotFound(format!("Site not found: {}", id)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Require a non-blank query parameter.
pub fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", name)))
}
