use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid shortcode: {0}")]
    InvalidShortcode(String),

    #[error("Shortcode already exists: {0}")]
    ShortcodeTaken(String),

    #[error("Invalid validity: {0}")]
    InvalidValidity(String),

    #[error("Short URL not found: {0}")]
    NotFound(String),

    #[error("Short URL has expired: {0}")]
    Expired(String),

    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error("Shortcode generation failed after {0} attempts")]
    ShortcodeGenerationFailed(u32),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, "INVALID_URL"),
            AppError::InvalidShortcode(_) => (StatusCode::BAD_REQUEST, "INVALID_SHORTCODE"),
            AppError::ShortcodeTaken(_) => (StatusCode::BAD_REQUEST, "SHORTCODE_TAKEN"),
            AppError::InvalidValidity(_) => (StatusCode::BAD_REQUEST, "INVALID_VALIDITY"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Expired(_) => (StatusCode::GONE, "EXPIRED"),
            AppError::ShortcodeGenerationFailed(_)
            | AppError::Configuration(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let error_message = if status.is_server_error() {
            tracing::error!("Internal error: {}", self);
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "error": error_code,
            "message": error_message,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for AppResult
pub type AppResult<T> = Result<T, AppError>;
