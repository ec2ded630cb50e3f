/// Unified error types for Scouter Share
use crate::functions::FunctionsError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the share service
#[derive(Error, Debug)]
pub enum ShareError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Document store errors (bad field paths, malformed documents)
    #[error("Document store error: {0}")]
    Store(String),

    /// Remote function errors
    #[error("Remote function error: {0}")]
    Functions(#[from] FunctionsError),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert ShareError to HTTP response
impl IntoResponse for ShareError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ShareError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
            ),
            ShareError::Authorization(_) => (
                StatusCode::FORBIDDEN,
                "Forbidden",
                self.to_string(),
            ),
            ShareError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            ShareError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound", self.to_string()),
            ShareError::Functions(_) => (
                StatusCode::BAD_GATEWAY,
                "FunctionsFailed",
                self.to_string(),
            ),
            ShareError::Database(_) | ShareError::Internal(_) | ShareError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                self.to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for share operations
pub type ShareResult<T> = Result<T, ShareError>;
