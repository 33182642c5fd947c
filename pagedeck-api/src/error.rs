use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Standard error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message describing what went wrong
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Failures while running the external compressor
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Compressor timed out after {0} s")]
    Timeout(u64),

    #[error("Compressor exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Compressor produced no output")]
    EmptyOutput,
}

/// Application-specific error types for the API
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The request itself is unusable
    #[error("{0}")]
    BadRequest(String),

    #[error("PDF processing failed")]
    Compress(#[from] CompressError),

    #[error("PDF processing failed")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Compress(e) => {
                error!("Compression failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(e) => {
                error!("Request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let error_response = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}
