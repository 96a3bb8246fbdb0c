//! Error handling module for the biomap backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
#[allow(dead_code)]
pub mod codes {
    pub const INVALID_PARAMETER: &str = "INVALID_PARAMETER";
    pub const INVALID_ZOOM: &str = "INVALID_ZOOM";
    pub const STORE_UNAVAILABLE: &str = "STORE_UNAVAILABLE";
    pub const ENCODING_ERROR: &str = "ENCODING_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application error type.
///
/// Errors are detected as early as possible (parameter parsing before any
/// geometry work, zoom validation before the store query) and surfaced
/// without partial output.
#[derive(Debug)]
pub enum AppError {
    /// Malformed filter parameter (bad date, non-integer id token, ...)
    InvalidParameter(String),
    /// Zoom outside [1, 20], or x/y outside the valid range for the zoom
    InvalidZoom(String),
    /// The record/area store cannot be reached or the query failed
    Store(String),
    /// A geometry could not be serialized to the tile wire format
    Encoding(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidZoom(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidParameter(_) => codes::INVALID_PARAMETER,
            AppError::InvalidZoom(_) => codes::INVALID_ZOOM,
            AppError::Store(_) => codes::STORE_UNAVAILABLE,
            AppError::Encoding(_) => codes::ENCODING_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::InvalidParameter(msg)
            | AppError::InvalidZoom(msg)
            | AppError::Store(msg)
            | AppError::Encoding(msg)
            | AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Store error: {:?}", err);
        AppError::Store(format!("Store error: {}", err))
    }
}

impl From<mvt::Error> for AppError {
    fn from(err: mvt::Error) -> Self {
        tracing::error!("Tile encoding error: {:?}", err);
        AppError::Encoding(format!("Tile encoding error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::Internal(format!("JSON error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
