//! Common error types for the visualization orchestrator

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::backend::traits::BackendError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown request: {0}")]
    RequestNotFound(Uuid),

    #[error("Image fetch failed: {0}")]
    Fetch(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Post-processing failed: {0}")]
    PostProcess(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body returned by the HTTP API
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
            AppError::Json(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", Some("invalid_json")),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, "backend_error", None),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", None),
            AppError::RequestNotFound(_) => (StatusCode::NOT_FOUND, "not_found_error", Some("unknown_request")),
            AppError::Fetch(_) => (StatusCode::BAD_GATEWAY, "fetch_error", None),
            AppError::Backend(BackendError::RateLimited { .. }) => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limit_error", Some("backend_rate_limited"))
            }
            AppError::Backend(_) => (StatusCode::BAD_GATEWAY, "backend_error", None),
            AppError::PostProcess(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                message: self.to_string(),
                kind: kind.to_string(),
                code: code.map(|c| c.to_string()),
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
