//! Error types for InstaGallery
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` so handlers can return them directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Every variant maps to a `{message, status}` pair. Errors are
/// propagated with `?` and translated into a plain-text HTTP
/// response at the handler boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Malformed or incomplete request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Rejected credentials or state (401)
    #[error("{0}")]
    Unauthorized(String),

    /// No access token has been stored yet (401)
    #[error("Not Authenticated")]
    NotAuthenticated,

    /// Persisted token could not be decoded (500)
    #[error("Malformed access token: {0}")]
    MalformedToken(String),

    /// App secrets or configuration key missing at request time (500)
    #[error("Keys are not set up")]
    KeysNotSetUp,

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Object storage error (500)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Key/value store error (500)
    #[error("Key/value store error: {0}")]
    Kv(#[from] sqlx::Error),

    /// Instagram API returned an error (502)
    #[error("Instagram API error: {0}")]
    Upstream(String),

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// JSON encode/decode error (500)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// HTTP status and metric label for this error
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "not_authenticated"),
            AppError::MalformedToken(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "malformed_token")
            }
            AppError::KeysNotSetUp => (StatusCode::INTERNAL_SERVER_ERROR, "keys_not_set_up"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config"),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
            AppError::Kv(_) => (StatusCode::INTERNAL_SERVER_ERROR, "kv"),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream"),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, "http_client"),
            AppError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "serialization")
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to a plain-text HTTP response
    fn into_response(self) -> Response {
        let (status, error_type) = self.status();

        let message = match &self {
            AppError::Kv(_) => "Key/value store error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, error_type, "Request failed");
        } else {
            tracing::debug!(error = %self, error_type, "Request rejected");
        }

        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[error_type])
            .inc();

        (status, message).into_response()
    }
}
