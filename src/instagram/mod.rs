//! Instagram API client
//!
//! Handles:
//! - OAuth authorization-code flow and long-lived tokens
//! - Graph API media listing
//! - Media and manifest types

mod auth;
mod graph;
pub mod media;
pub mod token;

pub use auth::{AuthCallback, AuthStart, InstagramAuth, RefreshOutcome};
pub use graph::GraphApi;
pub use media::{GalleryEntry, MediaEntry, MediaKind, MediaPage, MediaType};
pub use token::{AccessToken, ShortLivedToken};

use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Decode a provider response, turning non-2xx or malformed bodies into
/// `AppError::Upstream`.
///
/// Instagram reports errors either as `{"error_message": ..}` (OAuth
/// endpoints) or `{"error": {"message": ..}}` (Graph API).
pub(crate) async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> Result<T, AppError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let detail = provider_error_message(&body).unwrap_or_else(|| "no error message".into());
        tracing::warn!(%status, operation, %detail, "Instagram request failed");
        return Err(AppError::Upstream(format!(
            "{operation} failed with status {status}: {detail}"
        )));
    }

    serde_json::from_str(&body).map_err(|error| {
        tracing::warn!(%error, operation, "Instagram returned a malformed body");
        AppError::Upstream(format!("{operation} returned a malformed body: {error}"))
    })
}

fn provider_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error_message")
        .and_then(|m| m.as_str())
        .or_else(|| value.pointer("/error/message").and_then(|m| m.as_str()))
        .map(ToOwned::to_owned)
}
