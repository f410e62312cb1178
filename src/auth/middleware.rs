//! Configuration-key middleware
//!
//! Protects operational routes with the shared gallery key.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::error::AppError;

fn extract_key_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Middleware requiring `Authorization: Bearer <gallery.config_key>`
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/metrics", ...)
///     .route_layer(middleware::from_fn_with_state(state, require_config_key));
/// ```
pub async fn require_config_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = extract_key_from_headers(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Missing configuration key".to_string()))?;

    if !state.config.gallery.key_matches(key) {
        return Err(AppError::Unauthorized(
            "Invalid Configuration Key".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
