//! Instagram OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with Instagram.

use std::collections::HashMap;

use axum::{
    Router,
    extract::{Host, OriginalUri, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};

use crate::AppState;
use crate::error::AppError;
use crate::instagram::InstagramAuth;
use crate::storage::{KvStore, keys};

/// Create authentication router
///
/// Routes:
/// - GET / - Setup page
/// - GET /auth/ - OAuth start (config_key) and callback (code, state)
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/", get(setup_page))
        .route("/auth/", get(instagram_auth))
}

/// Whether a long-lived token has been stored
pub async fn is_authenticated(kv: &dyn KvStore) -> Result<bool, AppError> {
    Ok(kv.get(keys::ACCESS_TOKEN).await?.is_some())
}

// =============================================================================
// Setup Page
// =============================================================================

/// GET /
///
/// Renders the form that starts authentication with the configuration key.
async fn setup_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let warning = if is_authenticated(state.kv.as_ref()).await? {
        "<p>You are already authenticated. If you proceed, old authentication will be lost.</p>"
    } else {
        ""
    };

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Set Up Instagram Gallery</title></head>
<body>
    <h1>Set Up Instagram Gallery</h1>
    <form action="/auth/" method="GET">
        <label for="config_key">Configuration Key:</label>
        <input type="text" id="config_key" name="config_key">
        <button type="submit">Authenticate with Instagram</button>
        {warning}
        <p>The configuration key is the value of the gallery.config_key setting.</p>
    </form>
</body>
</html>
"#
    )))
}

// =============================================================================
// Instagram OAuth
// =============================================================================

/// GET /auth/
///
/// # Steps
/// 1. With a matching `config_key`: store a fresh state and redirect to Instagram
/// 2. With `code` and `state`: verify state, exchange code, upgrade and store token
/// 3. With `error`: the user denied access
async fn instagram_auth(
    State(state): State<AppState>,
    Host(host): Host,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let config = &state.config;

    if !config.instagram.has_credentials() || config.gallery.config_key.is_empty() {
        return Err(AppError::KeysNotSetUp);
    }

    let auth = InstagramAuth::new(state.http_client.clone(), &config.instagram)
        .with_redirect_uri(redirect_uri(&host, uri.path()));

    if params
        .get("config_key")
        .is_some_and(|key| config.gallery.key_matches(key))
    {
        state.kv.delete(keys::AUTH_STATE).await?;
        let start = auth.start_auth(&config.instagram.scope)?;
        state.kv.put(keys::AUTH_STATE, &start.state).await?;

        tracing::info!("Redirecting to Instagram authorization");
        return Ok((
            StatusCode::FOUND,
            [(header::LOCATION, start.redirect_url.to_string())],
        )
            .into_response());
    }

    if let Some(callback) = InstagramAuth::parse_callback(&params) {
        let expected = state.kv.get(keys::AUTH_STATE).await?;
        if expected.as_deref() != Some(callback.state.as_str()) {
            tracing::warn!("OAuth callback state mismatch");
            return Err(AppError::Unauthorized("Invalid state".to_string()));
        }

        let short = auth.complete_auth(&callback.code).await?;
        state.kv.delete(keys::AUTH_STATE).await?;

        let token = auth.upgrade(&short).await?;
        state.kv.put(keys::ACCESS_TOKEN, &token.serialize()?).await?;
        state.kv.put(keys::USER_ID, &short.user_id).await?;

        tracing::info!(user_id = %short.user_id, "Instagram authentication completed");
        return Ok("Authentication Successful".into_response());
    }

    if params.get("error").is_some_and(|e| !e.is_empty()) {
        return Err(AppError::Unauthorized("User denied access".to_string()));
    }

    Err(AppError::BadRequest("Bad Request".to_string()))
}

// =============================================================================
// Helpers
// =============================================================================

/// Callback URL for this request: `https://<host><path>` with a trailing slash
fn redirect_uri(host: &str, path: &str) -> String {
    if path.ends_with('/') {
        format!("https://{host}{path}")
    } else {
        format!("https://{host}{path}/")
    }
}
