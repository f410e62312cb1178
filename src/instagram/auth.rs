//! Instagram OAuth flow
//!
//! Implements the authorization code flow plus the long-lived token
//! exchange and refresh endpoints.

use std::collections::HashMap;

use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};
use serde::Deserialize;
use url::Url;

use super::decode_response;
use super::token::{AccessToken, ShortLivedToken};
use crate::config::InstagramConfig;
use crate::error::AppError;

const STATE_LENGTH: usize = 26;

/// First step of the flow: where to send the user, and the state to remember
#[derive(Debug, Clone)]
pub struct AuthStart {
    pub redirect_url: Url,
    pub state: String,
}

/// Parameters of the provider callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCallback {
    pub code: String,
    pub state: String,
}

/// Result of `refresh_if_needed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Unchanged(AccessToken),
    Refreshed(AccessToken),
}

impl RefreshOutcome {
    pub fn into_token(self) -> AccessToken {
        match self {
            RefreshOutcome::Unchanged(token) | RefreshOutcome::Refreshed(token) => token,
        }
    }

    pub fn was_refreshed(&self) -> bool {
        matches!(self, RefreshOutcome::Refreshed(_))
    }
}

/// Long-lived token response from the exchange and refresh endpoints
#[derive(Debug, Deserialize)]
struct LongLivedTokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl LongLivedTokenResponse {
    fn into_token(self) -> Result<AccessToken, AppError> {
        AccessToken::from_expires_in(self.access_token, self.token_type, self.expires_in, Utc::now())
    }
}

/// Token manager for one Instagram app
pub struct InstagramAuth {
    http: reqwest::Client,
    app_id: String,
    app_secret: String,
    redirect_uri: Option<String>,
    authorize_url: String,
    api_base_url: String,
    graph_base_url: String,
}

impl InstagramAuth {
    pub fn new(http: reqwest::Client, config: &InstagramConfig) -> Self {
        Self {
            http,
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            authorize_url: config.authorize_url.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            graph_base_url: config.graph_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Use `redirect_uri` unless one is fixed in configuration
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        if self.redirect_uri.is_none() {
            self.redirect_uri = Some(redirect_uri.into());
        }
        self
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    fn require_redirect_uri(&self) -> Result<&str, AppError> {
        self.redirect_uri
            .as_deref()
            .ok_or_else(|| AppError::Config("OAuth redirect URI is not set".to_string()))
    }

    /// Build the authorization URL and a fresh opaque state
    ///
    /// # Arguments
    /// * `scope` - e.g. "user_profile,user_media"
    pub fn start_auth(&self, scope: &str) -> Result<AuthStart, AppError> {
        let state = generate_state();
        let redirect_url = Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", self.app_id.as_str()),
                ("redirect_uri", self.require_redirect_uri()?),
                ("scope", scope),
                ("response_type", "code"),
                ("state", state.as_str()),
            ],
        )
        .map_err(|e| AppError::Config(format!("instagram.authorize_url is invalid: {e}")))?;

        Ok(AuthStart {
            redirect_url,
            state,
        })
    }

    /// Extract `code` and `state` from callback query parameters
    pub fn parse_callback(params: &HashMap<String, String>) -> Option<AuthCallback> {
        let code = params.get("code").filter(|v| !v.is_empty())?;
        let state = params.get("state").filter(|v| !v.is_empty())?;

        Some(AuthCallback {
            code: code.clone(),
            state: state.clone(),
        })
    }

    /// Exchange an authorization code for a short-lived token.
    ///
    /// The caller must have verified the callback state first.
    pub async fn complete_auth(&self, code: &str) -> Result<ShortLivedToken, AppError> {
        let url = format!("{}/oauth/access_token", self.api_base_url);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("client_id", self.app_id.as_str()),
                ("client_secret", self.app_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.require_redirect_uri()?),
                ("code", code),
            ])
            .send()
            .await?;

        let token: ShortLivedToken = decode_response(response, "code exchange").await?;
        tracing::info!(user_id = %token.user_id, "Obtained short-lived token");
        Ok(token)
    }

    /// Exchange a short-lived token for a long-lived one
    pub async fn upgrade(&self, short: &ShortLivedToken) -> Result<AccessToken, AppError> {
        let url = format!("{}/access_token", self.graph_base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("grant_type", "ig_exchange_token"),
                ("client_secret", self.app_secret.as_str()),
                ("access_token", short.access_token.as_str()),
            ])
            .send()
            .await?;

        let token = decode_response::<LongLivedTokenResponse>(response, "long-lived token exchange")
            .await?
            .into_token()?;
        tracing::info!(expires_at = %token.expires_at, "Obtained long-lived token");
        Ok(token)
    }

    /// Refresh `token` if it expires within `threshold_days`.
    ///
    /// No request is made otherwise.
    pub async fn refresh_if_needed(
        &self,
        token: AccessToken,
        threshold_days: i64,
    ) -> Result<RefreshOutcome, AppError> {
        if !token.close_to_expiry(threshold_days) {
            return Ok(RefreshOutcome::Unchanged(token));
        }

        tracing::info!(expires_at = %token.expires_at, "Refreshing long-lived token");

        let url = format!("{}/refresh_access_token", self.graph_base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("grant_type", "ig_refresh_token"),
                ("access_token", token.access_token.as_str()),
            ])
            .send()
            .await?;

        let refreshed = decode_response::<LongLivedTokenResponse>(response, "token refresh")
            .await?
            .into_token()?;
        Ok(RefreshOutcome::Refreshed(refreshed))
    }
}

fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}
