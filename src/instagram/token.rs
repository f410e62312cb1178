//! Access token types
//!
//! A long-lived Instagram token is valid for about 60 days and can be
//! refreshed before it expires. Tokens are persisted as a JSON string.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Long-lived access token with an absolute expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Build a token from a provider `expires_in` (seconds) relative to `now`
    ///
    /// An `expires_in` outside the representable date range is an upstream error.
    pub fn from_expires_in(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_in: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let expires_at = Duration::try_seconds(expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| AppError::Upstream(format!("expires_in out of range: {expires_in}")))?;

        Ok(Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            expires_at,
        })
    }

    /// Serialize for persistence
    pub fn serialize(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a persisted token
    pub fn deserialize(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw).map_err(|e| AppError::MalformedToken(e.to_string()))
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True when the token expires within `days` of now (or already has)
    pub fn close_to_expiry(&self, days: i64) -> bool {
        self.close_to_expiry_at(days, Utc::now())
    }

    pub fn close_to_expiry_at(&self, days: i64, now: DateTime<Utc>) -> bool {
        match Duration::try_days(days) {
            Some(threshold) => self.expires_at - now <= threshold,
            // Wider than any representable lifetime
            None => days > 0,
        }
    }
}

/// Short-lived token returned by the authorization-code exchange
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShortLivedToken {
    pub access_token: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
}

/// Instagram returns `user_id` as a JSON number; accept strings as well.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}
