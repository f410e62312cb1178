//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub instagram: InstagramConfig,
    pub gallery: GalleryConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub cloudflare: CloudflareConfig,
    pub kv: KvConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

/// Instagram application credentials and endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct InstagramConfig {
    /// Instagram app id (client_id)
    #[serde(default)]
    pub app_id: String,
    /// Instagram app secret
    #[serde(default)]
    pub app_secret: String,
    /// Fixed OAuth redirect URI.
    ///
    /// If omitted, it is derived from the Host header of the auth request.
    pub redirect_uri: Option<String>,
    /// Requested permissions, comma separated
    pub scope: String,
    /// Authorization page the user is redirected to
    pub authorize_url: String,
    /// Base URL for the code exchange (`/oauth/access_token`)
    pub api_base_url: String,
    /// Versioned Graph API base URL
    pub graph_base_url: String,
}

impl InstagramConfig {
    /// Both app credentials are present
    pub fn has_credentials(&self) -> bool {
        !self.app_id.trim().is_empty() && !self.app_secret.trim().is_empty()
    }
}

/// Gallery settings
#[derive(Debug, Clone, Deserialize)]
pub struct GalleryConfig {
    /// Shared key protecting `/auth/` and `/update`
    #[serde(default)]
    pub config_key: String,
    /// Public URL of the bucket that serves media objects
    /// e.g., "https://media.example.com"
    #[serde(default)]
    pub public_base_url: String,
}

impl GalleryConfig {
    /// Compare a user supplied key against the configured one.
    ///
    /// An unset configured key never matches.
    pub fn key_matches(&self, candidate: &str) -> bool {
        !self.config_key.is_empty() && self.config_key == candidate
    }
}

/// Object storage backend selector
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    R2,
    Memory,
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// R2 bucket name holding media and the manifest
    #[serde(default)]
    pub bucket: String,
}

/// Cloudflare credentials
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CloudflareConfig {
    /// Cloudflare account ID
    #[serde(default)]
    pub account_id: String,
    /// R2 access key ID
    #[serde(default)]
    pub r2_access_key_id: String,
    /// R2 secret access key
    #[serde(default)]
    pub r2_secret_access_key: String,
}

/// Key/value backend selector
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum KvBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Key/value store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KvConfig {
    #[serde(default)]
    pub backend: KvBackend,
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Scheduled sync configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Run the sync on a timer
    pub enabled: bool,
    /// Timer interval in seconds
    pub interval_seconds: u64,
    /// Refresh the token when it expires within this many days
    pub refresh_threshold_days: i64,
    /// Maximum number of media pages to follow
    pub max_pages: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (INSTAGALLERY__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("instagram.scope", "user_profile,user_media")?
            .set_default(
                "instagram.authorize_url",
                "https://www.instagram.com/oauth/authorize",
            )?
            .set_default("instagram.api_base_url", "https://api.instagram.com")?
            .set_default(
                "instagram.graph_base_url",
                "https://graph.instagram.com/v18.0",
            )?
            .set_default("storage.backend", "r2")?
            .set_default("kv.backend", "sqlite")?
            .set_default("kv.path", "data/instagallery.db")?
            .set_default("sync.enabled", true)?
            .set_default("sync.interval_seconds", 3600)?
            .set_default("sync.refresh_threshold_days", 30)?
            .set_default("sync.max_pages", 1)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("INSTAGALLERY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.storage.backend == StorageBackend::R2 {
            let missing = [
                ("storage.bucket", &self.storage.bucket),
                ("cloudflare.account_id", &self.cloudflare.account_id),
                ("cloudflare.r2_access_key_id", &self.cloudflare.r2_access_key_id),
                (
                    "cloudflare.r2_secret_access_key",
                    &self.cloudflare.r2_secret_access_key,
                ),
            ]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty());

            if let Some((name, _)) = missing {
                return Err(crate::error::AppError::Config(format!(
                    "{name} is required when storage.backend=r2"
                )));
            }
        }

        if !(0..=MAX_REFRESH_THRESHOLD_DAYS).contains(&self.sync.refresh_threshold_days) {
            return Err(crate::error::AppError::Config(format!(
                "sync.refresh_threshold_days must be between 0 and {MAX_REFRESH_THRESHOLD_DAYS}"
            )));
        }

        if !self.instagram.has_credentials() || self.gallery.config_key.is_empty() {
            tracing::warn!("Instagram app credentials or gallery.config_key are not set");
        }

        Ok(())
    }
}

/// Upper bound for `sync.refresh_threshold_days`
const MAX_REFRESH_THRESHOLD_DAYS: i64 = 365;
