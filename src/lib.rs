//! InstaGallery - mirrors an Instagram media feed into object storage
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Setup page and OAuth flow (/, /auth/)                    │
//! │  - Gallery rendering (/gallery)                             │
//! │  - Manual sync trigger (/update)                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Gallery sync (token refresh, prune, download, manifest)  │
//! │  - Instagram OAuth and Graph API client                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Storage Layer                            │
//! │  - Key/value state (SQLite)                                 │
//! │  - Media objects and manifest (R2)                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: gallery, update and metrics handlers
//! - `auth`: setup page, OAuth endpoints, key middleware
//! - `instagram`: Instagram API client and types
//! - `service`: gallery synchronization
//! - `storage`: object and key/value stores
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod instagram;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;

use storage::{KvStore, ObjectStore};

/// Application state shared across all handlers
///
/// This struct is cloned for each request and holds only the
/// injected stores, configuration and the HTTP client.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Token and OAuth state
    pub kv: Arc<dyn KvStore>,

    /// Media objects and manifest
    pub bucket: Arc<dyn ObjectStore>,

    /// HTTP client for Instagram and media downloads
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Initialize application state from configured backends
    ///
    /// # Errors
    /// Returns error if a store cannot be opened
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let kv: Arc<dyn KvStore> = match config.kv.backend {
            config::KvBackend::Sqlite => Arc::new(storage::SqliteKv::connect(&config.kv.path).await?),
            config::KvBackend::Memory => {
                tracing::warn!("Using in-memory key/value store; tokens are lost on restart");
                Arc::new(storage::MemoryKv::new())
            }
        };
        tracing::info!(backend = ?config.kv.backend, "Key/value store initialized");

        let bucket: Arc<dyn ObjectStore> = match config.storage.backend {
            config::StorageBackend::R2 => Arc::new(storage::R2Store::new(
                &config.storage.bucket,
                &config.cloudflare,
            )),
            config::StorageBackend::Memory => Arc::new(storage::MemoryStore::new()),
        };
        tracing::info!(backend = ?config.storage.backend, "Object storage initialized");

        Self::from_parts(config, kv, bucket)
    }

    /// Build state around already constructed stores
    pub fn from_parts(
        config: config::AppConfig,
        kv: Arc<dyn KvStore>,
        bucket: Arc<dyn ObjectStore>,
    ) -> Result<Self, error::AppError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("InstaGallery/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            kv,
            bucket,
            http_client,
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router())
        .merge(api::gallery_router())
        .merge(api::update_router())
        .merge(api::metrics_router(state.clone()))
        .fallback(not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn not_found() -> error::AppError {
    error::AppError::NotFound("Not Found".to_string())
}
