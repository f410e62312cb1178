//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Duration, Utc};
use instagallery::instagram::AccessToken;
use instagallery::storage::{KvStore, MemoryKv, MemoryStore, keys};
use instagallery::{AppState, config};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const CONFIG_KEY: &str = "test-config-key";
pub const APP_SECRET: &str = "test-app-secret";
pub const PUBLIC_BASE_URL: &str = "https://media.test.example.com";

// =============================================================================
// Mock Instagram
// =============================================================================

/// Recorded requests and canned responses of the mock provider
#[derive(Default)]
pub struct MockState {
    pub base_url: OnceLock<String>,
    pub media: Mutex<Vec<Value>>,
    /// Served behind `paging.next` when non-empty
    pub second_page: Mutex<Vec<Value>>,
    pub children: Mutex<HashMap<String, Vec<Value>>>,
    pub cdn_hits: Mutex<HashMap<String, usize>>,
    pub refreshes: AtomicUsize,
    pub media_listings: AtomicUsize,
    pub second_page_listings: AtomicUsize,
}

/// In-process stand-in for the Instagram OAuth, Graph and CDN hosts
pub struct MockInstagram {
    pub addr: String,
    pub state: Arc<MockState>,
}

impl MockInstagram {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/oauth/access_token", post(code_exchange))
            .route("/access_token", get(long_lived_exchange))
            .route("/refresh_access_token", get(refresh))
            .route("/me/media", get(media_listing))
            .route("/me/media/page2", get(second_page_listing))
            .route("/:id/children", get(carousel_children))
            .route("/cdn/:name", get(cdn))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());
        state.base_url.set(addr.clone()).unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn cdn_url(&self, name: &str) -> String {
        format!("{}/cdn/{}", self.addr, name)
    }

    pub fn set_media(&self, media: Vec<Value>) {
        *self.state.media.lock().unwrap() = media;
    }

    pub fn set_second_page(&self, media: Vec<Value>) {
        *self.state.second_page.lock().unwrap() = media;
    }

    pub fn set_children(&self, carousel_id: &str, children: Vec<Value>) {
        self.state
            .children
            .lock()
            .unwrap()
            .insert(carousel_id.to_string(), children);
    }

    pub fn media_listings(&self) -> usize {
        self.state.media_listings.load(Ordering::SeqCst)
    }

    pub fn second_page_listings(&self) -> usize {
        self.state.second_page_listings.load(Ordering::SeqCst)
    }

    pub fn cdn_hits(&self, name: &str) -> usize {
        self.state
            .cdn_hits
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    pub fn refreshes(&self) -> usize {
        self.state.refreshes.load(Ordering::SeqCst)
    }

    pub fn image(&self, id: &str) -> Value {
        json!({
            "id": id,
            "caption": format!("Image {id}"),
            "media_type": "IMAGE",
            "media_url": self.cdn_url(&format!("{id}.jpg")),
            "timestamp": "2024-01-05T18:10:00+0000",
            "permalink": format!("https://www.instagram.com/p/{id}/"),
        })
    }

    pub fn video(&self, id: &str) -> Value {
        json!({
            "id": id,
            "caption": format!("Video {id}"),
            "media_type": "VIDEO",
            "media_url": self.cdn_url(&format!("{id}.mp4")),
            "thumbnail_url": self.cdn_url(&format!("{id}-thumb.jpg")),
            "timestamp": "2024-01-04T10:00:00+0000",
            "permalink": format!("https://www.instagram.com/reel/{id}/"),
        })
    }

    pub fn carousel(&self, id: &str) -> Value {
        json!({
            "id": id,
            "media_type": "CAROUSEL_ALBUM",
            "media_url": self.cdn_url(&format!("{id}.jpg")),
            "timestamp": "2024-01-03T10:00:00+0000",
            "permalink": format!("https://www.instagram.com/p/{id}/"),
        })
    }
}

fn oauth_error(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error_type": "OAuthException", "code": 400, "error_message": message})),
    )
        .into_response()
}

fn graph_error(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": {"message": message, "type": "OAuthException", "code": 190}})),
    )
        .into_response()
}

async fn code_exchange(Form(form): Form<HashMap<String, String>>) -> Response {
    let field = |name: &str| form.get(name).map(String::as_str).unwrap_or_default();

    if field("grant_type") != "authorization_code" || field("client_secret") != APP_SECRET {
        return oauth_error("Invalid client credentials");
    }
    if !field("redirect_uri").starts_with("https://") || !field("redirect_uri").ends_with("/auth/") {
        return oauth_error("Invalid redirect_uri");
    }
    if field("code") != "good-code" {
        return oauth_error("Invalid authorization code");
    }

    Json(json!({"access_token": "short-token", "user_id": 17841400000000000u64})).into_response()
}

async fn long_lived_exchange(Query(query): Query<HashMap<String, String>>) -> Response {
    let valid = query.get("grant_type").map(String::as_str) == Some("ig_exchange_token")
        && query.get("client_secret").map(String::as_str) == Some(APP_SECRET)
        && query.get("access_token").map(String::as_str) == Some("short-token");

    if !valid {
        return graph_error("Invalid exchange request");
    }

    Json(json!({"access_token": "long-token", "token_type": "bearer", "expires_in": 5_183_944}))
        .into_response()
}

async fn refresh(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if query.get("grant_type").map(String::as_str) != Some("ig_refresh_token") {
        return graph_error("Unsupported grant type");
    }

    state.refreshes.fetch_add(1, Ordering::SeqCst);
    Json(json!({"access_token": "refreshed-token", "token_type": "bearer", "expires_in": 5_183_944}))
        .into_response()
}

fn accepted_token(query: &HashMap<String, String>) -> Option<&str> {
    let token = query.get("access_token").map(String::as_str)?;
    matches!(token, "long-token" | "refreshed-token" | "stored-token").then_some(token)
}

async fn media_listing(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let Some(token) = accepted_token(&query) else {
        return graph_error("Invalid OAuth access token");
    };

    state.media_listings.fetch_add(1, Ordering::SeqCst);
    let media = state.media.lock().unwrap().clone();
    let mut paging = json!({"cursors": {"before": "b", "after": "a"}});
    if !state.second_page.lock().unwrap().is_empty() {
        let base = state.base_url.get().cloned().unwrap_or_default();
        paging["next"] = format!("{base}/me/media/page2?access_token={token}").into();
    }

    Json(json!({"data": media, "paging": paging})).into_response()
}

async fn second_page_listing(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if accepted_token(&query).is_none() {
        return graph_error("Invalid OAuth access token");
    }

    state.second_page_listings.fetch_add(1, Ordering::SeqCst);
    let media = state.second_page.lock().unwrap().clone();
    Json(json!({"data": media, "paging": {"cursors": {"before": "a", "after": "z"}}}))
        .into_response()
}

async fn carousel_children(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if accepted_token(&query).is_none() {
        return graph_error("Invalid OAuth access token");
    }

    match state.children.lock().unwrap().get(&id) {
        Some(children) => Json(json!({"data": children})).into_response(),
        None => graph_error("Unsupported get request"),
    }
}

async fn cdn(State(state): State<Arc<MockState>>, Path(name): Path<String>) -> Response {
    *state.cdn_hits.lock().unwrap().entry(name.clone()).or_default() += 1;

    if name.starts_with("broken") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "cdn failure").into_response();
    }

    let content_type = if name.ends_with(".mp4") {
        "video/mp4"
    } else {
        "image/jpeg"
    };

    (
        [(header::CONTENT_TYPE, content_type)],
        format!("bytes-of-{name}"),
    )
        .into_response()
}

// =============================================================================
// Test Server
// =============================================================================

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub kv: Arc<MemoryKv>,
    pub bucket: Arc<MemoryStore>,
    pub mock: MockInstagram,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after adjusting the default test configuration
    pub async fn with_config(adjust: impl FnOnce(&mut config::AppConfig)) -> Self {
        instagallery::metrics::init_metrics();

        let mock = MockInstagram::start().await;

        let mut config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            instagram: config::InstagramConfig {
                app_id: "test-app-id".to_string(),
                app_secret: APP_SECRET.to_string(),
                redirect_uri: None,
                scope: "user_profile,user_media".to_string(),
                authorize_url: "https://www.instagram.com/oauth/authorize".to_string(),
                api_base_url: mock.addr.clone(),
                graph_base_url: mock.addr.clone(),
            },
            gallery: config::GalleryConfig {
                config_key: CONFIG_KEY.to_string(),
                public_base_url: PUBLIC_BASE_URL.to_string(),
            },
            storage: config::StorageConfig {
                backend: config::StorageBackend::Memory,
                bucket: String::new(),
            },
            cloudflare: config::CloudflareConfig::default(),
            kv: config::KvConfig {
                backend: config::KvBackend::Memory,
                path: std::path::PathBuf::new(),
            },
            sync: config::SyncConfig {
                enabled: false,
                interval_seconds: 3600,
                refresh_threshold_days: 30,
                max_pages: 1,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };
        adjust(&mut config);

        let kv = Arc::new(MemoryKv::new());
        let bucket = Arc::new(MemoryStore::new());
        let state = AppState::from_parts(config, kv.clone(), bucket.clone()).unwrap();

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());

        let app = instagallery::build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            kv,
            bucket,
            mock,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Persist a token expiring `days` from now
    pub async fn store_token(&self, access_token: &str, days: i64) -> AccessToken {
        let token = AccessToken {
            access_token: access_token.to_string(),
            token_type: "bearer".to_string(),
            expires_at: Utc::now() + Duration::days(days),
        };
        self.kv
            .put(keys::ACCESS_TOKEN, &token.serialize().unwrap())
            .await
            .unwrap();
        token
    }

    pub async fn stored_token(&self) -> Option<AccessToken> {
        self.kv
            .get(keys::ACCESS_TOKEN)
            .await
            .unwrap()
            .map(|raw| AccessToken::deserialize(&raw).unwrap())
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }
}
