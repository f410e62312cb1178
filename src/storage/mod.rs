//! Storage layer
//!
//! Handles:
//! - Object storage for media and the gallery manifest (Cloudflare R2)
//! - Key/value state for tokens and the OAuth state (SQLite)

mod kv;
mod memory;
mod r2;

pub use kv::SqliteKv;
pub use memory::{MemoryKv, MemoryStore};
pub use r2::R2Store;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::AppError;

/// Fixed key names
pub mod keys {
    /// KV: serialized long-lived access token
    pub const ACCESS_TOKEN: &str = "instagram-access-token";
    /// KV: Instagram user id of the authenticated account
    pub const USER_ID: &str = "instagram-user-id";
    /// KV: pending OAuth state
    pub const AUTH_STATE: &str = "auth-state";
    /// Object: gallery manifest
    pub const MANIFEST: &str = "gallery.json";

    pub fn media_object(id: &str) -> String {
        format!("media-{id}")
    }

    pub fn thumbnail_object(id: &str) -> String {
        format!("thumb-{id}")
    }

    /// Media id an object key refers to (text after the first `-`)
    pub fn media_id_of(key: &str) -> Option<&str> {
        key.split_once('-').map(|(_, id)| id)
    }
}

/// Blob store holding media objects and the manifest.
///
/// This trait is object-safe and can be used with `Arc<dyn ObjectStore>`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// All object keys in the store
    async fn list_keys(&self) -> Result<Vec<String>, AppError>;

    /// Whether `key` is present, without fetching its body
    async fn exists(&self, key: &str) -> Result<bool, AppError>;

    async fn get(&self, key: &str) -> Result<Option<Bytes>, AppError>;

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), AppError>;

    /// Delete `key`; deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// String key/value store for small pieces of state
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn put(&self, key: &str, value: &str) -> Result<(), AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;
}
