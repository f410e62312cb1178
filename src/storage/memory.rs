//! In-memory stores
//!
//! Volatile and cleared on restart. Used for local runs and tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{KvStore, ObjectStore};
use crate::error::AppError;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
}

/// Object store backed by a sorted map
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type recorded for `key`
    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects.read().await.get(key)?.content_type.clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_keys(&self) -> Result<Vec<String>, AppError> {
        Ok(self.objects.read().await.keys().cloned().collect())
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, AppError> {
        Ok(self.objects.read().await.get(key).map(|o| o.data.clone()))
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), AppError> {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.map(ToOwned::to_owned),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}

/// Key/value store backed by a hash map
#[derive(Debug, Default)]
pub struct MemoryKv {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
