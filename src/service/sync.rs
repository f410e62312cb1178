//! Gallery synchronization
//!
//! Reconciles the content store against the current Instagram feed:
//!
//! ```text
//! load token -> refresh if near expiry -> fetch media list
//!     -> delete orphans -> download missing objects -> write manifest
//! ```
//!
//! Deletes and downloads each run as one unbounded concurrent batch.
//! A failed item is logged and counted; the rest of the batch proceeds.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;

use crate::AppState;
use crate::error::AppError;
use crate::instagram::{AccessToken, GraphApi, InstagramAuth, MediaEntry};
use crate::metrics::{
    GALLERY_ENTRIES, MEDIA_DOWNLOADS_TOTAL, OBJECTS_DELETED_TOTAL, SYNC_RUNS_TOTAL,
    TOKEN_REFRESHES_TOTAL,
};
use crate::storage::{KvStore, ObjectStore, keys};

/// Summary of one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries written to the manifest
    pub entries: usize,
    /// Orphan objects deleted
    pub deleted: usize,
    /// Objects fetched and stored
    pub downloaded: usize,
    /// Objects already present or without a source URL
    pub skipped: usize,
    /// Failed deletes and downloads
    pub failed: usize,
    pub token_refreshed: bool,
}

/// What `download_object` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded,
    AlreadyPresent,
    NoSource,
}

/// Load the persisted access token, if any
pub async fn load_access_token(kv: &dyn KvStore) -> Result<Option<AccessToken>, AppError> {
    match kv.get(keys::ACCESS_TOKEN).await? {
        Some(raw) => AccessToken::deserialize(&raw).map(Some),
        None => Ok(None),
    }
}

/// Keys to delete given the stored keys and the new media list.
///
/// Everything except the manifest whose media id is not in `media`.
pub fn orphan_keys(existing: &[String], media: &[MediaEntry]) -> Vec<String> {
    let ids: HashSet<&str> = media.iter().map(|m| m.id.as_str()).collect();

    existing
        .iter()
        .filter(|key| key.as_str() != keys::MANIFEST)
        .filter(|key| !keys::media_id_of(key).is_some_and(|id| ids.contains(id)))
        .cloned()
        .collect()
}

/// Store the body of `url` under `key` unless the key already exists.
///
/// No request is made when the object is present or `url` is empty.
pub async fn download_object(
    bucket: &dyn ObjectStore,
    http: &reqwest::Client,
    key: &str,
    url: Option<&str>,
) -> Result<DownloadOutcome, AppError> {
    let Some(url) = url.filter(|u| !u.is_empty()) else {
        return Ok(DownloadOutcome::NoSource);
    };

    if bucket.exists(key).await? {
        return Ok(DownloadOutcome::AlreadyPresent);
    }

    let response = http.get(url).send().await?.error_for_status()?;
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);
    let data: Bytes = response.bytes().await?;

    tracing::debug!(key, size = data.len(), "Storing media object");
    bucket.put(key, data, content_type.as_deref()).await?;

    Ok(DownloadOutcome::Downloaded)
}

/// One gallery sync job
pub struct GallerySync {
    kv: Arc<dyn KvStore>,
    bucket: Arc<dyn ObjectStore>,
    http: reqwest::Client,
    auth: InstagramAuth,
    graph: GraphApi,
    refresh_threshold_days: i64,
    max_pages: usize,
}

impl GallerySync {
    pub fn new(state: &AppState) -> Self {
        let config = &state.config;

        Self {
            kv: state.kv.clone(),
            bucket: state.bucket.clone(),
            http: state.http_client.clone(),
            auth: InstagramAuth::new(state.http_client.clone(), &config.instagram),
            graph: GraphApi::new(state.http_client.clone(), &config.instagram.graph_base_url),
            refresh_threshold_days: config.sync.refresh_threshold_days,
            max_pages: config.sync.max_pages.max(1),
        }
    }

    /// Run the sync and record its outcome in metrics
    pub async fn run(&self) -> Result<SyncReport, AppError> {
        let result = self.reconcile().await;

        match &result {
            Ok(report) => {
                SYNC_RUNS_TOTAL.with_label_values(&["success"]).inc();
                GALLERY_ENTRIES.set(report.entries as i64);
                tracing::info!(
                    entries = report.entries,
                    deleted = report.deleted,
                    downloaded = report.downloaded,
                    skipped = report.skipped,
                    failed = report.failed,
                    token_refreshed = report.token_refreshed,
                    "Gallery sync completed"
                );
            }
            Err(error) => {
                SYNC_RUNS_TOTAL.with_label_values(&["failure"]).inc();
                tracing::error!(%error, "Gallery sync failed");
            }
        }

        result
    }

    async fn reconcile(&self) -> Result<SyncReport, AppError> {
        let mut report = SyncReport::default();

        // 1. Token
        let token = load_access_token(self.kv.as_ref())
            .await?
            .ok_or(AppError::NotAuthenticated)?;

        let outcome = self
            .auth
            .refresh_if_needed(token, self.refresh_threshold_days)
            .await?;
        if outcome.was_refreshed() {
            report.token_refreshed = true;
            TOKEN_REFRESHES_TOTAL.inc();
        }
        let token = outcome.into_token();
        if report.token_refreshed {
            self.kv.put(keys::ACCESS_TOKEN, &token.serialize()?).await?;
            tracing::info!(expires_at = %token.expires_at, "Persisted refreshed token");
        }

        // 2. Media list
        let media = self.graph.fetch_user_media(&token, self.max_pages).await?;

        // 3. Orphans
        let existing = self.bucket.list_keys().await?;
        let orphans = orphan_keys(&existing, &media);
        let deletions = join_all(orphans.iter().map(|key| async move {
            let result = self.bucket.delete(key).await;
            (key, result)
        }))
        .await;

        for (key, result) in deletions {
            match result {
                Ok(()) => {
                    report.deleted += 1;
                    OBJECTS_DELETED_TOTAL.inc();
                    tracing::debug!(key = %key, "Deleted orphan object");
                }
                Err(error) => {
                    report.failed += 1;
                    tracing::warn!(key = %key, %error, "Failed to delete orphan object");
                }
            }
        }

        // 4. Downloads
        let jobs: Vec<(String, Option<&str>)> = media
            .iter()
            .flat_map(|entry| {
                let thumbnail = entry
                    .thumbnail_object_key()
                    .map(|key| (key, entry.thumbnail_url()));
                std::iter::once((entry.media_object_key(), entry.media_url.as_deref()))
                    .chain(thumbnail)
            })
            .collect();

        let downloads = join_all(jobs.iter().map(|(key, url)| async move {
            let result = download_object(self.bucket.as_ref(), &self.http, key, *url).await;
            (key, result)
        }))
        .await;

        for (key, result) in downloads {
            match result {
                Ok(DownloadOutcome::Downloaded) => {
                    report.downloaded += 1;
                    MEDIA_DOWNLOADS_TOTAL.with_label_values(&["downloaded"]).inc();
                }
                Ok(DownloadOutcome::AlreadyPresent | DownloadOutcome::NoSource) => {
                    report.skipped += 1;
                    MEDIA_DOWNLOADS_TOTAL.with_label_values(&["skipped"]).inc();
                }
                Err(error) => {
                    report.failed += 1;
                    MEDIA_DOWNLOADS_TOTAL.with_label_values(&["failed"]).inc();
                    tracing::warn!(key = %key, %error, "Failed to download media object");
                }
            }
        }

        // 5. Manifest
        let manifest: Vec<_> = media.iter().map(MediaEntry::gallery_entry).collect();
        let body = serde_json::to_vec(&manifest)?;
        self.bucket
            .put(keys::MANIFEST, Bytes::from(body), Some("application/json"))
            .await?;
        report.entries = manifest.len();

        Ok(report)
    }
}
