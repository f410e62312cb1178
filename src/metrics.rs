//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Sync Metrics
    pub static ref SYNC_RUNS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("instagallery_sync_runs_total", "Total number of gallery sync runs"),
        &["status"]
    ).expect("metric can be created");
    pub static ref MEDIA_DOWNLOADS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("instagallery_media_downloads_total", "Media objects processed by sync"),
        &["status"]
    ).expect("metric can be created");
    pub static ref OBJECTS_DELETED_TOTAL: IntCounter = IntCounter::new(
        "instagallery_objects_deleted_total",
        "Total number of orphan objects deleted"
    ).expect("metric can be created");
    pub static ref TOKEN_REFRESHES_TOTAL: IntCounter = IntCounter::new(
        "instagallery_token_refreshes_total",
        "Total number of access token refreshes"
    ).expect("metric can be created");
    pub static ref GALLERY_ENTRIES: IntGauge = IntGauge::new(
        "instagallery_gallery_entries",
        "Number of entries in the current manifest"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("instagallery_errors_total", "Total number of error responses"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_metrics() {
    static INIT: std::sync::Once = std::sync::Once::new();

    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(SYNC_RUNS_TOTAL.clone()))
            .expect("SYNC_RUNS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(MEDIA_DOWNLOADS_TOTAL.clone()))
            .expect("MEDIA_DOWNLOADS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(OBJECTS_DELETED_TOTAL.clone()))
            .expect("OBJECTS_DELETED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(TOKEN_REFRESHES_TOTAL.clone()))
            .expect("TOKEN_REFRESHES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(GALLERY_ENTRIES.clone()))
            .expect("GALLERY_ENTRIES can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}
