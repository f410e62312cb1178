//! API layer
//!
//! HTTP handlers for:
//! - Gallery rendering
//! - Manual sync trigger
//! - Metrics (Prometheus)

mod gallery;
pub mod metrics;
mod update;

pub use gallery::gallery_router;
pub use metrics::metrics_router;
pub use update::update_router;
