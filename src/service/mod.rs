//! Service layer
//!
//! Business logic shared by the HTTP handlers and the scheduler.

pub mod sync;

pub use sync::{DownloadOutcome, GallerySync, SyncReport, load_access_token, orphan_keys};
