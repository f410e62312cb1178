//! Instagram authentication endpoints
//!
//! Handles:
//! - Setup page
//! - OAuth start and callback
//! - Configuration-key middleware

mod middleware;
mod oauth;

pub use middleware::require_config_key;
pub use oauth::{auth_router, is_authenticated};
