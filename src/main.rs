//! InstaGallery binary entry point

use instagallery::{AppState, config, service::GallerySync};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Initialize tracing/logging
/// 2. Load configuration from file and environment
/// 3. Initialize AppState
/// 4. Build Axum router
/// 5. Start background sync task
/// 6. Start HTTP server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize tracing/logging
    let log_format =
        std::env::var("INSTAGALLERY__LOGGING__FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "instagallery=info,tower_http=debug".into())
    };

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter())
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter())
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting InstaGallery...");

    // 2. Initialize metrics
    instagallery::metrics::init_metrics();

    // 3. Load configuration
    let config = config::AppConfig::load()?;
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    // 4. Initialize application state
    let state = AppState::new(config.clone()).await?;

    // 5. Build Axum router
    let app = instagallery::build_router(state.clone());

    // 6. Start background tasks
    if config.sync.enabled {
        spawn_sync_task(state.clone());
    }

    // 7. Start HTTP server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Spawn background gallery sync task
fn spawn_sync_task(state: AppState) {
    tokio::spawn(async move {
        let configured_interval_secs = state.config.sync.interval_seconds;
        let interval_secs = configured_interval_secs.max(1);
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));

        if configured_interval_secs == 0 {
            tracing::warn!("sync.interval_seconds=0 is invalid; clamped to 1 second");
        }

        let sync = GallerySync::new(&state);

        loop {
            interval.tick().await;

            tracing::info!("Running scheduled gallery sync...");
            // Outcome is logged and counted inside run()
            if let Err(instagallery::error::AppError::NotAuthenticated) = sync.run().await {
                tracing::info!("No access token stored yet; visit / to authenticate");
            }
        }
    });

    tracing::info!("Gallery sync task spawned");
}
