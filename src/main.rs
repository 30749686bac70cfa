//! Cinedex backend - catalog sync service entry point
//!
//! Loads configuration, prepares the SQLite store, runs a full catalog sync
//! on startup (unless disabled), and keeps a scheduler running for
//! recurring syncs.

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinedex::config::Config;
use cinedex::db::Database;
use cinedex::jobs;
use cinedex::provider::{CatalogProvider, TmdbClient};
use cinedex::sync::{BatchConfig, SyncConfig, SyncOrchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinedex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cinedex");

    if let Some(parent) = Path::new(&config.database_path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::connect(&config.database_path).await?;
    db.init_schema().await?;
    tracing::info!("Database ready");

    let provider: Arc<dyn CatalogProvider> = Arc::new(TmdbClient::new(
        config.tmdb_api_key.clone(),
        config.tmdb_base_url.clone(),
    ));

    let sync_config = SyncConfig {
        batch: BatchConfig {
            batch_size: config.sync_batch_size,
            inter_batch_delay: config.sync_batch_delay,
        },
        image_base_url: config.image_base_url.clone(),
        max_pages: config.sync_max_pages,
    };
    let orchestrator = Arc::new(SyncOrchestrator::new(provider, db.clone(), sync_config));

    if config.sync_on_startup {
        tracing::info!("Running startup catalog sync");
        jobs::catalog_sync::run_sync(orchestrator.clone()).await;
    }

    let _scheduler = jobs::start_scheduler(orchestrator, &config.sync_schedule).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}
