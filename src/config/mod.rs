//! Application configuration management

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path
    pub database_path: String,

    /// TMDB API key (required - the sync engine cannot start without it)
    pub tmdb_api_key: String,

    /// TMDB API base URL
    pub tmdb_base_url: String,

    /// Base URL prefixed onto relative poster/backdrop paths
    pub image_base_url: String,

    /// Records per upsert batch
    pub sync_batch_size: usize,

    /// Cooldown between upsert batches
    pub sync_batch_delay: Duration,

    /// Cap on listing pages fetched per kind (None = all pages)
    pub sync_max_pages: Option<u32>,

    /// Run a full sync immediately on startup
    pub sync_on_startup: bool,

    /// Cron schedule for recurring syncs
    pub sync_schedule: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let tmdb_api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY is required")?;

        Ok(Self {
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./data/cinedex.db".to_string()),

            tmdb_api_key,

            tmdb_base_url: env::var("TMDB_BASE_URL")
                .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string()),

            image_base_url: env::var("IMAGE_BASE_URL")
                .unwrap_or_else(|_| "https://image.tmdb.org/t/p/original".to_string()),

            sync_batch_size: env::var("SYNC_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),

            sync_batch_delay: Duration::from_millis(
                env::var("SYNC_BATCH_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
            ),

            sync_max_pages: env::var("SYNC_MAX_PAGES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0),

            sync_on_startup: env::var("SYNC_ON_STARTUP")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),

            sync_schedule: env::var("SYNC_SCHEDULE")
                .unwrap_or_else(|_| "0 0 3 * * *".to_string()),
        })
    }
}
