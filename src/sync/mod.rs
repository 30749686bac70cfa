//! Catalog synchronization engine
//!
//! Drives one full pass over the provider's catalog: genres first (movies
//! and shows reference them), then movies, then TV shows. Each kind walks
//! every listing page, fetches full detail per summary record, normalizes,
//! resolves genre references, and hands the results to the batch upsert
//! engine. Partial failures (a bad page, a bad record, a rejected batch)
//! are logged and skipped; only a provider with no data at all or an
//! unreachable store aborts the run. Already-committed batches are never
//! rolled back, and re-running against unchanged upstream data is a no-op.

pub mod batch;
pub mod normalizer;
pub mod resolver;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::db::Database;
use crate::provider::{CatalogKind, CatalogProvider};

pub use batch::{BatchConfig, BatchReport};
pub use normalizer::{NormalizedMovie, NormalizedTvShow};
pub use resolver::{GenreResolver, Resolution};

use batch::upsert_in_batches;
use normalizer::{normalize_genre, normalize_movie, normalize_tv_show};

/// Sync engine configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub batch: BatchConfig,
    /// Base URL prefixed onto relative poster/backdrop paths
    pub image_base_url: String,
    /// Cap on listing pages fetched per kind (None = all pages)
    pub max_pages: Option<u32>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            image_base_url: "https://image.tmdb.org/t/p/original".to_string(),
            max_pages: None,
        }
    }
}

/// Phases of one orchestrator run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    FetchingGenres,
    FetchingMovies,
    FetchingTv,
    Completed,
    Aborted,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncPhase::Idle => "idle",
            SyncPhase::FetchingGenres => "fetching-genres",
            SyncPhase::FetchingMovies => "fetching-movies",
            SyncPhase::FetchingTv => "fetching-tv",
            SyncPhase::Completed => "completed",
            SyncPhase::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Completed,
    CompletedWithWarnings,
    Aborted,
}

/// Per-kind counters and warnings for one run
#[derive(Debug, Default, Clone)]
pub struct KindReport {
    /// Listing pages (or genre listings) successfully fetched
    pub pages_fetched: u32,
    /// Records seen in listings
    pub processed: usize,
    /// Records written to the store
    pub written: u64,
    /// Structurally unusable records dropped before upsert
    pub dropped: usize,
    /// Indices of failed upsert batches, numbered across the whole kind
    pub failed_batches: Vec<usize>,
    pub warnings: Vec<String>,
    batches_run: usize,
}

impl KindReport {
    /// Fold one batch pass into this report, renumbering batch indices so
    /// they stay unique across pages
    fn absorb(&mut self, report: BatchReport) {
        let offset = self.batches_run;
        self.written += report.written;
        self.batches_run += report.batches;
        self.failed_batches
            .extend(report.failed_batches.into_iter().map(|i| offset + i));
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty() || !self.failed_batches.is_empty() || self.dropped > 0
    }
}

/// Summary returned to the triggering caller. Partial failures surface here
/// as warnings, never as a hard error.
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub genres: KindReport,
    pub movies: KindReport,
    pub tv_shows: KindReport,
}

impl SyncSummary {
    pub fn total_written(&self) -> u64 {
        self.genres.written + self.movies.written + self.tv_shows.written
    }

    pub fn warning_count(&self) -> usize {
        self.genres.warnings.len() + self.movies.warnings.len() + self.tv_shows.warnings.len()
    }
}

/// Top-level sync driver. The provider, store, and batch engine are
/// constructor-injected so tests can substitute fakes.
pub struct SyncOrchestrator {
    provider: Arc<dyn CatalogProvider>,
    db: Database,
    config: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(provider: Arc<dyn CatalogProvider>, db: Database, config: SyncConfig) -> Self {
        Self {
            provider,
            db,
            config,
        }
    }

    fn transition(&self, phase: &mut SyncPhase, next: SyncPhase) {
        info!(from = %phase, to = %next, "Sync phase transition");
        *phase = next;
    }

    /// Run one complete pass: genres, then movies, then TV shows.
    ///
    /// Never returns a hard error - unrecoverable failures produce an
    /// `Aborted` summary with whatever progress was already committed.
    pub async fn run_full_sync(&self) -> SyncSummary {
        let started_at = Utc::now();
        let mut phase = SyncPhase::Idle;

        let mut genres = KindReport::default();
        let mut movies = KindReport::default();
        let mut tv_shows = KindReport::default();

        let abort_reason = 'run: {
            self.transition(&mut phase, SyncPhase::FetchingGenres);
            if let Err(e) = self.sync_genres(&mut genres).await {
                break 'run Some(e);
            }

            self.transition(&mut phase, SyncPhase::FetchingMovies);
            if let Err(e) = self.sync_movies(&mut movies).await {
                break 'run Some(e);
            }

            self.transition(&mut phase, SyncPhase::FetchingTv);
            if let Err(e) = self.sync_tv_shows(&mut tv_shows).await {
                break 'run Some(e);
            }

            None
        };

        let status = match abort_reason {
            Some(e) => {
                error!(error = %e, "Catalog sync aborted; committed batches are retained");
                self.transition(&mut phase, SyncPhase::Aborted);
                SyncStatus::Aborted
            }
            None => {
                self.transition(&mut phase, SyncPhase::Completed);
                if genres.has_warnings() || movies.has_warnings() || tv_shows.has_warnings() {
                    SyncStatus::CompletedWithWarnings
                } else {
                    SyncStatus::Completed
                }
            }
        };

        let summary = SyncSummary {
            status,
            started_at,
            finished_at: Utc::now(),
            genres,
            movies,
            tv_shows,
        };

        info!(
            status = ?summary.status,
            genres_written = summary.genres.written,
            movies_written = summary.movies.written,
            tv_shows_written = summary.tv_shows.written,
            warnings = summary.warning_count(),
            "Catalog sync finished"
        );

        summary
    }

    /// Sync genre listings for both kinds. Genres carry no references of
    /// their own, so no resolution step is needed here.
    async fn sync_genres(&self, report: &mut KindReport) -> Result<()> {
        let mut normalized = Vec::new();
        let mut fetched_any = false;

        for kind in [CatalogKind::Movie, CatalogKind::Tv] {
            match self.provider.genre_list(kind).await {
                Ok(list) => {
                    fetched_any = true;
                    report.pages_fetched += 1;
                    report.processed += list.len();
                    normalized.extend(list.into_iter().map(|g| normalize_genre(g, kind)));
                }
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Genre listing fetch failed");
                    report
                        .warnings
                        .push(format!("genre listing for {} failed: {}", kind, e));
                }
            }
        }

        if !fetched_any {
            anyhow::bail!("provider returned no genre data at all");
        }

        let batch_report = upsert_in_batches(normalized, &self.config.batch, |batch| {
            let repo = self.db.genres();
            async move { repo.upsert_many(&batch).await }
        })
        .await;

        // Content sync cannot resolve anything against an empty genre table;
        // every batch failing here means the store is not accepting writes.
        if batch_report.submitted > 0 && batch_report.written == 0 {
            anyhow::bail!("store rejected every genre batch");
        }

        report.absorb(batch_report);
        Ok(())
    }

    async fn sync_movies(&self, report: &mut KindReport) -> Result<()> {
        let resolver = GenreResolver::load(&self.db.genres(), CatalogKind::Movie)
            .await
            .context("loading movie genre lookup")?;

        let mut page: u32 = 1;
        let mut total_pages: u32 = 1;

        while page <= total_pages {
            if let Some(cap) = self.config.max_pages
                && page > cap
            {
                break;
            }

            let listing = match self.provider.fetch_movie_page(page).await {
                Ok(listing) => listing,
                Err(e) => {
                    warn!(page = page, error = %e, "Movie listing page fetch failed, skipping");
                    report
                        .warnings
                        .push(format!("movie page {} fetch failed: {}", page, e));
                    page += 1;
                    continue;
                }
            };

            total_pages = listing.total_pages.max(1) as u32;
            if listing.results.is_empty() {
                break;
            }
            report.pages_fetched += 1;

            // The listing is abbreviated; a full sync needs one detail fetch
            // per item. Sequential on purpose - same rate-limit concern as
            // the inter-batch delay.
            let mut normalized = Vec::new();
            for summary in listing.results {
                report.processed += 1;

                let Some(id) = summary.id else {
                    report.dropped += 1;
                    warn!(page = page, "Movie listing record without an id, dropping");
                    report
                        .warnings
                        .push("movie record without external id dropped".to_string());
                    continue;
                };

                match self.provider.movie_detail(id).await {
                    Ok(detail) => match normalize_movie(detail, &self.config.image_base_url) {
                        Some(n) => normalized.push(n),
                        None => {
                            report.dropped += 1;
                            warn!(tmdb_id = id, "Movie detail without an id, dropping");
                            report
                                .warnings
                                .push(format!("movie {} detail missing external id, dropped", id));
                        }
                    },
                    Err(e) => {
                        warn!(tmdb_id = id, error = %e, "Movie detail fetch failed, skipping");
                        report
                            .warnings
                            .push(format!("movie {} detail fetch failed: {}", id, e));
                    }
                }
            }

            let mut records = Vec::with_capacity(normalized.len());
            for mut n in normalized {
                let resolution = resolver.resolve(&n.genre_refs);
                for missing in &resolution.unresolved {
                    warn!(
                        tmdb_id = n.record.tmdb_id,
                        genre_tmdb_id = missing,
                        "Unknown genre reference, dropping it"
                    );
                    report.warnings.push(format!(
                        "movie {}: unknown genre reference {}",
                        n.record.tmdb_id, missing
                    ));
                }
                n.record.genre_ids = resolution.resolved;
                records.push(n.record);
            }

            let batch_report = upsert_in_batches(records, &self.config.batch, |batch| {
                let repo = self.db.movies();
                async move { repo.upsert_many(&batch).await }
            })
            .await;
            report.absorb(batch_report);

            page += 1;
        }

        Ok(())
    }

    async fn sync_tv_shows(&self, report: &mut KindReport) -> Result<()> {
        let resolver = GenreResolver::load(&self.db.genres(), CatalogKind::Tv)
            .await
            .context("loading tv genre lookup")?;

        let mut page: u32 = 1;
        let mut total_pages: u32 = 1;

        while page <= total_pages {
            if let Some(cap) = self.config.max_pages
                && page > cap
            {
                break;
            }

            let listing = match self.provider.fetch_tv_page(page).await {
                Ok(listing) => listing,
                Err(e) => {
                    warn!(page = page, error = %e, "TV listing page fetch failed, skipping");
                    report
                        .warnings
                        .push(format!("tv page {} fetch failed: {}", page, e));
                    page += 1;
                    continue;
                }
            };

            total_pages = listing.total_pages.max(1) as u32;
            if listing.results.is_empty() {
                break;
            }
            report.pages_fetched += 1;

            let mut normalized = Vec::new();
            for summary in listing.results {
                report.processed += 1;

                let Some(id) = summary.id else {
                    report.dropped += 1;
                    warn!(page = page, "TV listing record without an id, dropping");
                    report
                        .warnings
                        .push("tv record without external id dropped".to_string());
                    continue;
                };

                match self.provider.tv_detail(id).await {
                    Ok(detail) => match normalize_tv_show(detail, &self.config.image_base_url) {
                        Some(n) => normalized.push(n),
                        None => {
                            report.dropped += 1;
                            warn!(tmdb_id = id, "TV detail without an id, dropping");
                            report
                                .warnings
                                .push(format!("tv {} detail missing external id, dropped", id));
                        }
                    },
                    Err(e) => {
                        warn!(tmdb_id = id, error = %e, "TV detail fetch failed, skipping");
                        report
                            .warnings
                            .push(format!("tv {} detail fetch failed: {}", id, e));
                    }
                }
            }

            let mut records = Vec::with_capacity(normalized.len());
            for mut n in normalized {
                let resolution = resolver.resolve(&n.genre_refs);
                for missing in &resolution.unresolved {
                    warn!(
                        tmdb_id = n.record.tmdb_id,
                        genre_tmdb_id = missing,
                        "Unknown genre reference, dropping it"
                    );
                    report.warnings.push(format!(
                        "tv {}: unknown genre reference {}",
                        n.record.tmdb_id, missing
                    ));
                }
                n.record.genre_ids = resolution.resolved;
                records.push(n.record);
            }

            let batch_report = upsert_in_batches(records, &self.config.batch, |batch| {
                let repo = self.db.tv_shows();
                async move { repo.upsert_many(&batch).await }
            })
            .await;
            report.absorb(batch_report);

            page += 1;
        }

        Ok(())
    }
}
