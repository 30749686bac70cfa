//! Integration tests for the catalog sync engine
//!
//! These drive the full orchestrator against an in-memory SQLite store and
//! a scripted fake provider, verifying:
//! - idempotence of repeated full syncs
//! - genres-before-content ordering
//! - batch isolation when a record is structurally unusable
//! - unknown genre reference handling
//! - pagination termination
//! - transient failure tolerance (bad pages, bad details)

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use sqlx::sqlite::SqlitePoolOptions;

use cinedex::db::Database;
use cinedex::provider::{
    CatalogKind, CatalogProvider, ProviderError, ProviderPage, RawGenre, RawMovie, RawTvShow,
};
use cinedex::sync::{BatchConfig, SyncConfig, SyncOrchestrator, SyncStatus};

const IMAGE_BASE: &str = "https://img.test/t";

/// Scripted provider fake. Pages are indexed from 1; calls are logged so
/// tests can assert ordering and request counts.
#[derive(Default)]
struct FakeProvider {
    movie_genres: Vec<RawGenre>,
    tv_genres: Vec<RawGenre>,
    movie_pages: Vec<Vec<RawMovie>>,
    tv_pages: Vec<Vec<RawTvShow>>,
    movie_details: HashMap<i64, RawMovie>,
    tv_details: HashMap<i64, RawTvShow>,
    fail_genres: bool,
    fail_movie_pages: Vec<u32>,
    fail_movie_details: Vec<i64>,
    /// Override for the reported total_pages (defaults to page count)
    movie_total_pages: Option<i64>,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    fn log(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn movie_page_requests(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with("movie_page"))
            .count()
    }
}

#[async_trait]
impl CatalogProvider for FakeProvider {
    async fn genre_list(&self, kind: CatalogKind) -> Result<Vec<RawGenre>, ProviderError> {
        self.log(format!("genre_list:{}", kind));
        if self.fail_genres {
            return Err(ProviderError::Status(503));
        }
        Ok(match kind {
            CatalogKind::Movie => self.movie_genres.clone(),
            CatalogKind::Tv => self.tv_genres.clone(),
        })
    }

    async fn fetch_movie_page(&self, page: u32) -> Result<ProviderPage<RawMovie>, ProviderError> {
        self.log(format!("movie_page:{}", page));
        if self.fail_movie_pages.contains(&page) {
            return Err(ProviderError::Status(500));
        }
        let results = self
            .movie_pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default();
        Ok(ProviderPage {
            page: page as i64,
            total_pages: self
                .movie_total_pages
                .unwrap_or(self.movie_pages.len().max(1) as i64),
            results,
        })
    }

    async fn fetch_tv_page(&self, page: u32) -> Result<ProviderPage<RawTvShow>, ProviderError> {
        self.log(format!("tv_page:{}", page));
        let results = self
            .tv_pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default();
        Ok(ProviderPage {
            page: page as i64,
            total_pages: self.tv_pages.len().max(1) as i64,
            results,
        })
    }

    async fn movie_detail(&self, id: i64) -> Result<RawMovie, ProviderError> {
        self.log(format!("movie_detail:{}", id));
        if self.fail_movie_details.contains(&id) {
            return Err(ProviderError::Status(500));
        }
        Ok(self.movie_details.get(&id).cloned().unwrap_or(RawMovie {
            id: Some(id),
            title: Some(format!("Movie {}", id)),
            ..Default::default()
        }))
    }

    async fn tv_detail(&self, id: i64) -> Result<RawTvShow, ProviderError> {
        self.log(format!("tv_detail:{}", id));
        Ok(self.tv_details.get(&id).cloned().unwrap_or(RawTvShow {
            id: Some(id),
            name: Some(format!("Show {}", id)),
            ..Default::default()
        }))
    }
}

fn genre(id: i64, name: &str) -> RawGenre {
    RawGenre {
        id,
        name: name.to_string(),
    }
}

fn movie_summary(id: i64) -> RawMovie {
    RawMovie {
        id: Some(id),
        ..Default::default()
    }
}

fn tv_summary(id: i64) -> RawTvShow {
    RawTvShow {
        id: Some(id),
        ..Default::default()
    }
}

async fn test_db() -> Database {
    // One connection so the in-memory database is shared across queries
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    let db = Database::new(pool);
    db.init_schema().await.expect("schema init");
    db
}

fn orchestrator(provider: Arc<FakeProvider>, db: Database) -> SyncOrchestrator {
    orchestrator_with_batch(provider, db, 20)
}

fn orchestrator_with_batch(
    provider: Arc<FakeProvider>,
    db: Database,
    batch_size: usize,
) -> SyncOrchestrator {
    SyncOrchestrator::new(
        provider,
        db,
        SyncConfig {
            batch: BatchConfig {
                batch_size,
                inter_batch_delay: Duration::ZERO,
            },
            image_base_url: IMAGE_BASE.to_string(),
            max_pages: None,
        },
    )
}

/// A small but complete catalog: two movie genres, one TV genre, one page
/// of each kind.
fn small_catalog() -> FakeProvider {
    FakeProvider {
        movie_genres: vec![genre(28, "Action"), genre(12, "Adventure")],
        tv_genres: vec![genre(18, "Drama")],
        movie_pages: vec![vec![movie_summary(100), movie_summary(101)]],
        tv_pages: vec![vec![tv_summary(200)]],
        movie_details: HashMap::from([(
            100,
            RawMovie {
                id: Some(100),
                title: Some("Heat".to_string()),
                overview: Some("A heist thriller".to_string()),
                poster_path: Some("/heat.jpg".to_string()),
                release_date: Some("1995-12-15".to_string()),
                vote_average: Some(8.3),
                vote_count: Some(7000),
                runtime: Some(170),
                status: Some("Released".to_string()),
                genres: Some(vec![genre(28, "Action")]),
                ..Default::default()
            },
        )]),
        tv_details: HashMap::from([(
            200,
            RawTvShow {
                id: Some(200),
                name: Some("The Wire".to_string()),
                number_of_seasons: Some(5),
                number_of_episodes: Some(60),
                genre_ids: Some(vec![18]),
                ..Default::default()
            },
        )]),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_full_sync_writes_all_kinds() {
    let provider = Arc::new(small_catalog());
    let db = test_db().await;
    let summary = orchestrator(provider, db.clone()).run_full_sync().await;

    assert_eq!(summary.status, SyncStatus::Completed);
    assert_eq!(db.genres().count().await.unwrap(), 3);
    assert_eq!(db.movies().count().await.unwrap(), 2);
    assert_eq!(db.tv_shows().count().await.unwrap(), 1);

    let heat = db.movies().get_by_tmdb_id(100).await.unwrap().unwrap();
    assert_eq!(heat.title, "Heat");
    assert_eq!(heat.poster_url.as_deref(), Some("https://img.test/t/heat.jpg"));
    assert_eq!(heat.runtime, Some(170));
    assert_eq!(heat.genre_ids.0.len(), 1);

    let wire = db.tv_shows().get_by_tmdb_id(200).await.unwrap().unwrap();
    assert_eq!(wire.name, "The Wire");
    assert_eq!(wire.season_count, Some(5));
    assert_eq!(wire.genre_ids.0.len(), 1);
}

#[tokio::test]
async fn test_full_sync_is_idempotent() {
    let provider = Arc::new(small_catalog());
    let db = test_db().await;
    let engine = orchestrator(provider, db.clone());

    let first = engine.run_full_sync().await;
    let movie_after_first = db.movies().get_by_tmdb_id(100).await.unwrap().unwrap();

    let second = engine.run_full_sync().await;
    let movie_after_second = db.movies().get_by_tmdb_id(100).await.unwrap().unwrap();

    assert_eq!(first.status, SyncStatus::Completed);
    assert_eq!(second.status, SyncStatus::Completed);

    // Same record counts and, field for field, the same row after the
    // second run. updated_at is the one column the upsert rewrites on
    // every pass, so it is the only one excluded here.
    assert_eq!(db.genres().count().await.unwrap(), 3);
    assert_eq!(db.movies().count().await.unwrap(), 2);
    assert_eq!(db.tv_shows().count().await.unwrap(), 1);
    assert_eq!(movie_after_first.id, movie_after_second.id);
    assert_eq!(movie_after_first.tmdb_id, movie_after_second.tmdb_id);
    assert_eq!(movie_after_first.title, movie_after_second.title);
    assert_eq!(movie_after_first.overview, movie_after_second.overview);
    assert_eq!(movie_after_first.poster_url, movie_after_second.poster_url);
    assert_eq!(
        movie_after_first.backdrop_url,
        movie_after_second.backdrop_url
    );
    assert_eq!(
        movie_after_first.release_date,
        movie_after_second.release_date
    );
    assert_eq!(
        movie_after_first.vote_average,
        movie_after_second.vote_average
    );
    assert_eq!(movie_after_first.vote_count, movie_after_second.vote_count);
    assert_eq!(movie_after_first.runtime, movie_after_second.runtime);
    assert_eq!(movie_after_first.status, movie_after_second.status);
    assert_eq!(movie_after_first.genre_ids.0, movie_after_second.genre_ids.0);
    assert_eq!(movie_after_first.created_at, movie_after_second.created_at);
}

#[tokio::test]
async fn test_genres_sync_before_content() {
    let provider = Arc::new(small_catalog());
    let db = test_db().await;
    orchestrator(provider.clone(), db).run_full_sync().await;

    let calls = provider.calls();
    let last_genre_call = calls
        .iter()
        .rposition(|c| c.starts_with("genre_list"))
        .expect("genre calls present");
    let first_content_call = calls
        .iter()
        .position(|c| c.starts_with("movie_page") || c.starts_with("tv_page"))
        .expect("content calls present");

    assert!(
        last_genre_call < first_content_call,
        "genre sync must complete before content sync starts: {:?}",
        calls
    );
}

#[tokio::test]
async fn test_record_without_id_is_dropped_and_batch_continues() {
    // 20 summaries in one batch; detail #10 comes back without an id
    let mut provider = FakeProvider {
        movie_pages: vec![(1..=20).map(movie_summary).collect()],
        ..Default::default()
    };
    provider.movie_genres = vec![genre(28, "Action")];
    provider
        .movie_details
        .insert(10, RawMovie::default());

    let db = test_db().await;
    let summary = orchestrator_with_batch(Arc::new(provider), db.clone(), 20)
        .run_full_sync()
        .await;

    assert_eq!(db.movies().count().await.unwrap(), 19);
    assert!(db.movies().get_by_tmdb_id(10).await.unwrap().is_none());
    assert_eq!(summary.movies.dropped, 1);
    assert!(
        summary.movies.warnings.iter().any(|w| w.contains("10")),
        "warnings should name the dropped record: {:?}",
        summary.movies.warnings
    );
    assert_eq!(summary.status, SyncStatus::CompletedWithWarnings);
}

#[tokio::test]
async fn test_later_batches_run_after_a_dropped_record() {
    let mut provider = FakeProvider {
        movie_pages: vec![(1..=12).map(movie_summary).collect()],
        movie_genres: vec![genre(28, "Action")],
        ..Default::default()
    };
    provider.movie_details.insert(3, RawMovie::default());

    let db = test_db().await;
    // batch size 5 -> records spread over three batches
    let summary = orchestrator_with_batch(Arc::new(provider), db.clone(), 5)
        .run_full_sync()
        .await;

    assert_eq!(db.movies().count().await.unwrap(), 11);
    assert_eq!(summary.movies.written, 11);
    assert!(summary.movies.failed_batches.is_empty());
}

#[tokio::test]
async fn test_unknown_genre_reference_is_dropped_and_warned() {
    let mut provider = small_catalog();
    provider.movie_details.insert(
        100,
        RawMovie {
            id: Some(100),
            title: Some("Heat".to_string()),
            genre_ids: Some(vec![28, 9999]),
            ..Default::default()
        },
    );

    let db = test_db().await;
    let summary = orchestrator(Arc::new(provider), db.clone())
        .run_full_sync()
        .await;

    let genre_map = db.genres().map_by_tmdb_id("movie").await.unwrap();
    let action_internal_id = genre_map[&28];

    let heat = db.movies().get_by_tmdb_id(100).await.unwrap().unwrap();
    assert_eq!(heat.genre_ids.0, vec![action_internal_id]);
    assert!(
        summary.movies.warnings.iter().any(|w| w.contains("9999")),
        "warnings should name the unresolved reference: {:?}",
        summary.movies.warnings
    );
    assert_eq!(summary.status, SyncStatus::CompletedWithWarnings);
}

#[tokio::test]
async fn test_pagination_stops_at_total_pages() {
    let provider = Arc::new(FakeProvider {
        movie_genres: vec![genre(28, "Action")],
        movie_pages: vec![
            vec![movie_summary(1)],
            vec![movie_summary(2)],
            vec![movie_summary(3)],
        ],
        ..Default::default()
    });
    let db = test_db().await;
    orchestrator(provider.clone(), db.clone()).run_full_sync().await;

    assert_eq!(provider.movie_page_requests(), 3);
    assert_eq!(db.movies().count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_empty_page_terminates_pagination_early() {
    // Provider claims five pages but page 2 is empty
    let provider = Arc::new(FakeProvider {
        movie_genres: vec![genre(28, "Action")],
        movie_pages: vec![vec![movie_summary(1)], vec![]],
        movie_total_pages: Some(5),
        ..Default::default()
    });
    let db = test_db().await;
    orchestrator(provider.clone(), db.clone()).run_full_sync().await;

    assert_eq!(provider.movie_page_requests(), 2);
    assert_eq!(db.movies().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_failed_middle_page_is_skipped() {
    let provider = Arc::new(FakeProvider {
        movie_genres: vec![genre(28, "Action")],
        movie_pages: vec![
            vec![movie_summary(1)],
            vec![movie_summary(2)],
            vec![movie_summary(3)],
        ],
        fail_movie_pages: vec![2],
        ..Default::default()
    });
    let db = test_db().await;
    let summary = orchestrator(provider.clone(), db.clone())
        .run_full_sync()
        .await;

    assert_eq!(db.movies().count().await.unwrap(), 2);
    assert!(db.movies().get_by_tmdb_id(2).await.unwrap().is_none());
    assert_eq!(summary.status, SyncStatus::CompletedWithWarnings);
    assert!(summary.movies.warnings.iter().any(|w| w.contains("page 2")));
}

#[tokio::test]
async fn test_failed_first_movie_page_does_not_stop_tv_sync() {
    // The movie listing is down entirely, but genres and TV are fine.
    // The movie kind ends empty with a warning; TV still syncs.
    let provider = Arc::new(FakeProvider {
        movie_genres: vec![genre(28, "Action")],
        tv_genres: vec![genre(18, "Drama")],
        movie_pages: vec![vec![movie_summary(1)]],
        fail_movie_pages: vec![1],
        tv_pages: vec![vec![tv_summary(200)]],
        ..Default::default()
    });
    let db = test_db().await;
    let summary = orchestrator(provider.clone(), db.clone())
        .run_full_sync()
        .await;

    assert_eq!(summary.status, SyncStatus::CompletedWithWarnings);
    assert_eq!(db.movies().count().await.unwrap(), 0);
    assert!(summary.movies.warnings.iter().any(|w| w.contains("page 1")));
    assert!(
        provider.calls().iter().any(|c| c.starts_with("tv_page")),
        "tv sync must still run after the movie listing fails"
    );
    assert_eq!(db.tv_shows().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_failed_detail_fetch_skips_only_that_record() {
    let provider = Arc::new(FakeProvider {
        movie_genres: vec![genre(28, "Action")],
        movie_pages: vec![vec![movie_summary(1), movie_summary(2), movie_summary(3)]],
        fail_movie_details: vec![2],
        ..Default::default()
    });
    let db = test_db().await;
    let summary = orchestrator(provider, db.clone()).run_full_sync().await;

    assert_eq!(db.movies().count().await.unwrap(), 2);
    assert!(db.movies().get_by_tmdb_id(2).await.unwrap().is_none());
    assert_eq!(summary.status, SyncStatus::CompletedWithWarnings);
}

#[tokio::test]
async fn test_run_aborts_when_provider_has_no_genre_data() {
    let provider = Arc::new(FakeProvider {
        fail_genres: true,
        movie_pages: vec![vec![movie_summary(1)]],
        ..Default::default()
    });
    let db = test_db().await;
    let summary = orchestrator(provider.clone(), db.clone())
        .run_full_sync()
        .await;

    assert_eq!(summary.status, SyncStatus::Aborted);
    assert_eq!(db.movies().count().await.unwrap(), 0);
    // Content sync never started
    assert_eq!(provider.movie_page_requests(), 0);
}

#[tokio::test]
async fn test_image_paths_already_absolute_are_not_reprefixed() {
    let mut provider = small_catalog();
    provider.movie_details.insert(
        100,
        RawMovie {
            id: Some(100),
            title: Some("Heat".to_string()),
            poster_path: Some("https://img.test/t/heat.jpg".to_string()),
            ..Default::default()
        },
    );

    let db = test_db().await;
    orchestrator(Arc::new(provider), db.clone()).run_full_sync().await;

    let heat = db.movies().get_by_tmdb_id(100).await.unwrap().unwrap();
    assert_eq!(heat.poster_url.as_deref(), Some("https://img.test/t/heat.jpg"));
}
