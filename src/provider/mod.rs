//! External catalog provider interface
//!
//! The sync engine only talks to the provider through [`CatalogProvider`],
//! so tests can substitute a fake without touching the network.

pub mod tmdb;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use tmdb::TmdbClient;

/// Content kinds the provider serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Movie,
    Tv,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Movie => "movie",
            CatalogKind::Tv => "tv",
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the provider API
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Http(anyhow::Error),

    #[error("provider API key is invalid")]
    InvalidApiKey,

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("failed to decode provider response: {0}")]
    Decode(String),
}

/// Genre entry as returned by the provider, either embedded in a detail
/// record or from the genre-listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RawGenre {
    pub id: i64,
    pub name: String,
}

/// One page of listing results plus pagination metadata
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderPage<T> {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_total_pages")]
    pub total_pages: i64,
    #[serde(default)]
    pub results: Vec<T>,
}

fn default_total_pages() -> i64 {
    1
}

/// Raw movie record. Listing endpoints return an abbreviated form (bare
/// `genre_ids`, no runtime/status); the detail endpoint fills everything in.
/// All fields are optional so malformed payloads deserialize instead of
/// failing the page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMovie {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub runtime: Option<i64>,
    pub status: Option<String>,
    pub genres: Option<Vec<RawGenre>>,
    pub genre_ids: Option<Vec<i64>>,
}

/// Raw TV show record, same abbreviated/detail split as [`RawMovie`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTvShow {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub number_of_seasons: Option<i64>,
    pub number_of_episodes: Option<i64>,
    pub genres: Option<Vec<RawGenre>>,
    pub genre_ids: Option<Vec<i64>>,
}

/// Read-only client for the external catalog provider
///
/// Implementations return whatever the provider returns, including empty
/// pages. Page numbers start at 1. Transport-level retry lives inside the
/// implementation; skip-and-continue policy lives in the orchestrator.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch the full genre list for a kind (not paginated)
    async fn genre_list(&self, kind: CatalogKind) -> Result<Vec<RawGenre>, ProviderError>;

    /// Fetch one page of the movie listing
    async fn fetch_movie_page(&self, page: u32) -> Result<ProviderPage<RawMovie>, ProviderError>;

    /// Fetch one page of the TV listing
    async fn fetch_tv_page(&self, page: u32) -> Result<ProviderPage<RawTvShow>, ProviderError>;

    /// Fetch the full detail record for a movie
    async fn movie_detail(&self, id: i64) -> Result<RawMovie, ProviderError>;

    /// Fetch the full detail record for a TV show
    async fn tv_detail(&self, id: i64) -> Result<RawTvShow, ProviderError>;
}
