//! TMDB (The Movie Database) API client
//!
//! Base URL: https://api.themoviedb.org/3
//!
//! Rate limiting: TMDB allows ~40 requests per 10 seconds. This client goes
//! through a rate-limited HTTP wrapper and retries transient failures with
//! exponential backoff.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::services::rate_limiter::{RateLimitedClient, RetryConfig, retry_async};

use super::{CatalogKind, CatalogProvider, ProviderError, ProviderPage, RawGenre, RawMovie, RawTvShow};

/// TMDB API client with rate limiting and retry logic
pub struct TmdbClient {
    client: RateLimitedClient,
    base_url: String,
    api_key: String,
    retry_config: RetryConfig,
}

#[derive(Debug, Deserialize)]
struct GenreListResponse {
    genres: Vec<RawGenre>,
}

impl TmdbClient {
    /// Create a new TMDB client with the given API key
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: RateLimitedClient::for_tmdb(),
            base_url,
            api_key,
            retry_config: RetryConfig::default(),
        }
    }

    /// GET a JSON endpoint with retry, mapping TMDB status codes onto the
    /// provider error taxonomy
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_query: &[(&str, String)],
        operation_name: &str,
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);

        retry_async(
            || async {
                let mut query: Vec<(&str, String)> = vec![("api_key", self.api_key.clone())];
                query.extend(extra_query.iter().cloned());

                let response = self
                    .client
                    .get_with_query(&url, &query)
                    .await
                    .map_err(ProviderError::Http)?;

                let status = response.status().as_u16();

                if status == 429 {
                    warn!(url = %url, "TMDB rate limit hit, will retry");
                    return Err(ProviderError::Status(status));
                }

                if status == 401 {
                    return Err(ProviderError::InvalidApiKey);
                }

                if !response.status().is_success() {
                    return Err(ProviderError::Status(status));
                }

                response
                    .json::<T>()
                    .await
                    .map_err(|e| ProviderError::Decode(e.to_string()))
            },
            &self.retry_config,
            operation_name,
        )
        .await
    }
}

#[async_trait]
impl CatalogProvider for TmdbClient {
    async fn genre_list(&self, kind: CatalogKind) -> Result<Vec<RawGenre>, ProviderError> {
        debug!(kind = %kind, "Fetching TMDB genre list");

        let response: GenreListResponse = self
            .get_json(
                &format!("/genre/{}/list", kind.as_str()),
                &[],
                "tmdb_genre_list",
            )
            .await?;

        Ok(response.genres)
    }

    async fn fetch_movie_page(&self, page: u32) -> Result<ProviderPage<RawMovie>, ProviderError> {
        debug_assert!(page >= 1, "provider pages are 1-based");
        debug!(page = page, "Fetching TMDB movie listing page");

        self.get_json(
            "/discover/movie",
            &[("page", page.to_string())],
            "tmdb_movie_page",
        )
        .await
    }

    async fn fetch_tv_page(&self, page: u32) -> Result<ProviderPage<RawTvShow>, ProviderError> {
        debug_assert!(page >= 1, "provider pages are 1-based");
        debug!(page = page, "Fetching TMDB TV listing page");

        self.get_json(
            "/discover/tv",
            &[("page", page.to_string())],
            "tmdb_tv_page",
        )
        .await
    }

    async fn movie_detail(&self, id: i64) -> Result<RawMovie, ProviderError> {
        debug!(tmdb_id = id, "Fetching TMDB movie details");

        self.get_json(&format!("/movie/{}", id), &[], "tmdb_movie_detail")
            .await
    }

    async fn tv_detail(&self, id: i64) -> Result<RawTvShow, ProviderError> {
        debug!(tmdb_id = id, "Fetching TMDB TV details");

        self.get_json(&format!("/tv/{}", id), &[], "tmdb_tv_detail")
            .await
    }
}
