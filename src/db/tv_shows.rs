//! TV show database repository

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;

/// TV show record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TvShowRecord {
    pub id: i64,
    pub tmdb_id: i64,
    pub name: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub first_air_date: Option<chrono::NaiveDate>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub season_count: Option<i64>,
    pub episode_count: Option<i64>,
    /// Internal genre row ids, resolved at sync time
    pub genre_ids: Json<Vec<i64>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Input for upserting a TV show, keyed by `tmdb_id`
#[derive(Debug, Clone)]
pub struct UpsertTvShow {
    pub tmdb_id: i64,
    pub name: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub first_air_date: Option<chrono::NaiveDate>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub season_count: Option<i64>,
    pub episode_count: Option<i64>,
    pub genre_ids: Vec<i64>,
}

pub struct TvShowRepository {
    pool: SqlitePool,
}

impl TvShowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert a batch of TV shows in one transaction. Rows with a matching
    /// `tmdb_id` are fully replaced; absent keys are inserted. Returns the
    /// number of rows written.
    pub async fn upsert_many(&self, shows: &[UpsertTvShow]) -> Result<u64> {
        if shows.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for show in shows {
            sqlx::query(
                r#"
                INSERT INTO tv_shows (
                    tmdb_id, name, overview, poster_url, backdrop_url,
                    first_air_date, vote_average, vote_count, season_count,
                    episode_count, genre_ids, created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (tmdb_id) DO UPDATE SET
                    name = excluded.name,
                    overview = excluded.overview,
                    poster_url = excluded.poster_url,
                    backdrop_url = excluded.backdrop_url,
                    first_air_date = excluded.first_air_date,
                    vote_average = excluded.vote_average,
                    vote_count = excluded.vote_count,
                    season_count = excluded.season_count,
                    episode_count = excluded.episode_count,
                    genre_ids = excluded.genre_ids,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(show.tmdb_id)
            .bind(&show.name)
            .bind(&show.overview)
            .bind(&show.poster_url)
            .bind(&show.backdrop_url)
            .bind(show.first_air_date)
            .bind(show.vote_average)
            .bind(show.vote_count)
            .bind(show.season_count)
            .bind(show.episode_count)
            .bind(Json(&show.genre_ids))
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(shows.len() as u64)
    }

    /// Get a TV show by TMDB ID
    pub async fn get_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<TvShowRecord>> {
        let record = sqlx::query_as::<_, TvShowRecord>(
            r#"
            SELECT id, tmdb_id, name, overview, poster_url, backdrop_url,
                   first_air_date, vote_average, vote_count, season_count,
                   episode_count, genre_ids, created_at, updated_at
            FROM tv_shows
            WHERE tmdb_id = ?
            "#,
        )
        .bind(tmdb_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// List TV shows ordered by name (for the browse surface)
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<TvShowRecord>> {
        let records = sqlx::query_as::<_, TvShowRecord>(
            r#"
            SELECT id, tmdb_id, name, overview, poster_url, backdrop_url,
                   first_air_date, vote_average, vote_count, season_count,
                   episode_count, genre_ids, created_at, updated_at
            FROM tv_shows
            ORDER BY name
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Get total TV show count
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tv_shows")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
