//! Movie database repository

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;

/// Movie record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MovieRecord {
    pub id: i64,
    pub tmdb_id: i64,
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub release_date: Option<chrono::NaiveDate>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub runtime: Option<i64>,
    pub status: Option<String>,
    /// Internal genre row ids, resolved at sync time
    pub genre_ids: Json<Vec<i64>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Input for upserting a movie, keyed by `tmdb_id`
#[derive(Debug, Clone)]
pub struct UpsertMovie {
    pub tmdb_id: i64,
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub release_date: Option<chrono::NaiveDate>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub runtime: Option<i64>,
    pub status: Option<String>,
    pub genre_ids: Vec<i64>,
}

pub struct MovieRepository {
    pool: SqlitePool,
}

impl MovieRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert a batch of movies in one transaction. Rows with a matching
    /// `tmdb_id` are fully replaced (field-for-field); absent keys are
    /// inserted. Returns the number of rows written.
    pub async fn upsert_many(&self, movies: &[UpsertMovie]) -> Result<u64> {
        if movies.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for movie in movies {
            sqlx::query(
                r#"
                INSERT INTO movies (
                    tmdb_id, title, overview, poster_url, backdrop_url,
                    release_date, vote_average, vote_count, runtime, status,
                    genre_ids, created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (tmdb_id) DO UPDATE SET
                    title = excluded.title,
                    overview = excluded.overview,
                    poster_url = excluded.poster_url,
                    backdrop_url = excluded.backdrop_url,
                    release_date = excluded.release_date,
                    vote_average = excluded.vote_average,
                    vote_count = excluded.vote_count,
                    runtime = excluded.runtime,
                    status = excluded.status,
                    genre_ids = excluded.genre_ids,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(movie.tmdb_id)
            .bind(&movie.title)
            .bind(&movie.overview)
            .bind(&movie.poster_url)
            .bind(&movie.backdrop_url)
            .bind(movie.release_date)
            .bind(movie.vote_average)
            .bind(movie.vote_count)
            .bind(movie.runtime)
            .bind(&movie.status)
            .bind(Json(&movie.genre_ids))
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(movies.len() as u64)
    }

    /// Get a movie by TMDB ID
    pub async fn get_by_tmdb_id(&self, tmdb_id: i64) -> Result<Option<MovieRecord>> {
        let record = sqlx::query_as::<_, MovieRecord>(
            r#"
            SELECT id, tmdb_id, title, overview, poster_url, backdrop_url,
                   release_date, vote_average, vote_count, runtime, status,
                   genre_ids, created_at, updated_at
            FROM movies
            WHERE tmdb_id = ?
            "#,
        )
        .bind(tmdb_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// List movies ordered by title (for the browse surface)
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<MovieRecord>> {
        let records = sqlx::query_as::<_, MovieRecord>(
            r#"
            SELECT id, tmdb_id, title, overview, poster_url, backdrop_url,
                   release_date, vote_average, vote_count, runtime, status,
                   genre_ids, created_at, updated_at
            FROM movies
            ORDER BY title
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Get total movie count
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
