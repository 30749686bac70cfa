//! Genre database repository
//!
//! Genres are written only by catalog sync and never deleted by it; the
//! external id is unique within a category kind.

use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

/// Genre record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GenreRecord {
    pub id: i64,
    pub tmdb_id: i64,
    pub name: String,
    /// Category kind: "movie" or "tv"
    pub kind: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Input for upserting a genre
#[derive(Debug, Clone)]
pub struct UpsertGenre {
    pub tmdb_id: i64,
    pub name: String,
    pub kind: String,
}

pub struct GenreRepository {
    pool: SqlitePool,
}

impl GenreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert a batch of genres keyed by (tmdb_id, kind) in one transaction.
    /// Existing rows are fully replaced; returns the number of rows written.
    pub async fn upsert_many(&self, genres: &[UpsertGenre]) -> Result<u64> {
        if genres.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for genre in genres {
            sqlx::query(
                r#"
                INSERT INTO genres (tmdb_id, name, kind, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT (tmdb_id, kind) DO UPDATE SET
                    name = excluded.name,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(genre.tmdb_id)
            .bind(&genre.name)
            .bind(&genre.kind)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(genres.len() as u64)
    }

    /// List all genres for a category kind
    pub async fn list_by_kind(&self, kind: &str) -> Result<Vec<GenreRecord>> {
        let records = sqlx::query_as::<_, GenreRecord>(
            r#"
            SELECT id, tmdb_id, name, kind, created_at, updated_at
            FROM genres
            WHERE kind = ?
            ORDER BY name
            "#,
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Map external genre ids to internal row ids for one kind, in a single
    /// query. This is the lookup table the reference resolver runs against.
    pub async fn map_by_tmdb_id(&self, kind: &str) -> Result<HashMap<i64, i64>> {
        let rows: Vec<(i64, i64)> =
            sqlx::query_as("SELECT tmdb_id, id FROM genres WHERE kind = ?")
                .bind(kind)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().collect())
    }

    /// Get total genre count
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
