//! Catalog schema bootstrap
//!
//! Idempotent `CREATE TABLE IF NOT EXISTS` statements run at startup.
//! Column renames or type changes are not handled.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::debug;

const CREATE_GENRES: &str = r#"
CREATE TABLE IF NOT EXISTS genres (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    tmdb_id     INTEGER NOT NULL,
    name        TEXT NOT NULL,
    kind        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (tmdb_id, kind)
)
"#;

const CREATE_MOVIES: &str = r#"
CREATE TABLE IF NOT EXISTS movies (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    tmdb_id       INTEGER NOT NULL UNIQUE,
    title         TEXT NOT NULL,
    overview      TEXT NOT NULL DEFAULT '',
    poster_url    TEXT,
    backdrop_url  TEXT,
    release_date  TEXT,
    vote_average  REAL NOT NULL DEFAULT 0,
    vote_count    INTEGER NOT NULL DEFAULT 0,
    runtime       INTEGER,
    status        TEXT,
    genre_ids     TEXT NOT NULL DEFAULT '[]',
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
)
"#;

const CREATE_TV_SHOWS: &str = r#"
CREATE TABLE IF NOT EXISTS tv_shows (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    tmdb_id        INTEGER NOT NULL UNIQUE,
    name           TEXT NOT NULL,
    overview       TEXT NOT NULL DEFAULT '',
    poster_url     TEXT,
    backdrop_url   TEXT,
    first_air_date TEXT,
    vote_average   REAL NOT NULL DEFAULT 0,
    vote_count     INTEGER NOT NULL DEFAULT 0,
    season_count   INTEGER,
    episode_count  INTEGER,
    genre_ids      TEXT NOT NULL DEFAULT '[]',
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
)
"#;

/// Create the catalog tables
pub async fn init(pool: &SqlitePool) -> Result<()> {
    for (table, sql) in [
        ("genres", CREATE_GENRES),
        ("movies", CREATE_MOVIES),
        ("tv_shows", CREATE_TV_SHOWS),
    ] {
        debug!(table = table, "Ensuring table exists");
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}
