//! Record normalization
//!
//! Pure conversion from raw provider payloads into store shapes. Nothing
//! here does I/O and nothing here fails: malformed optional fields are
//! defaulted, and only records with no external id are rejected (the caller
//! counts and logs those). Transient provider fields such as popularity or
//! embedded cast payloads are discarded - enrichment is a separate concern.

use chrono::NaiveDate;
use url::Url;

use crate::db::{UpsertGenre, UpsertMovie, UpsertTvShow};
use crate::provider::{CatalogKind, RawGenre, RawMovie, RawTvShow};

/// A movie ready for upsert, plus the external genre references that still
/// need resolving against the local genre table
#[derive(Debug, Clone)]
pub struct NormalizedMovie {
    pub record: UpsertMovie,
    pub genre_refs: Vec<i64>,
}

/// A TV show ready for upsert, plus unresolved external genre references
#[derive(Debug, Clone)]
pub struct NormalizedTvShow {
    pub record: UpsertTvShow,
    pub genre_refs: Vec<i64>,
}

/// Prefix a relative image path with the image base URL. Already-absolute
/// paths pass through untouched, so applying this twice is a no-op.
pub fn absolute_image_url(base: &str, path: &str) -> String {
    if Url::parse(path).is_ok() {
        return path.to_string();
    }

    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn image_url(base: &str, path: Option<String>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| absolute_image_url(base, &p))
}

fn parse_date(value: Option<String>) -> Option<NaiveDate> {
    value
        .filter(|v| !v.is_empty())
        .and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok())
}

/// Extract external genre references from either form the provider uses:
/// embedded genre objects (detail records) or bare ids (listing records)
fn genre_refs(genres: Option<Vec<RawGenre>>, genre_ids: Option<Vec<i64>>) -> Vec<i64> {
    if let Some(genres) = genres {
        return genres.into_iter().map(|g| g.id).collect();
    }

    genre_ids.unwrap_or_default()
}

/// Convert a provider genre into the store shape for one category kind
pub fn normalize_genre(raw: RawGenre, kind: CatalogKind) -> UpsertGenre {
    UpsertGenre {
        tmdb_id: raw.id,
        name: raw.name,
        kind: kind.as_str().to_string(),
    }
}

/// Convert a raw movie into the store shape. Returns `None` only when the
/// record has no external id and is therefore structurally unusable.
pub fn normalize_movie(raw: RawMovie, image_base: &str) -> Option<NormalizedMovie> {
    let tmdb_id = raw.id?;

    Some(NormalizedMovie {
        record: UpsertMovie {
            tmdb_id,
            title: raw.title.unwrap_or_default(),
            overview: raw.overview.unwrap_or_default(),
            poster_url: image_url(image_base, raw.poster_path),
            backdrop_url: image_url(image_base, raw.backdrop_path),
            release_date: parse_date(raw.release_date),
            vote_average: raw.vote_average.unwrap_or(0.0),
            vote_count: raw.vote_count.unwrap_or(0),
            runtime: raw.runtime,
            status: raw.status,
            genre_ids: Vec::new(),
        },
        genre_refs: genre_refs(raw.genres, raw.genre_ids),
    })
}

/// Convert a raw TV show into the store shape. Returns `None` only when the
/// record has no external id.
pub fn normalize_tv_show(raw: RawTvShow, image_base: &str) -> Option<NormalizedTvShow> {
    let tmdb_id = raw.id?;

    Some(NormalizedTvShow {
        record: UpsertTvShow {
            tmdb_id,
            name: raw.name.unwrap_or_default(),
            overview: raw.overview.unwrap_or_default(),
            poster_url: image_url(image_base, raw.poster_path),
            backdrop_url: image_url(image_base, raw.backdrop_path),
            first_air_date: parse_date(raw.first_air_date),
            vote_average: raw.vote_average.unwrap_or(0.0),
            vote_count: raw.vote_count.unwrap_or(0),
            season_count: raw.number_of_seasons,
            episode_count: raw.number_of_episodes,
            genre_ids: Vec::new(),
        },
        genre_refs: genre_refs(raw.genres, raw.genre_ids),
    })
}
