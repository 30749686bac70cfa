//! Cinedex - catalog service syncing movie/TV metadata into a local library
//!
//! The core is the sync engine in [`sync`]: it pulls paginated collections
//! (genres, movies, TV shows) from the provider in [`provider`], reconciles
//! genre references, and writes the results into the SQLite store in [`db`]
//! with idempotent, batched, rate-limited upserts.

pub mod config;
pub mod db;
pub mod jobs;
pub mod provider;
pub mod services;
pub mod sync;
