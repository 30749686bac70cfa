//! Genre reference resolution
//!
//! Maps external genre ids embedded in provider records onto internal genre
//! row ids. The lookup table is loaded once per kind (one store query, not
//! one per record). Unknown references are reported back, never stored -
//! the caller logs them and writes the record without the dangling link.

use std::collections::HashMap;

use anyhow::Result;

use crate::db::GenreRepository;
use crate::provider::CatalogKind;

/// Outcome of resolving one record's genre references
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Internal genre row ids, in input order
    pub resolved: Vec<i64>,
    /// External ids with no matching genre row
    pub unresolved: Vec<i64>,
}

/// Lookup table from external genre ids to internal row ids for one kind
pub struct GenreResolver {
    by_tmdb_id: HashMap<i64, i64>,
}

impl GenreResolver {
    /// Build a resolver from an explicit mapping
    pub fn new(by_tmdb_id: HashMap<i64, i64>) -> Self {
        Self { by_tmdb_id }
    }

    /// Load the mapping for `kind` from the genre store
    pub async fn load(repo: &GenreRepository, kind: CatalogKind) -> Result<Self> {
        let by_tmdb_id = repo.map_by_tmdb_id(kind.as_str()).await?;
        Ok(Self { by_tmdb_id })
    }

    /// Partition external references into resolved internal ids and unknown
    /// external ids. Set membership, not an error path.
    pub fn resolve(&self, refs: &[i64]) -> Resolution {
        let mut resolution = Resolution::default();

        for &external in refs {
            match self.by_tmdb_id.get(&external) {
                Some(&internal) => resolution.resolved.push(internal),
                None => resolution.unresolved.push(external),
            }
        }

        resolution
    }
}
