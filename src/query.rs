use std::fmt;

use serde::Serialize;

use crate::cache::CatalogCache;
use crate::catalog::CatalogClient;
use crate::domain::{Entry, GenerationId, SpeciesSet};
use crate::error::DexError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRequest {
    pub name: String,
    pub type_filter: Option<String>,
    pub generation: Option<GenerationId>,
}

impl QueryRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, type_filter: impl Into<String>) -> Self {
        self.type_filter = Some(type_filter.into());
        self
    }

    pub fn with_generation(mut self, generation: GenerationId) -> Self {
        self.generation = Some(generation);
        self
    }

    /// What the name predicate searches for.
    fn name_needle(&self) -> String {
        self.name.trim().to_lowercase()
    }

    /// What a lone match must equal to be promoted. Not trimmed: a query with
    /// stray whitespace still lists its match instead of jumping to it.
    fn exact_name(&self) -> String {
        self.name.to_lowercase()
    }

    fn type_tag(&self) -> Option<&str> {
        self.type_filter.as_deref().filter(|tag| !tag.is_empty())
    }

    /// No name, no type and no generation: such a request would match the
    /// whole catalog, so callers treat it as a no-op.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && self.type_tag().is_none() && self.generation.is_none()
    }
}

/// Lists the active filters, e.g. `name "pi", type electric, generation 1`.
impl fmt::Display for QueryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut filters = Vec::new();
        let name = self.name.trim();
        if !name.is_empty() {
            filters.push(format!("name {name:?}"));
        }
        if let Some(tag) = self.type_tag() {
            filters.push(format!("type {tag}"));
        }
        if let Some(generation) = self.generation {
            filters.push(format!("generation {generation}"));
        }
        if filters.is_empty() {
            return f.write_str("an empty query");
        }
        f.write_str(&filters.join(", "))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    pub matches: Vec<Entry>,
    pub promoted: Option<Entry>,
}

impl Resolution {
    /// Nothing matched a request that filtered on something.
    pub fn is_no_results(&self, request: &QueryRequest) -> bool {
        self.matches.is_empty() && self.promoted.is_none() && !request.is_blank()
    }
}

/// Filters `entries` by name substring, exact type tag and generation
/// membership, then promotes a lone exact-name match.
///
/// `species` is the resolved species set of `request.generation`; pass `None`
/// when the request has no generation filter.
pub fn filter_catalog(
    entries: &[Entry],
    request: &QueryRequest,
    species: Option<&SpeciesSet>,
) -> Resolution {
    let needle = request.name_needle();
    let type_tag = request.type_tag();

    let matches: Vec<Entry> = entries
        .iter()
        .filter(|entry| needle.is_empty() || entry.name.contains(&needle))
        .filter(|entry| type_tag.is_none_or(|tag| entry.has_type(tag)))
        .filter(|entry| species.is_none_or(|set| set.contains(&entry.name)))
        .cloned()
        .collect();

    if let [single] = matches.as_slice()
        && single.name == request.exact_name()
    {
        return Resolution {
            matches: Vec::new(),
            promoted: Some(single.clone()),
        };
    }

    Resolution {
        matches,
        promoted: None,
    }
}

/// Resolves `request` against the cached catalog.
///
/// A generation filter needs the full catalog already in memory and fails
/// with `CatalogNotReady` otherwise; name and type queries wait for the
/// catalog load instead.
pub async fn resolve<C: CatalogClient>(
    cache: &CatalogCache<C>,
    request: &QueryRequest,
) -> Result<Resolution, DexError> {
    let (entries, species) = match request.generation {
        Some(generation) => {
            let entries = cache.snapshot().ok_or(DexError::CatalogNotReady)?;
            let species = cache.generation_species(generation).await?;
            (entries, Some(species))
        }
        None => (cache.ensure_loaded().await?, None),
    };
    Ok(filter_catalog(&entries, request, species.as_deref()))
}
