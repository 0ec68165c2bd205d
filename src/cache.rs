use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::CatalogClient;
use crate::domain::{Entry, GenerationId, NamedResource, ResourceKind, SpeciesSet, TypeTag};
use crate::error::DexError;
use crate::flight::SingleFlight;
use crate::index::{
    RegionMap, build_generation_species_set, build_region_map, filter_type_vocabulary,
};

pub const DEFAULT_FETCH_CONCURRENCY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Empty,
    Loading,
    Loaded,
}

/// Process-lifetime store for everything derived from the remote catalog.
///
/// The entry list moves `Empty -> Loading -> Loaded`, or back to `Empty` when
/// the load fails. Callers arriving during a load wait for that load and share
/// its outcome, failure included. Generation species sets, the region map and
/// the type vocabulary are memoized the same way and are never invalidated.
pub struct CatalogCache<C: CatalogClient> {
    client: C,
    fetch_concurrency: usize,
    entries: SingleFlight<Arc<[Entry]>>,
    generations: Mutex<HashMap<GenerationId, Arc<SingleFlight<Arc<SpeciesSet>>>>>,
    region_map: SingleFlight<Arc<RegionMap>>,
    types: SingleFlight<Arc<[TypeTag]>>,
}

impl<C: CatalogClient> CatalogCache<C> {
    pub fn new(client: C) -> Self {
        Self::with_concurrency(client, DEFAULT_FETCH_CONCURRENCY)
    }

    pub fn with_concurrency(client: C, fetch_concurrency: usize) -> Self {
        Self {
            client,
            fetch_concurrency: fetch_concurrency.max(1),
            entries: SingleFlight::new(),
            generations: Mutex::new(HashMap::new()),
            region_map: SingleFlight::new(),
            types: SingleFlight::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn state(&self) -> CacheState {
        if self.entries.is_ready() {
            CacheState::Loaded
        } else if self.entries.is_in_flight() {
            CacheState::Loading
        } else {
            CacheState::Empty
        }
    }

    /// The loaded entry list, or `None` while the cache is not `Loaded`.
    pub fn snapshot(&self) -> Option<Arc<[Entry]>> {
        self.entries.get()
    }

    pub async fn ensure_loaded(&self) -> Result<Arc<[Entry]>, DexError> {
        self.entries
            .get_or_load(move || async move {
                info!("catalog.load started");
                match self.load_entries().await {
                    Ok(entries) => {
                        info!(count = entries.len(), "catalog.load finished");
                        Ok(Arc::<[Entry]>::from(entries))
                    }
                    Err(err) => {
                        warn!(error = %err, "catalog.load failed");
                        Err(DexError::CatalogLoadFailed {
                            source: Box::new(err),
                        })
                    }
                }
            })
            .await
    }

    async fn load_entries(&self) -> Result<Vec<Entry>, DexError> {
        let listing = self.client.list_all(ResourceKind::Entry).await?;
        debug!(count = listing.len(), "catalog.listing");
        fetch_in_order(&listing, self.fetch_concurrency, |url| {
            self.client.fetch_entry(url)
        })
        .await
    }

    pub async fn generation_species(&self, id: GenerationId) -> Result<Arc<SpeciesSet>, DexError> {
        let flight = {
            let mut memo = self
                .generations
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            memo.entry(id)
                .or_insert_with(|| Arc::new(SingleFlight::new()))
                .clone()
        };
        flight
            .get_or_load(move || async move {
                debug!(generation = id.get(), "generation.fetch");
                let directory = self.client.fetch_generation(id).await.map_err(|err| {
                    warn!(generation = id.get(), error = %err, "generation.fetch failed");
                    DexError::GenerationLoadFailed {
                        gen_id: id.get(),
                        source: Box::new(err),
                    }
                })?;
                Ok::<_, DexError>(Arc::new(build_generation_species_set(&directory)))
            })
            .await
    }

    pub async fn region_map(&self) -> Result<Arc<RegionMap>, DexError> {
        self.region_map
            .get_or_load(move || async move {
                let listing = self.client.list_all(ResourceKind::RegionDirectory).await?;
                let directories = fetch_in_order(&listing, self.fetch_concurrency, |url| {
                    self.client.fetch_region_directory(url)
                })
                .await
                .inspect_err(|err| warn!(error = %err, "region_map.build failed"))?;
                let map = build_region_map(&directories);
                info!(
                    directories = directories.len(),
                    entries = map.len(),
                    "region_map.built"
                );
                Ok::<_, DexError>(Arc::new(map))
            })
            .await
    }

    pub async fn types(&self) -> Result<Arc<[TypeTag]>, DexError> {
        self.types
            .get_or_load(move || async move {
                let listing = self.client.list_all(ResourceKind::Type).await?;
                Ok::<_, DexError>(Arc::<[TypeTag]>::from(filter_type_vocabulary(
                    listing,
                )))
            })
            .await
    }
}

/// Fetches every listed resource with at most `concurrency` requests in
/// flight. The first failure to arrive ends the batch; results come back in
/// listing order.
async fn fetch_in_order<'a, T, F, Fut>(
    listing: &'a [NamedResource],
    concurrency: usize,
    fetch: F,
) -> Result<Vec<T>, DexError>
where
    F: Fn(&'a str) -> Fut,
    Fut: Future<Output = Result<T, DexError>>,
{
    let mut fetched: Vec<(usize, T)> = stream::iter(listing.iter().enumerate())
        .map(|(idx, item)| {
            let request = fetch(item.url.as_str());
            async move { request.await.map(|value| (idx, value)) }
        })
        .buffer_unordered(concurrency)
        .try_collect()
        .await?;
    // buffer_unordered yields in completion order
    fetched.sort_unstable_by_key(|(idx, _)| *idx);
    Ok(fetched.into_iter().map(|(_, value)| value).collect())
}
