use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheState, CatalogCache};
use crate::catalog::CatalogClient;
use crate::classifier::{Classifier, ImagePayload};
use crate::describe::{description_of, normalize};
use crate::domain::{Entry, NamedResource, ResourceKind, TypeTag};
use crate::error::DexError;
use crate::index::RegionMap;
use crate::query::{self, QueryRequest, Resolution};
use crate::reconcile::reconcile;

#[derive(Debug, Clone, Serialize)]
pub struct Identification {
    pub label: String,
    pub entry: Option<Entry>,
}

/// An entry with everything the detail view shows next to it.
#[derive(Debug, Clone, Serialize)]
pub struct EntryCard {
    pub entry: Entry,
    pub regions: Vec<String>,
    pub description: String,
}

/// The engine's public surface. Owns the catalog cache; every cached
/// structure is handed out read-only.
pub struct App<C: CatalogClient, K: Classifier> {
    cache: CatalogCache<C>,
    classifier: K,
}

impl<C: CatalogClient, K: Classifier> App<C, K> {
    pub fn new(client: C, classifier: K) -> Self {
        Self::with_cache(CatalogCache::new(client), classifier)
    }

    pub fn with_cache(cache: CatalogCache<C>, classifier: K) -> Self {
        Self { cache, classifier }
    }

    pub fn cache(&self) -> &CatalogCache<C> {
        &self.cache
    }

    pub fn catalog_state(&self) -> CacheState {
        self.cache.state()
    }

    pub async fn ensure_loaded(&self) -> Result<Arc<[Entry]>, DexError> {
        self.cache.ensure_loaded().await
    }

    pub async fn resolve(&self, request: &QueryRequest) -> Result<Resolution, DexError> {
        query::resolve(&self.cache, request).await
    }

    pub async fn region_map(&self) -> Result<Arc<RegionMap>, DexError> {
        self.cache.region_map().await
    }

    pub async fn types(&self) -> Result<Arc<[TypeTag]>, DexError> {
        self.cache.types().await
    }

    pub async fn generations(&self) -> Result<Vec<NamedResource>, DexError> {
        self.cache.client().list_all(ResourceKind::Generation).await
    }

    /// Reconciles a classifier label against whatever is loaded right now.
    pub fn reconcile(&self, label: &str) -> Option<Entry> {
        let entries = self.cache.snapshot()?;
        reconcile(label, &entries).cloned()
    }

    /// Classifies `image` and reconciles the label. Does not start a catalog
    /// load: with nothing loaded the entry is always `None`.
    pub async fn identify(&self, image: &ImagePayload) -> Result<Identification, DexError> {
        let label = self.classifier.classify(image).await?;
        let entry = self.reconcile(&label);
        Ok(Identification { label, entry })
    }

    /// Runs the catalog load and the classification side by side, then
    /// reconciles. Either failure fails the whole call.
    pub async fn load_and_identify(
        &self,
        image: &ImagePayload,
    ) -> Result<Identification, DexError> {
        let (entries, label) = futures::try_join!(
            self.cache.ensure_loaded(),
            self.classifier.classify(image)
        )?;
        let entry = reconcile(&label, &entries).cloned();
        Ok(Identification { label, entry })
    }

    pub async fn describe(&self, name: &str) -> Result<String, DexError> {
        let species = self.cache.client().fetch_species(name).await?;
        Ok(description_of(&species))
    }

    pub fn normalize(raw: &str) -> String {
        normalize(raw)
    }

    /// Regions and description are keyed by the entry's species, so alternate
    /// forms share them with their base entry.
    pub async fn card(&self, entry: Entry) -> Result<EntryCard, DexError> {
        let (regions, description) =
            futures::try_join!(self.region_map(), self.describe(&entry.species))?;
        Ok(EntryCard {
            regions: regions.regions_for(&entry.species).to_vec(),
            description,
            entry,
        })
    }
}
