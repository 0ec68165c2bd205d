#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use pokedex_finder::catalog::CatalogClient;
use pokedex_finder::classifier::{Classifier, ImagePayload};
use pokedex_finder::domain::{
    DirectoryEntry, Entry, FlavorText, GenerationDirectory, GenerationId, NamedResource,
    RegionDirectory, ResourceKind, SpeciesDetail, Sprites, TypeTag,
};
use pokedex_finder::error::DexError;

pub fn entry(id: u32, name: &str, types: &[&str]) -> Entry {
    Entry {
        id,
        name: name.to_string(),
        species: name.to_string(),
        types: types.iter().map(|t| TypeTag::new(*t)).collect(),
        abilities: Vec::new(),
        stats: Vec::new(),
        sprites: Sprites::default(),
        height: 4,
        weight: 60,
    }
}

pub fn named(kind: &str, name: &str) -> NamedResource {
    NamedResource {
        name: name.to_string(),
        url: format!("mock://{kind}/{name}"),
    }
}

pub fn region_directory(name: &str, region: Option<&str>, members: &[&str]) -> RegionDirectory {
    RegionDirectory {
        name: name.to_string(),
        region: region.map(|r| named("region", r)),
        pokemon_entries: members
            .iter()
            .enumerate()
            .map(|(idx, member)| DirectoryEntry {
                entry_number: idx as u32 + 1,
                pokemon_species: named("pokemon-species", member),
            })
            .collect(),
    }
}

pub struct MockCatalog {
    pub entries: Vec<Entry>,
    pub regions: Vec<RegionDirectory>,
    pub generations: HashMap<u32, GenerationDirectory>,
    pub species: HashMap<String, SpeciesDetail>,
    pub delay: Duration,
    pub slow_entries: HashMap<String, Duration>,
    pub failing_entry: Mutex<Option<String>>,
    pub failing_region: Mutex<Option<String>>,
    pub failing_listing: Mutex<Option<ResourceKind>>,
    pub generation_failures: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub entry_calls: AtomicUsize,
    pub region_calls: AtomicUsize,
    pub generation_calls: AtomicUsize,
}

impl MockCatalog {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            regions: Vec::new(),
            generations: HashMap::new(),
            species: HashMap::new(),
            delay: Duration::ZERO,
            slow_entries: HashMap::new(),
            failing_entry: Mutex::new(None),
            failing_region: Mutex::new(None),
            failing_listing: Mutex::new(None),
            generation_failures: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            entry_calls: AtomicUsize::new(0),
            region_calls: AtomicUsize::new(0),
            generation_calls: AtomicUsize::new(0),
        }
    }

    pub fn pikachu_family() -> Self {
        let mut catalog = Self::new(vec![
            entry(25, "pikachu", &["electric"]),
            entry(172, "pichu", &["electric"]),
            entry(19, "rattata", &["normal"]),
        ]);
        catalog.generations.insert(
            1,
            GenerationDirectory {
                id: 1,
                name: "generation-i".to_string(),
                pokemon_species: vec![
                    named("pokemon-species", "pikachu"),
                    named("pokemon-species", "rattata"),
                ],
            },
        );
        catalog.generations.insert(
            2,
            GenerationDirectory {
                id: 2,
                name: "generation-ii".to_string(),
                pokemon_species: vec![named("pokemon-species", "pichu")],
            },
        );
        catalog.regions = vec![
            region_directory("national", None, &["pikachu", "pichu", "rattata"]),
            region_directory("kanto", Some("kanto"), &["pikachu", "rattata"]),
            region_directory("original-johto", Some("johto"), &["pikachu", "pichu"]),
        ];
        catalog.species.insert(
            "pikachu".to_string(),
            SpeciesDetail {
                name: "pikachu".to_string(),
                flavor_texts: vec![FlavorText {
                    text: "WHEN SEVERAL OF\u{c}THESE GATHER. THEIR ELECTRICITY BUILDS.".to_string(),
                    language: "en".to_string(),
                    version: Some("red".to_string()),
                }],
            },
        );
        catalog
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes fetching `name` take `delay` instead of the shared delay.
    pub fn with_slow_entry(mut self, name: &str, delay: Duration) -> Self {
        self.slow_entries.insert(name.to_string(), delay);
        self
    }

    /// Failing fetches answer immediately, without the configured delay.
    pub fn fail_entry(&self, name: Option<&str>) {
        *self.failing_entry.lock().unwrap() = name.map(str::to_string);
    }

    pub fn fail_region(&self, name: Option<&str>) {
        *self.failing_region.lock().unwrap() = name.map(str::to_string);
    }

    pub fn fail_listing(&self, kind: Option<ResourceKind>) {
        *self.failing_listing.lock().unwrap() = kind;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn entry_calls(&self) -> usize {
        self.entry_calls.load(Ordering::SeqCst)
    }

    pub fn region_calls(&self) -> usize {
        self.region_calls.load(Ordering::SeqCst)
    }

    pub fn generation_calls(&self) -> usize {
        self.generation_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

fn key_of(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn list_all(&self, kind: ResourceKind) -> Result<Vec<NamedResource>, DexError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if *self.failing_listing.lock().unwrap() == Some(kind) {
            return Err(DexError::RemoteFetchFailed {
                kind,
                cause: "status 503: listing unavailable".to_string(),
            });
        }
        let listing: Vec<NamedResource> = match kind {
            ResourceKind::Entry => self
                .entries
                .iter()
                .map(|e| named("pokemon", &e.name))
                .collect(),
            ResourceKind::RegionDirectory => self
                .regions
                .iter()
                .map(|d| named("pokedex", &d.name))
                .collect(),
            ResourceKind::Generation => {
                let mut ids: Vec<_> = self.generations.keys().copied().collect();
                ids.sort();
                ids.iter()
                    .map(|id| named("generation", &self.generations[id].name))
                    .collect()
            }
            ResourceKind::Type => ["normal", "electric", "unknown", "shadow", "stellar"]
                .iter()
                .map(|t| named("type", t))
                .collect(),
            ResourceKind::Species => self
                .species
                .keys()
                .map(|name| named("pokemon-species", name))
                .collect(),
        };
        Ok(listing)
    }

    async fn fetch_entry(&self, url: &str) -> Result<Entry, DexError> {
        self.entry_calls.fetch_add(1, Ordering::SeqCst);
        let name = key_of(url);
        if self.failing_entry.lock().unwrap().as_deref() == Some(name) {
            return Err(DexError::RemoteFetchFailed {
                kind: ResourceKind::Entry,
                cause: format!("status 500: {name}"),
            });
        }
        match self.slow_entries.get(name) {
            Some(delay) => tokio::time::sleep(*delay).await,
            None => self.pause().await,
        }
        self.entries
            .iter()
            .find(|e| e.name == name)
            .cloned()
            .ok_or_else(|| DexError::RemoteFetchFailed {
                kind: ResourceKind::Entry,
                cause: format!("status 404: {name}"),
            })
    }

    async fn fetch_region_directory(&self, url: &str) -> Result<RegionDirectory, DexError> {
        self.region_calls.fetch_add(1, Ordering::SeqCst);
        let name = key_of(url);
        if self.failing_region.lock().unwrap().as_deref() == Some(name) {
            return Err(DexError::RemoteFetchFailed {
                kind: ResourceKind::RegionDirectory,
                cause: format!("status 500: {name}"),
            });
        }
        self.regions
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .ok_or_else(|| DexError::RemoteFetchFailed {
                kind: ResourceKind::RegionDirectory,
                cause: format!("status 404: {name}"),
            })
    }

    async fn fetch_generation(&self, id: GenerationId) -> Result<GenerationDirectory, DexError> {
        self.generation_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let pending_failures = self.generation_failures.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.generation_failures
                .store(pending_failures - 1, Ordering::SeqCst);
            return Err(DexError::RemoteFetchFailed {
                kind: ResourceKind::Generation,
                cause: "connection reset".to_string(),
            });
        }
        self.generations
            .get(&id.get())
            .cloned()
            .ok_or_else(|| DexError::RemoteFetchFailed {
                kind: ResourceKind::Generation,
                cause: format!("status 404: {id}"),
            })
    }

    async fn fetch_species(&self, name: &str) -> Result<SpeciesDetail, DexError> {
        self.species
            .get(name)
            .cloned()
            .ok_or_else(|| DexError::RemoteFetchFailed {
                kind: ResourceKind::Species,
                cause: format!("status 404: {name}"),
            })
    }
}

pub struct MockClassifier {
    pub label: Result<String, String>,
    pub calls: AtomicUsize,
}

impl MockClassifier {
    pub fn answering(label: &str) -> Self {
        Self {
            label: Ok(label.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            label: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, _image: &ImagePayload) -> Result<String, DexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.label
            .clone()
            .map_err(DexError::ClassificationFailed)
    }
}

pub fn image() -> ImagePayload {
    ImagePayload::new("image/png", vec![0x89, b'P', b'N', b'G'])
}
