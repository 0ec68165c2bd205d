use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::{
    Ability, Entry, FlavorText, GenerationDirectory, GenerationId, NamedResource,
    RegionDirectory, ResourceKind, SpeciesDetail, Sprites, Stat, TypeTag,
};
use crate::error::DexError;

/// Read-only access to the remote catalog. Implementations never retry; a
/// failed call surfaces as `DexError::RemoteFetchFailed`.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Every `{name, url}` listed under `kind`, in the order the service returns.
    async fn list_all(&self, kind: ResourceKind) -> Result<Vec<NamedResource>, DexError>;

    async fn fetch_entry(&self, url: &str) -> Result<Entry, DexError>;

    async fn fetch_region_directory(&self, url: &str) -> Result<RegionDirectory, DexError>;

    async fn fetch_generation(&self, id: GenerationId) -> Result<GenerationDirectory, DexError>;

    async fn fetch_species(&self, name: &str) -> Result<SpeciesDetail, DexError>;
}

#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    next: Option<String>,
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: u32,
    name: String,
    #[serde(default)]
    species: Option<RawName>,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    weight: u32,
    #[serde(default)]
    types: Vec<RawTypeSlot>,
    #[serde(default)]
    abilities: Vec<RawAbilitySlot>,
    #[serde(default)]
    stats: Vec<RawStat>,
    #[serde(default)]
    sprites: RawSprites,
}

#[derive(Debug, Deserialize)]
struct RawTypeSlot {
    #[serde(rename = "type")]
    kind: RawName,
}

#[derive(Debug, Deserialize)]
struct RawAbilitySlot {
    ability: RawName,
    #[serde(default)]
    is_hidden: bool,
}

#[derive(Debug, Deserialize)]
struct RawStat {
    base_stat: u32,
    stat: RawName,
}

#[derive(Debug, Deserialize)]
struct RawName {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawSprites {
    front_default: Option<String>,
    front_shiny: Option<String>,
    #[serde(default)]
    other: RawOtherSprites,
}

#[derive(Debug, Default, Deserialize)]
struct RawOtherSprites {
    #[serde(default)]
    home: RawSpriteSet,
    #[serde(rename = "official-artwork", default)]
    official_artwork: RawSpriteSet,
}

#[derive(Debug, Default, Deserialize)]
struct RawSpriteSet {
    front_default: Option<String>,
    front_shiny: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSpecies {
    name: String,
    #[serde(default)]
    flavor_text_entries: Vec<RawFlavorText>,
}

#[derive(Debug, Deserialize)]
struct RawFlavorText {
    flavor_text: String,
    language: RawName,
    #[serde(default)]
    version: Option<RawName>,
}

impl From<RawEntry> for Entry {
    fn from(raw: RawEntry) -> Self {
        let name = raw.name.to_lowercase();
        Entry {
            id: raw.id,
            species: raw
                .species
                .map(|species| species.name.to_lowercase())
                .unwrap_or_else(|| name.clone()),
            name,
            types: raw
                .types
                .into_iter()
                .map(|slot| TypeTag::new(slot.kind.name))
                .collect(),
            abilities: raw
                .abilities
                .into_iter()
                .map(|slot| Ability {
                    name: slot.ability.name,
                    hidden: slot.is_hidden,
                })
                .collect(),
            stats: raw
                .stats
                .into_iter()
                .map(|stat| Stat {
                    name: stat.stat.name,
                    value: stat.base_stat,
                })
                .collect(),
            sprites: Sprites {
                front_default: raw.sprites.front_default,
                front_shiny: raw.sprites.front_shiny,
                home_default: raw.sprites.other.home.front_default,
                home_shiny: raw.sprites.other.home.front_shiny,
                official_artwork: raw.sprites.other.official_artwork.front_default,
            },
            height: raw.height,
            weight: raw.weight,
        }
    }
}

impl From<RawSpecies> for SpeciesDetail {
    fn from(raw: RawSpecies) -> Self {
        SpeciesDetail {
            name: raw.name,
            flavor_texts: raw
                .flavor_text_entries
                .into_iter()
                .map(|entry| FlavorText {
                    text: entry.flavor_text,
                    language: entry.language.name,
                    version: entry.version.map(|v| v.name),
                })
                .collect(),
        }
    }
}

/// Parses a single entry detail document as served by the catalog.
fn parse_entry(json: &str) -> Result<Entry, DexError> {
    let raw: RawEntry =
        serde_json::from_str(json).map_err(|err| DexError::remote(ResourceKind::Entry, err))?;
    Ok(raw.into())
}

fn parse_species(json: &str) -> Result<SpeciesDetail, DexError> {
    let raw: RawSpecies =
        serde_json::from_str(json).map_err(|err| DexError::remote(ResourceKind::Species, err))?;
    Ok(raw.into())
}

#[derive(Clone)]
pub struct CatalogHttpClient {
    client: Client,
    base_url: String,
}

impl CatalogHttpClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://pokeapi.co/api/v2";
    const LIST_LIMIT: u32 = 100_000;

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pokedex-finder/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DexError::remote(ResourceKind::Entry, err))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| DexError::remote(ResourceKind::Entry, err))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn list_url(&self, kind: ResourceKind) -> String {
        format!(
            "{}/{}?limit={}",
            self.base_url,
            kind.path(),
            Self::LIST_LIMIT
        )
    }

    pub fn resource_url(&self, kind: ResourceKind, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, kind.path(), key)
    }

    async fn get_text(&self, kind: ResourceKind, url: &str) -> Result<String, DexError> {
        debug!(%kind, url, "catalog.request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| DexError::remote(kind, err))?;
        let response = Self::handle_status(kind, response).await?;
        response
            .text()
            .await
            .map_err(|err| DexError::remote(kind, err))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        url: &str,
    ) -> Result<T, DexError> {
        let body = self.get_text(kind, url).await?;
        serde_json::from_str(&body).map_err(|err| DexError::remote(kind, err))
    }

    async fn handle_status(
        kind: ResourceKind,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DexError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "catalog request failed".to_string());
        Err(DexError::remote(kind, format!("status {status}: {message}")))
    }
}

#[async_trait]
impl CatalogClient for CatalogHttpClient {
    async fn list_all(&self, kind: ResourceKind) -> Result<Vec<NamedResource>, DexError> {
        let mut results = Vec::new();
        let mut next = Some(self.list_url(kind));
        while let Some(url) = next {
            let page: ListPage = self.get_json(kind, &url).await?;
            results.extend(page.results);
            next = page.next;
        }
        debug!(%kind, count = results.len(), "catalog.listed");
        Ok(results)
    }

    async fn fetch_entry(&self, url: &str) -> Result<Entry, DexError> {
        let body = self.get_text(ResourceKind::Entry, url).await?;
        parse_entry(&body)
    }

    async fn fetch_region_directory(&self, url: &str) -> Result<RegionDirectory, DexError> {
        self.get_json(ResourceKind::RegionDirectory, url).await
    }

    async fn fetch_generation(&self, id: GenerationId) -> Result<GenerationDirectory, DexError> {
        let url = self.resource_url(ResourceKind::Generation, &id.to_string());
        self.get_json(ResourceKind::Generation, &url).await
    }

    async fn fetch_species(&self, name: &str) -> Result<SpeciesDetail, DexError> {
        let url = self.resource_url(ResourceKind::Species, &name.to_lowercase());
        let body = self.get_text(ResourceKind::Species, &url).await?;
        parse_species(&body)
    }
}
