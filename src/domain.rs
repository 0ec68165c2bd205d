use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DexError;

/// Remote collections the catalog service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Entry,
    RegionDirectory,
    Generation,
    Type,
    Species,
}

impl ResourceKind {
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Entry => "pokemon",
            ResourceKind::RegionDirectory => "pokedex",
            ResourceKind::Generation => "generation",
            ResourceKind::Type => "type",
            ResourceKind::Species => "pokemon-species",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeTag(String);

impl TypeTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ability {
    pub name: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub name: String,
    pub value: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
    pub home_default: Option<String>,
    pub home_shiny: Option<String>,
    pub official_artwork: Option<String>,
}

impl Sprites {
    /// Home render first, then official artwork, then the in-game sprite.
    pub fn preferred(&self) -> Option<&str> {
        self.home_default
            .as_deref()
            .or(self.official_artwork.as_deref())
            .or(self.front_default.as_deref())
    }

    pub fn shiny(&self) -> Option<&str> {
        self.home_shiny.as_deref()
    }
}

/// One catalog item. Immutable once fetched; `name` is always lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub id: u32,
    pub name: String,
    /// The species this entry is a form of. Equals `name` except for
    /// alternate forms such as `deoxys-normal`.
    pub species: String,
    pub types: Vec<TypeTag>,
    pub abilities: Vec<Ability>,
    pub stats: Vec<Stat>,
    pub sprites: Sprites,
    /// Decimetres.
    pub height: u32,
    /// Hectograms.
    pub weight: u32,
}

impl Entry {
    pub fn has_type(&self, tag: &str) -> bool {
        self.types.iter().any(|t| t.as_str() == tag)
    }

    pub fn total_base_stat(&self) -> u32 {
        self.stats.iter().map(|s| s.value).sum()
    }

    pub fn height_m(&self) -> f64 {
        f64::from(self.height) / 10.0
    }

    pub fn weight_kg(&self) -> f64 {
        f64::from(self.weight) / 10.0
    }

    pub fn display_name(&self) -> String {
        capitalize(&self.name)
    }
}

pub(crate) fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenerationId(u32);

impl GenerationId {
    pub fn new(id: u32) -> Result<Self, DexError> {
        if id == 0 {
            return Err(DexError::InvalidGeneration(id.to_string()));
        }
        Ok(Self(id))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GenerationId {
    type Err = DexError;

    /// Accepts `3`, `generation-iii` and `iii` (case-insensitive).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        let bare = normalized
            .strip_prefix("generation-")
            .unwrap_or(&normalized);
        let id = match bare.parse::<u32>() {
            Ok(id) => id,
            Err(_) => roman_to_u32(bare)
                .ok_or_else(|| DexError::InvalidGeneration(value.to_string()))?,
        };
        GenerationId::new(id).map_err(|_| DexError::InvalidGeneration(value.to_string()))
    }
}

/// Only canonical numerals up to `xxxix` are accepted: `iv`, not `iiii`.
fn roman_to_u32(value: &str) -> Option<u32> {
    (1..40).find(|&n| u32_to_roman(n) == value)
}

fn u32_to_roman(mut value: u32) -> String {
    const NUMERALS: [(u32, &str); 5] = [(10, "x"), (9, "ix"), (5, "v"), (4, "iv"), (1, "i")];
    let mut out = String::new();
    for (weight, numeral) in NUMERALS {
        while value >= weight {
            out.push_str(numeral);
            value -= weight;
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub entry_number: u32,
    pub pokemon_species: NamedResource,
}

/// A regional directory lists the entries native to a region. Some directories
/// (the national one) belong to no region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDirectory {
    pub name: String,
    #[serde(default)]
    pub region: Option<NamedResource>,
    #[serde(default)]
    pub pokemon_entries: Vec<DirectoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationDirectory {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub pokemon_species: Vec<NamedResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlavorText {
    pub text: String,
    pub language: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesDetail {
    pub name: String,
    pub flavor_texts: Vec<FlavorText>,
}

impl SpeciesDetail {
    pub fn flavor_text_in(&self, language: &str) -> Option<&str> {
        self.flavor_texts
            .iter()
            .find(|entry| entry.language == language)
            .map(|entry| entry.text.as_str())
    }
}

pub type SpeciesSet = HashSet<String>;
