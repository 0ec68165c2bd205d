use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{GenerationDirectory, NamedResource, RegionDirectory, SpeciesSet, TypeTag};

/// Type tags the catalog lists but that have no real member entries.
pub const SENTINEL_TYPES: [&str; 3] = ["unknown", "shadow", "stellar"];

/// Entry name to the regions whose directories list it.
///
/// Region names keep the order in which directories were processed. Lookups
/// are total: a name absent from every directory has no regions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RegionMap {
    regions: HashMap<String, Vec<String>>,
}

impl RegionMap {
    pub fn regions_for(&self, name: &str) -> &[String] {
        self.regions
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    fn insert(&mut self, entry: &str, region: &str) {
        let regions = self.regions.entry(entry.to_lowercase()).or_default();
        if !regions.iter().any(|existing| existing == region) {
            regions.push(region.to_string());
        }
    }
}

pub fn build_region_map(directories: &[RegionDirectory]) -> RegionMap {
    let mut map = RegionMap::default();
    for directory in directories {
        let Some(region) = &directory.region else {
            continue;
        };
        for member in &directory.pokemon_entries {
            map.insert(&member.pokemon_species.name, &region.name);
        }
    }
    map
}

pub fn build_generation_species_set(directory: &GenerationDirectory) -> SpeciesSet {
    directory
        .pokemon_species
        .iter()
        .map(|species| species.name.to_lowercase())
        .collect()
}

pub fn filter_type_vocabulary(listing: Vec<NamedResource>) -> Vec<TypeTag> {
    listing
        .into_iter()
        .filter(|item| !SENTINEL_TYPES.contains(&item.name.as_str()))
        .map(|item| TypeTag::new(item.name))
        .collect()
}
