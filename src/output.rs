use std::io::{self, Write};

use serde::Serialize;

use crate::app::{EntryCard, Identification};
use crate::domain::{Entry, NamedResource, TypeTag};
use crate::query::Resolution;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_card(card: &EntryCard) {
        print!("{}", render_card(card));
    }

    pub fn print_matches(resolution: &Resolution) {
        for entry in &resolution.matches {
            println!("{}", render_row(entry));
        }
        println!("{} match(es)", resolution.matches.len());
    }

    pub fn print_types(types: &[TypeTag]) {
        for tag in types {
            println!("{tag}");
        }
    }

    pub fn print_generations(generations: &[NamedResource]) {
        for (idx, generation) in generations.iter().enumerate() {
            println!("{:>2}  {}", idx + 1, generation.name);
        }
    }

    pub fn print_identification(identification: &Identification) {
        match &identification.entry {
            Some(entry) => println!("Scanned: {}!", entry.display_name()),
            None => println!(
                "No Pokémon identified (label: {:?}). Try again with a clearer image!",
                identification.label
            ),
        }
    }
}

pub fn render_row(entry: &Entry) -> String {
    let types = entry
        .types
        .iter()
        .map(TypeTag::as_str)
        .collect::<Vec<_>>()
        .join("/");
    format!("#{:<5} {:<24} {}", entry.id, entry.display_name(), types)
}

pub fn render_card(card: &EntryCard) -> String {
    let entry = &card.entry;
    let mut out = String::new();
    out.push_str(&format!("{} #{}\n", entry.display_name(), entry.id));
    out.push_str(&format!(
        "Types: {}\n",
        entry
            .types
            .iter()
            .map(TypeTag::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    ));
    if let Some(sprite) = entry.sprites.preferred() {
        out.push_str(&format!("Image: {sprite}\n"));
    }
    if !card.description.is_empty() {
        out.push_str(&format!("Description: {}\n", card.description));
    }
    if !card.regions.is_empty() {
        out.push_str(&format!("Regions: {}\n", card.regions.join(", ")));
    }
    out.push_str(&format!(
        "Height: {:.1} m  Weight: {:.1} kg\n",
        entry.height_m(),
        entry.weight_kg()
    ));
    out.push_str("Abilities:\n");
    for ability in &entry.abilities {
        let hidden = if ability.hidden { " (Hidden)" } else { "" };
        out.push_str(&format!("  - {}{hidden}\n", ability.name));
    }
    out.push_str("Base Stats:\n");
    for stat in &entry.stats {
        out.push_str(&format!("  {:<16}{:>4}\n", format!("{}:", stat.name), stat.value));
    }
    out.push_str(&format!("  {:<16}{:>4}\n", "Total:", entry.total_base_stat()));
    out
}
