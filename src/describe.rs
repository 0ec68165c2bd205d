use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::SpeciesDetail;

pub const DESCRIPTION_LANGUAGE: &str = "en";

static SENTENCE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.?!]\s+)(\p{Ll})").expect("sentence pattern is valid"));

/// Cleans catalog flavor text for display.
///
/// Form feeds become spaces, the text is lowercased with its first character
/// uppercased, and the first letter after each `.`, `?` or `!` followed by
/// whitespace is uppercased again.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let spaced = raw.replace('\u{c}', " ");
    let lowered = spaced.to_lowercase();
    let mut chars = lowered.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    SENTENCE_START
        .replace_all(&capitalized, |caps: &Captures<'_>| {
            format!("{}{}", &caps[1], caps[2].to_uppercase())
        })
        .into_owned()
}

/// Normalized English flavor text of `species`; empty when none exists.
pub fn description_of(species: &SpeciesDetail) -> String {
    species
        .flavor_text_in(DESCRIPTION_LANGUAGE)
        .map(normalize)
        .unwrap_or_default()
}
