use crate::domain::Entry;

/// Label the classifier returns when it cannot name the subject.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Maps a free-text classifier label onto the catalog by exact,
/// case-insensitive name. An unloaded (empty) catalog yields `None`.
pub fn reconcile<'a>(raw_label: &str, catalog: &'a [Entry]) -> Option<&'a Entry> {
    let label = raw_label.trim().to_lowercase();
    if label.is_empty() || label == UNKNOWN_LABEL {
        return None;
    }
    catalog.iter().find(|entry| entry.name == label)
}
