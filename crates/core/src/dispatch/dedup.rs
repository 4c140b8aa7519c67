//! Deduplication of aggregated catalog entries by title.

use std::collections::HashSet;

use crate::sites::CatalogEntry;

/// Comparison key for titles: trimmed, whitespace-collapsed, lowercase.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Drop entries whose normalized title was already seen.
///
/// The first occurrence wins, so callers pass entries in site-registration
/// order to get a deterministic result.
pub fn dedup_by_title(entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(normalize_title(&entry.title)))
        .collect()
}
