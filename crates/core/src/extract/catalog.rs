use chrono::{Datelike, Utc};
use scraper::{ElementRef, Html};
use tracing::{debug, warn};
use url::Url;

use super::links::{first_number, resolve_link};
use super::selector::{all_texts, first_group, first_text, values, FieldQuery};
use crate::browser::LoadedPage;
use crate::sites::{CatalogEntry, SiteDescriptor, DEFAULT_STATUS};

/// Maximum genres kept per catalog entry.
pub const MAX_GENRES: usize = 5;

const MIN_TITLE_CHARS: usize = 2;

/// Extract catalog entries from a rendered listing or search page.
///
/// At most `max_items` matched elements are considered. Entries without a
/// usable title or link are dropped.
pub fn extract_catalog(
    page: &LoadedPage,
    site: &SiteDescriptor,
    max_items: usize,
) -> Vec<CatalogEntry> {
    let Some(base) = page.base_url() else {
        warn!(site = %site.id, url = %page.requested_url, "Page URL is not absolute");
        return Vec::new();
    };

    let document = Html::parse_document(&page.html);
    let selectors = &site.catalog;
    let year = Utc::now().year();

    let elements = first_group(document.root_element(), &selectors.items);
    let matched = elements.len();

    let entries: Vec<CatalogEntry> = elements
        .into_iter()
        .take(max_items)
        .enumerate()
        .filter_map(|(ordinal, element)| {
            let title = first_text(element, &selectors.title)?;
            if title.chars().count() < MIN_TITLE_CHARS {
                return None;
            }
            let url = first_link(element, &selectors.link, &base)?;

            let mut genres = all_texts(element, &selectors.genres);
            genres.truncate(MAX_GENRES);

            Some(CatalogEntry {
                id: format!("{}-{}", site.id, ordinal),
                site_id: site.id.clone(),
                title,
                url,
                thumbnail: first_link(element, &selectors.thumbnail, &base).unwrap_or_default(),
                total_episodes: first_text(element, &selectors.episode_count)
                    .and_then(|text| first_number(&text)),
                genres,
                status: DEFAULT_STATUS.to_string(),
                year,
            })
        })
        .collect();

    debug!(
        site = %site.id,
        matched = matched,
        kept = entries.len(),
        "Extracted catalog"
    );
    entries
}

/// First value, across the ordered queries and every element each query
/// matches, that resolves to an absolute http(s) URL.
pub(crate) fn first_link(element: ElementRef<'_>, queries: &[FieldQuery], base: &Url) -> Option<String> {
    queries.iter().find_map(|query| {
        values(element, query).find_map(|href| resolve_link(base, &href))
    })
}
