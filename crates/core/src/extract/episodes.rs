use chrono::Utc;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use super::catalog::first_link;
use super::links::first_number;
use super::selector::{clean_text, first_group, first_text};
use crate::browser::LoadedPage;
use crate::sites::{EpisodeEntry, SiteDescriptor, DEFAULT_EPISODE_DURATION};

static EPISODE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:epis[oó]dio|episode|cap[ií]tulo|ep)\.?\s*#?\s*(\d+)").unwrap()
});

static TRAILING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*$").unwrap());

/// Episode number from a title such as `"Episódio 7 - O Confronto"` or
/// `"Naruto 12"`.
pub fn infer_number_from_title(title: &str) -> Option<u32> {
    // regex-lite only folds ASCII case, so "EPISÓDIO" must be lowered first.
    let title = title.to_lowercase();
    EPISODE_LABEL
        .captures(&title)
        .or_else(|| TRAILING_NUMBER.captures(&title))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}

/// Extract the ordered episode list of one catalog entry.
///
/// The result is sorted ascending by episode number. Elements without a
/// resolvable link are dropped.
pub fn extract_episodes(
    page: &LoadedPage,
    anime_id: &str,
    site: &SiteDescriptor,
) -> Vec<EpisodeEntry> {
    let Some(base) = page.base_url() else {
        warn!(site = %site.id, url = %page.requested_url, "Page URL is not absolute");
        return Vec::new();
    };

    let document = Html::parse_document(&page.html);
    let selectors = &site.episodes;
    let release_date = Utc::now().date_naive().to_string();

    let mut episodes: Vec<EpisodeEntry> = first_group(document.root_element(), &selectors.items)
        .into_iter()
        .enumerate()
        .filter_map(|(index, element)| {
            let url = first_link(element, &selectors.link, &base)?;
            let title = first_text(element, &selectors.title);
            let number = infer_number(element, title.as_deref(), site, index);

            Some(EpisodeEntry {
                id: format!("{}-{}-ep-{}", site.id, anime_id, number),
                anime_id: anime_id.to_string(),
                site_id: site.id.clone(),
                number,
                title: title.unwrap_or_else(|| format!("Episode {}", number)),
                url,
                thumbnail: first_link(element, &selectors.thumbnail, &base).unwrap_or_default(),
                duration: DEFAULT_EPISODE_DURATION.to_string(),
                release_date: release_date.clone(),
            })
        })
        .collect();

    episodes.sort_by_key(|e| e.number);
    debug!(site = %site.id, anime = anime_id, count = episodes.len(), "Extracted episodes");
    episodes
}

fn infer_number(
    element: ElementRef<'_>,
    title: Option<&str>,
    site: &SiteDescriptor,
    index: usize,
) -> u32 {
    first_text(element, &site.episodes.number)
        .and_then(|text| first_number(&text))
        .filter(|n| *n > 0)
        .or_else(|| title.and_then(infer_number_from_title))
        .or_else(|| {
            let raw = clean_text(&element.text().collect::<String>());
            first_number(&raw).filter(|n| *n > 0)
        })
        .unwrap_or_else(|| u32::try_from(index + 1).unwrap_or(u32::MAX))
}
