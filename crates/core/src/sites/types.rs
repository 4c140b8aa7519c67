//! Types for scraped catalog, episode and streaming records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::extract::FieldQuery;

/// Default status assigned to catalog entries.
pub const DEFAULT_STATUS: &str = "available";

/// Placeholder duration for episodes whose page does not expose one.
pub const DEFAULT_EPISODE_DURATION: &str = "24:00";

/// Static per-site adapter configuration.
///
/// Descriptors are configuration data. Every selector group has a generic
/// default, so a site entry in the config file only needs its id, name and
/// URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    /// Stable identifier used in record ids and API paths.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Catalog listing URL, used when no query is given.
    pub base_url: String,
    /// Search URL template; `{query}` is replaced by the url-encoded query.
    pub search_url: String,
    /// Selector groups for catalog pages.
    #[serde(default)]
    pub catalog: CatalogSelectors,
    /// Selector groups for episode-list pages.
    #[serde(default)]
    pub episodes: EpisodeSelectors,
}

impl SiteDescriptor {
    /// Create a descriptor with the generic selector catalog.
    pub fn new(id: &str, name: &str, base_url: &str, search_url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            base_url: base_url.to_string(),
            search_url: search_url.to_string(),
            catalog: CatalogSelectors::default(),
            episodes: EpisodeSelectors::default(),
        }
    }

    /// URL to scrape for a catalog query.
    ///
    /// A missing or blank query lists the site's landing catalog.
    pub fn catalog_url(&self, query: Option<&str>) -> String {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => self
                .search_url
                .replace("{query}", &urlencoding::encode(q)),
            None => self.base_url.clone(),
        }
    }
}

/// Ordered selector groups for catalog pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSelectors {
    /// Candidate selectors for the repeated catalog element.
    #[serde(default = "default_catalog_items")]
    pub items: Vec<String>,
    #[serde(default = "default_catalog_title")]
    pub title: Vec<FieldQuery>,
    #[serde(default = "default_link")]
    pub link: Vec<FieldQuery>,
    #[serde(default = "default_thumbnail")]
    pub thumbnail: Vec<FieldQuery>,
    #[serde(default = "default_episode_count")]
    pub episode_count: Vec<FieldQuery>,
    #[serde(default = "default_genres")]
    pub genres: Vec<FieldQuery>,
}

impl Default for CatalogSelectors {
    fn default() -> Self {
        Self {
            items: default_catalog_items(),
            title: default_catalog_title(),
            link: default_link(),
            thumbnail: default_thumbnail(),
            episode_count: default_episode_count(),
            genres: default_genres(),
        }
    }
}

/// Ordered selector groups for episode-list pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeSelectors {
    /// Candidate selectors for the repeated episode element.
    #[serde(default = "default_episode_items")]
    pub items: Vec<String>,
    #[serde(default = "default_episode_number")]
    pub number: Vec<FieldQuery>,
    #[serde(default = "default_episode_title")]
    pub title: Vec<FieldQuery>,
    #[serde(default = "default_link")]
    pub link: Vec<FieldQuery>,
    #[serde(default = "default_thumbnail")]
    pub thumbnail: Vec<FieldQuery>,
}

impl Default for EpisodeSelectors {
    fn default() -> Self {
        Self {
            items: default_episode_items(),
            number: default_episode_number(),
            title: default_episode_title(),
            link: default_link(),
            thumbnail: default_thumbnail(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn default_catalog_items() -> Vec<String> {
    strings(&[
        ".anime-card",
        ".anime-item",
        ".film_list-wrap .flw-item",
        ".listupd article",
        ".items article.item",
        "div.divCardUltimosEps",
        "article[class*='anime']",
        "div[class*='anime-']",
        "[class*='card']",
        "article",
    ])
}

fn default_catalog_title() -> Vec<FieldQuery> {
    vec![
        FieldQuery::text(".title"),
        FieldQuery::text("h2"),
        FieldQuery::text("h3"),
        FieldQuery::text(".name"),
        FieldQuery::text("[class*='title']"),
        FieldQuery::attr("a", "title"),
        FieldQuery::own_attr("title"),
        FieldQuery::attr("img", "alt"),
    ]
}

fn default_link() -> Vec<FieldQuery> {
    vec![
        FieldQuery::own_attr("href"),
        FieldQuery::attr("a[href]", "href"),
    ]
}

fn default_thumbnail() -> Vec<FieldQuery> {
    vec![
        FieldQuery::attr("img", "data-src"),
        FieldQuery::attr("img", "data-lazy-src"),
        FieldQuery::attr("img", "src"),
    ]
}

fn default_episode_count() -> Vec<FieldQuery> {
    vec![
        FieldQuery::text(".episodes"),
        FieldQuery::text(".eps"),
        FieldQuery::text(".ep-count"),
        FieldQuery::text("[class*='episode']"),
    ]
}

fn default_genres() -> Vec<FieldQuery> {
    vec![
        FieldQuery::text(".genres a"),
        FieldQuery::text(".genre"),
        FieldQuery::text("[class*='genre']"),
        FieldQuery::text(".tag"),
    ]
}

fn default_episode_items() -> Vec<String> {
    strings(&[
        ".episode-item",
        ".episodes-list li",
        "ul.episodios li",
        ".eplister li",
        "div.div_video_list a",
        "a[href*='episodio']",
        "a[href*='episode']",
        "[class*='episode'] a",
    ])
}

fn default_episode_number() -> Vec<FieldQuery> {
    vec![
        FieldQuery::text(".episode-number"),
        FieldQuery::text(".epl-num"),
        FieldQuery::text(".numerando"),
        FieldQuery::own_attr("data-episode"),
        FieldQuery::own_attr("data-number"),
    ]
}

fn default_episode_title() -> Vec<FieldQuery> {
    vec![
        FieldQuery::text(".episode-title"),
        FieldQuery::text(".epl-title"),
        FieldQuery::text(".episodiotitle a"),
        FieldQuery::text(".title"),
        FieldQuery::own_attr("title"),
        FieldQuery::own_text(),
    ]
}

/// A catalog record scraped from one site (`ScrapedAnime`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// `{siteId}-{ordinal}`.
    pub id: String,
    pub site_id: String,
    pub title: String,
    /// Absolute URL of the entry's page.
    pub url: String,
    /// Absolute URL or empty.
    pub thumbnail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_episodes: Option<u32>,
    /// At most five deduplicated genres.
    #[serde(default)]
    pub genres: Vec<String>,
    pub status: String,
    pub year: i32,
}

/// An episode record scraped from a catalog entry's page (`ScrapedEpisode`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeEntry {
    /// `{siteId}-{animeId}-ep-{number}`.
    pub id: String,
    pub anime_id: String,
    pub site_id: String,
    pub number: u32,
    pub title: String,
    /// Absolute URL of the episode's watch page.
    pub url: String,
    pub thumbnail: String,
    pub duration: String,
    pub release_date: String,
}

/// Which detection strategy produced a streaming URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamSource {
    Video,
    Iframe,
    Script,
    External,
}

impl StreamSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamSource::Video => "video",
            StreamSource::Iframe => "iframe",
            StreamSource::Script => "script",
            StreamSource::External => "external",
        }
    }
}

/// Result of resolving a watch page (`StreamingData`).
///
/// When `external` is true, `streaming_url` is the original watch-page URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    pub streaming_url: String,
    pub referer: String,
    /// Replay headers; always contains `Referer` and `User-Agent`.
    pub headers: BTreeMap<String, String>,
    pub external: bool,
    pub source: StreamSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamingData {
    /// A playable URL found on the watch page.
    pub fn direct(
        streaming_url: String,
        source: StreamSource,
        episode_url: &str,
        user_agent: &str,
    ) -> Self {
        Self {
            streaming_url,
            referer: episode_url.to_string(),
            headers: replay_headers(episode_url, user_agent),
            external: false,
            source,
            error: None,
        }
    }

    /// Redirect the caller to the watch page itself.
    pub fn external(episode_url: &str, user_agent: &str, error: Option<String>) -> Self {
        Self {
            streaming_url: episode_url.to_string(),
            referer: episode_url.to_string(),
            headers: replay_headers(episode_url, user_agent),
            external: true,
            source: StreamSource::External,
            error,
        }
    }
}

fn replay_headers(episode_url: &str, user_agent: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Referer".to_string(), episode_url.to_string()),
        ("User-Agent".to_string(), user_agent.to_string()),
    ])
}
