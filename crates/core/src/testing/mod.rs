//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the page-acquisition and
//! discovery-API traits, allowing the dispatch layer, the resolver and the
//! HTTP API to be exercised without a browser or network.
//!
//! # Example
//!
//! ```rust,ignore
//! use anistream_core::testing::{fixtures, MockDiscoveryApi, MockPageSource};
//!
//! let pages = MockPageSource::new();
//! pages.set_html("https://alpha.example/list", fixtures::catalog_page(&[("Naruto", "/n")])).await;
//!
//! let api = MockDiscoveryApi::new("mirror");
//! api.fail_with_status(503).await;
//! ```

mod mock_discovery_api;
mod mock_page_source;

pub use mock_discovery_api::{MockDiscoveryApi, RecordedDiscovery};
pub use mock_page_source::MockPageSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::sites::{CatalogEntry, SiteDescriptor, DEFAULT_STATUS};

    /// A site with the generic selector catalog at `https://{id}.example`.
    pub fn site(id: &str) -> SiteDescriptor {
        SiteDescriptor::new(
            id,
            &format!("Site {}", id),
            &format!("https://{}.example/list", id),
            &format!("https://{}.example/search?q={{query}}", id),
        )
    }

    fn slug(title: &str) -> String {
        title.to_lowercase().replace(' ', "-")
    }

    /// Listing page with one `.anime-card` per `(title, href)`.
    ///
    /// Each card carries a thumbnail at `/img/{slug}.jpg`.
    pub fn catalog_page(cards: &[(&str, &str)]) -> String {
        let body: String = cards
            .iter()
            .map(|(title, href)| {
                format!(
                    r#"<div class="anime-card"><a href="{href}"><img data-src="/img/{slug}.jpg"><h3 class="title">{title}</h3></a></div>"#,
                    href = href,
                    slug = slug(title),
                    title = title,
                )
            })
            .collect();
        format!("<html><body><main>{}</main></body></html>", body)
    }

    /// Episode-list page with one `<li>` per `(label, href)`.
    pub fn episode_page(episodes: &[(&str, &str)]) -> String {
        let items: String = episodes
            .iter()
            .map(|(label, href)| format!(r#"<li><a href="{}">{}</a></li>"#, href, label))
            .collect();
        format!(
            r#"<html><body><ul class="episodes-list">{}</ul></body></html>"#,
            items
        )
    }

    /// Watch page embedding a player iframe.
    pub fn watch_page_with_iframe(src: &str) -> String {
        format!(
            r#"<html><body><div class="player"><iframe src="{}" allowfullscreen></iframe></div></body></html>"#,
            src
        )
    }

    /// Catalog entry with the given site-scoped ordinal.
    pub fn catalog_entry(site_id: &str, ordinal: usize, title: &str) -> CatalogEntry {
        CatalogEntry {
            id: format!("{}-{}", site_id, ordinal),
            site_id: site_id.to_string(),
            title: title.to_string(),
            url: format!("https://{}.example/anime/{}", site_id, slug(title)),
            thumbnail: String::new(),
            total_episodes: None,
            genres: Vec::new(),
            status: DEFAULT_STATUS.to_string(),
            year: 2024,
        }
    }
}
