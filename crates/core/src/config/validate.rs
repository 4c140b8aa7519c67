use std::collections::HashSet;

use scraper::Selector;
use url::Url;

use super::{types::Config, ConfigError};
use crate::sites::SiteDescriptor;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Site ids are non-empty and unique
/// - Search templates contain `{query}` and every selector parses
/// - Resolver cache TTL is positive and the placeholder pool is non-empty
/// - Discovery endpoints are http(s)
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.browser.navigation_timeout_secs == 0 {
        return Err(invalid("browser.navigation_timeout_secs cannot be 0"));
    }
    if config.scraper.site_timeout_secs == 0 {
        return Err(invalid("scraper.site_timeout_secs cannot be 0"));
    }

    let mut seen = HashSet::new();
    for site in &config.sites {
        if site.id.trim().is_empty() {
            return Err(invalid("sites[].id cannot be empty"));
        }
        if !seen.insert(site.id.as_str()) {
            return Err(invalid(&format!("duplicate site id '{}'", site.id)));
        }
        validate_site(site)?;
    }

    let resolver = &config.resolver;
    if resolver.cache_ttl_secs == 0 {
        return Err(invalid("resolver.cache_ttl_secs cannot be 0"));
    }
    if resolver.placeholders.is_empty() {
        return Err(invalid("resolver.placeholders cannot be empty"));
    }
    if let Some(service_url) = &resolver.service_url {
        if !is_http_url(service_url) {
            return Err(invalid(&format!(
                "resolver.service_url '{}' is not an http(s) URL",
                service_url
            )));
        }
    }
    for api in &resolver.apis {
        if !api.url_template.starts_with("http://") && !api.url_template.starts_with("https://")
        {
            return Err(invalid(&format!(
                "resolver.apis '{}': url_template must start with http:// or https://",
                api.name
            )));
        }
    }

    Ok(())
}

fn validate_site(site: &SiteDescriptor) -> Result<(), ConfigError> {
    if !is_http_url(&site.base_url) {
        return Err(invalid(&format!(
            "site '{}': base_url '{}' is not an http(s) URL",
            site.id, site.base_url
        )));
    }
    if !site.search_url.contains("{query}") {
        return Err(invalid(&format!(
            "site '{}': search_url must contain {{query}}",
            site.id
        )));
    }

    let catalog = &site.catalog;
    let episodes = &site.episodes;
    let items = catalog.items.iter().chain(episodes.items.iter());
    let fields = [
        &catalog.title,
        &catalog.link,
        &catalog.thumbnail,
        &catalog.episode_count,
        &catalog.genres,
        &episodes.number,
        &episodes.title,
        &episodes.link,
        &episodes.thumbnail,
    ];
    let field_selectors = fields
        .into_iter()
        .flatten()
        .filter_map(|q| q.selector.as_ref());

    for selector in items.chain(field_selectors) {
        if let Err(e) = Selector::parse(selector) {
            return Err(invalid(&format!(
                "site '{}': invalid selector '{}': {}",
                site.id, selector, e
            )));
        }
    }
    Ok(())
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
