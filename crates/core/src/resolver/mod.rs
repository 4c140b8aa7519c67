//! Client-side episode video resolution.
//!
//! Given a title and episode number, [`EpisodeVideoResolver`] consults a
//! TTL cache, then an ordered chain of discovery APIs, and finally picks a
//! placeholder deterministically so the same query always yields the same
//! URL.

mod cache;
mod chain;
mod http_api;
mod placeholder;
mod service_api;

pub use cache::ResolutionCache;
pub use chain::{EpisodeVideoResolver, ResolverStats};
pub use http_api::{extract_sources, HttpDiscoveryApi, HttpDiscoveryConfig};
pub use placeholder::{placeholder_index, select_placeholder, DEFAULT_PLACEHOLDERS};
pub use service_api::ScrapingServiceApi;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::client::{ClientError, ScrapingServiceClient};
use crate::config::ResolverConfig;

/// Errors that can occur while querying a discovery API.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("API error: {status}")]
    Status { status: u16 },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// API did not answer in time.
    #[error("{api} timed out after {secs}s")]
    Timeout { api: String, secs: u64 },

    /// Scraping service call failed.
    #[error(transparent)]
    Service(#[from] ClientError),

    /// API is misconfigured.
    #[error("Invalid API configuration: {0}")]
    InvalidConfig(String),
}

/// Trait for external services that can locate an episode's video.
#[async_trait]
pub trait DiscoveryApi: Send + Sync {
    /// API name for logging and metrics.
    fn name(&self) -> &str;

    /// Candidate source URLs for `(title, episode)`, best first.
    async fn discover(&self, title: &str, episode: u32) -> Result<Vec<String>, DiscoveryError>;
}

/// Where a resolved URL came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VideoSource {
    Api { name: String },
    Placeholder,
}

/// Outcome of [`EpisodeVideoResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVideo {
    pub url: String,
    pub source: VideoSource,
    /// Served from the cache.
    pub cached: bool,
}

/// Build the resolver described by `config`.
///
/// The scraping service, when configured, is consulted before the generic
/// HTTP APIs.
pub fn build_resolver(config: &ResolverConfig) -> Result<EpisodeVideoResolver, DiscoveryError> {
    let timeout = Duration::from_secs(config.api_timeout_secs);
    let mut apis: Vec<Arc<dyn DiscoveryApi>> = Vec::new();

    if let Some(ref base_url) = config.service_url {
        let client = ScrapingServiceClient::new(base_url, timeout)?;
        apis.push(Arc::new(ScrapingServiceApi::new(client)));
    }
    for api in &config.apis {
        apis.push(Arc::new(HttpDiscoveryApi::new(api.clone(), timeout)?));
    }

    Ok(EpisodeVideoResolver::new(
        apis,
        config.placeholders.clone(),
        Duration::from_secs(config.cache_ttl_secs),
        timeout,
    ))
}
