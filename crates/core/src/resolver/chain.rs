use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use super::cache::ResolutionCache;
use super::placeholder::{select_placeholder, DEFAULT_PLACEHOLDERS};
use super::{DiscoveryApi, DiscoveryError, ResolvedVideo, VideoSource};
use crate::fallback::{first_success, Attempt};
use crate::metrics;

/// Cache and API counts for operators.
#[derive(Debug, Clone, Serialize)]
pub struct ResolverStats {
    pub cache_entries: usize,
    pub cache_ttl_secs: u64,
    pub apis: Vec<String>,
    pub placeholders: usize,
}

/// Resolves `(title, episode)` to a playable URL.
pub struct EpisodeVideoResolver {
    apis: Vec<Arc<dyn DiscoveryApi>>,
    cache: ResolutionCache,
    placeholders: Vec<String>,
    api_timeout: Duration,
}

impl EpisodeVideoResolver {
    /// An empty `placeholders` pool falls back to the built-in samples.
    pub fn new(
        apis: Vec<Arc<dyn DiscoveryApi>>,
        placeholders: Vec<String>,
        cache_ttl: Duration,
        api_timeout: Duration,
    ) -> Self {
        let placeholders = if placeholders.is_empty() {
            DEFAULT_PLACEHOLDERS.iter().map(|s| s.to_string()).collect()
        } else {
            placeholders
        };
        Self {
            apis,
            cache: ResolutionCache::new(cache_ttl),
            placeholders,
            api_timeout,
        }
    }

    pub fn api_names(&self) -> Vec<&str> {
        self.apis.iter().map(|api| api.name()).collect()
    }

    /// Resolve through cache, discovery APIs, then placeholder.
    pub async fn resolve(&self, title: &str, episode: u32) -> ResolvedVideo {
        if let Some(mut hit) = self.cache.get(title, episode).await {
            debug!(title = title, episode = episode, "Resolution cache hit");
            metrics::RESOLVER_LOOKUPS.with_label_values(&["cache_hit"]).inc();
            hit.cached = true;
            return hit;
        }

        let secs = self.api_timeout.as_secs();
        let attempts: Vec<Attempt<'_, String, DiscoveryError>> = self
            .apis
            .iter()
            .map(|api| {
                let api = api.clone();
                let timeout = self.api_timeout;
                Attempt::new(api.name().to_string(), async move {
                    let result = match tokio::time::timeout(timeout, api.discover(title, episode)).await {
                        Ok(result) => result,
                        Err(_) => Err(DiscoveryError::Timeout {
                            api: api.name().to_string(),
                            secs,
                        }),
                    };
                    let usable = result.map(|urls| urls.into_iter().find(|u| is_usable(u)));
                    let label = match &usable {
                        Ok(Some(_)) => "hit",
                        Ok(None) => "empty",
                        Err(_) => "error",
                    };
                    metrics::DISCOVERY_API_CALLS
                        .with_label_values(&[api.name(), label])
                        .inc();
                    usable
                })
            })
            .collect();

        let outcome = first_success(attempts).await;
        let resolved = match outcome.resolved {
            Some(found) => {
                metrics::RESOLVER_LOOKUPS.with_label_values(&["api"]).inc();
                ResolvedVideo {
                    url: found.value,
                    source: VideoSource::Api {
                        name: found.strategy,
                    },
                    cached: false,
                }
            }
            None => {
                metrics::RESOLVER_LOOKUPS
                    .with_label_values(&["placeholder"])
                    .inc();
                let url = select_placeholder(&self.placeholders, title.trim(), episode)
                    .unwrap_or(DEFAULT_PLACEHOLDERS[0])
                    .to_string();
                info!(
                    title = title,
                    episode = episode,
                    failed_apis = outcome.failures.len(),
                    "No discovery API produced a source, using placeholder"
                );
                ResolvedVideo {
                    url,
                    source: VideoSource::Placeholder,
                    cached: false,
                }
            }
        };

        self.cache.put(title, episode, resolved.clone()).await;
        resolved
    }

    /// Playable URL for `(title, episode)`.
    pub async fn get_episode_video_url(&self, title: &str, episode: u32) -> String {
        self.resolve(title, episode).await.url
    }

    /// Operator-triggered cache clear. Returns the number of entries removed.
    pub async fn clear_cache(&self) -> usize {
        let removed = self.cache.clear().await;
        info!(removed = removed, "Resolution cache cleared");
        removed
    }

    pub async fn stats(&self) -> ResolverStats {
        ResolverStats {
            cache_entries: self.cache.len().await,
            cache_ttl_secs: self.cache.ttl().as_secs(),
            apis: self.apis.iter().map(|api| api.name().to_string()).collect(),
            placeholders: self.placeholders.len(),
        }
    }
}

fn is_usable(candidate: &str) -> bool {
    Url::parse(candidate.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
