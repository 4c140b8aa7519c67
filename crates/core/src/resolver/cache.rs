use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::ResolvedVideo;
use crate::metrics;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    title: String,
    episode: u32,
}

impl CacheKey {
    fn new(title: &str, episode: u32) -> Self {
        Self {
            title: title.trim().to_string(),
            episode,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: ResolvedVideo,
    fetched_at: Instant,
}

/// TTL-bounded map from `(title, episode)` to a resolved video.
///
/// Expired entries read as absent and are overwritten by the next
/// resolution; only [`ResolutionCache::clear`] removes them.
#[derive(Debug)]
pub struct ResolutionCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ResolutionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `(title, episode)`, if any.
    pub async fn get(&self, title: &str, episode: u32) -> Option<ResolvedVideo> {
        let entries = self.entries.read().await;
        entries
            .get(&CacheKey::new(title, episode))
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Store `value` stamped with the current instant.
    pub async fn put(&self, title: &str, episode: u32, value: ResolvedVideo) {
        let mut entries = self.entries.write().await;
        entries.insert(
            CacheKey::new(title, episode),
            CacheEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
        metrics::RESOLVER_CACHE_ENTRIES.set(entries.len() as i64);
    }

    /// Remove every entry. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        metrics::RESOLVER_CACHE_ENTRIES.set(0);
        removed
    }

    /// Number of stored entries, including expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
