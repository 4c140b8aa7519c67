//! Mock discovery API for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::resolver::{DiscoveryApi, DiscoveryError};

/// A recorded discovery call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDiscovery {
    pub title: String,
    pub episode: u32,
}

/// Mock implementation of the DiscoveryApi trait.
///
/// Returns the configured sources for every query, or fails with the
/// configured status. Calls are recorded, including failed ones.
#[derive(Debug)]
pub struct MockDiscoveryApi {
    name: String,
    sources: Arc<RwLock<Vec<String>>>,
    fail_status: Arc<RwLock<Option<u16>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    calls: Arc<RwLock<Vec<RecordedDiscovery>>>,
}

impl MockDiscoveryApi {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sources: Arc::new(RwLock::new(Vec::new())),
            fail_status: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn set_sources(&self, sources: Vec<String>) {
        *self.sources.write().await = sources;
    }

    /// Fail every call with an HTTP status error.
    pub async fn fail_with_status(&self, status: u16) {
        *self.fail_status.write().await = Some(status);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn calls(&self) -> Vec<RecordedDiscovery> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl DiscoveryApi for MockDiscoveryApi {
    fn name(&self) -> &str {
        &self.name
    }

    async fn discover(&self, title: &str, episode: u32) -> Result<Vec<String>, DiscoveryError> {
        self.calls.write().await.push(RecordedDiscovery {
            title: title.to_string(),
            episode,
        });

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(status) = *self.fail_status.read().await {
            return Err(DiscoveryError::Status { status });
        }
        Ok(self.sources.read().await.clone())
    }
}
