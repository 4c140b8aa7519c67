//! Mock page source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::browser::{BrowserError, LoadedPage, PageSource};

/// Mock implementation of the PageSource trait.
///
/// Provides controllable behavior for testing:
/// - Serve canned HTML per URL
/// - Simulate navigation errors, slow pages and launch failures
/// - Track requested URLs for assertions
///
/// Unknown URLs fail with [`BrowserError::Navigation`].
///
/// # Example
///
/// ```rust,ignore
/// use anistream_core::testing::{MockPageSource, fixtures};
///
/// let source = MockPageSource::new();
/// source.set_html("https://alpha.example/list", fixtures::catalog_page(&[("Naruto", "/n")])).await;
///
/// let page = source.load("https://alpha.example/list").await?;
/// assert_eq!(source.requests().await.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockPageSource {
    /// Configured pages by URL.
    pages: Arc<RwLock<HashMap<String, LoadedPage>>>,
    /// Configured errors by URL.
    errors: Arc<RwLock<HashMap<String, BrowserError>>>,
    /// Simulated navigation delays by URL.
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    /// Recorded requests, including failed ones.
    requests: Arc<RwLock<Vec<String>>>,
    /// Remaining loads that fail as if the browser could not start.
    launch_failures: AtomicUsize,
}

impl MockPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url`, with no redirect.
    pub async fn set_html(&self, url: &str, html: impl Into<String>) {
        self.set_page(LoadedPage::from_html(url, html)).await;
    }

    /// Serve a fully specified snapshot for its `requested_url`.
    pub async fn set_page(&self, page: LoadedPage) {
        self.pages
            .write()
            .await
            .insert(page.requested_url.clone(), page);
    }

    /// Fail loads of `url` with `error`.
    pub async fn set_error(&self, url: &str, error: BrowserError) {
        self.errors.write().await.insert(url.to_string(), error);
    }

    /// Delay loads of `url` before answering.
    pub async fn set_delay(&self, url: &str, delay: Duration) {
        self.delays.write().await.insert(url.to_string(), delay);
    }

    /// Fail the next `count` loads with [`BrowserError::Launch`].
    pub fn fail_launches(&self, count: usize) {
        self.launch_failures.store(count, Ordering::SeqCst);
    }

    /// URLs requested so far, in order.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    /// Clear recorded requests.
    pub async fn clear_requests(&self) {
        self.requests.write().await.clear();
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load(&self, url: &str) -> Result<LoadedPage, BrowserError> {
        self.requests.write().await.push(url.to_string());

        let launch_failed = self
            .launch_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if launch_failed {
            return Err(BrowserError::Launch("mock launch failure".to_string()));
        }

        let delay = self.delays.read().await.get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.errors.read().await.get(url) {
            return Err(error.clone());
        }

        self.pages
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| BrowserError::Navigation(format!("mock has no page for {}", url)))
    }
}
