//! Page acquisition.
//!
//! This module provides a `PageSource` trait that loads a URL into a
//! rendered HTML snapshot. The production implementation drives a shared
//! headless Chromium over the DevTools protocol; tests substitute
//! [`crate::testing::MockPageSource`].

mod chromium;

pub use chromium::ChromiumBrowser;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Desktop user agent presented by pages and replayed in stream headers.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Rendered snapshot of a page after navigation and settle delay.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// URL that was requested.
    pub requested_url: String,
    /// URL after redirects.
    pub final_url: String,
    /// Serialized DOM.
    pub html: String,
    /// `currentSrc` of the first `<video>` element, when the page has one.
    pub media_src: Option<String>,
}

impl LoadedPage {
    /// Snapshot with no redirects and no live media state.
    pub fn from_html(url: &str, html: impl Into<String>) -> Self {
        Self {
            requested_url: url.to_string(),
            final_url: url.to_string(),
            html: html.into(),
            media_src: None,
        }
    }

    /// Base URL for resolving relative links.
    pub fn base_url(&self) -> Option<Url> {
        Url::parse(&self.final_url)
            .or_else(|_| Url::parse(&self.requested_url))
            .ok()
    }
}

/// Errors that can occur while acquiring a page.
#[derive(Debug, Clone, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("Browser has been shut down")]
    ShutDown,
}

impl BrowserError {
    /// Whether the browser itself is unavailable, as opposed to one page
    /// misbehaving.
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, BrowserError::Launch(_) | BrowserError::ShutDown)
    }
}

/// Trait for page acquisition backends.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Navigate to `url` and return the rendered snapshot.
    async fn load(&self, url: &str) -> Result<LoadedPage, BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_prefers_final_url() {
        let mut page = LoadedPage::from_html("https://a.example/x", "");
        page.final_url = "https://b.example/y".to_string();
        assert_eq!(page.base_url().unwrap().host_str(), Some("b.example"));
    }

    #[test]
    fn test_base_url_falls_back_to_requested() {
        let mut page = LoadedPage::from_html("https://a.example/x", "");
        page.final_url = "not a url".to_string();
        assert_eq!(page.base_url().unwrap().host_str(), Some("a.example"));
    }

    #[test]
    fn test_launch_failure_classification() {
        assert!(BrowserError::Launch("no chrome".into()).is_launch_failure());
        assert!(BrowserError::ShutDown.is_launch_failure());
        assert!(!BrowserError::Navigation("dns".into()).is_launch_failure());
        assert!(!BrowserError::Timeout {
            url: "https://x".into(),
            secs: 30
        }
        .is_launch_failure());
    }
}
