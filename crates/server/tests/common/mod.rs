//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock dependencies injected, enabling comprehensive E2E testing
//! without a browser or external services.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use anistream_core::{
    testing::{MockDiscoveryApi, MockPageSource},
    Aggregator, Config, DiscoveryApi, EpisodeVideoResolver, ScraperConfig,
};

/// Re-export fixtures for test convenience
pub use anistream_core::testing::fixtures;

/// User agent the fixture's aggregator replays in stream headers.
pub const TEST_USER_AGENT: &str = "AnistreamTest/1.0";

/// Test fixture for E2E testing with mock dependencies.
///
/// Provides an in-process server with fully controllable mocks for:
/// - Page acquisition (MockPageSource), shared by all sites
/// - Video discovery (MockDiscoveryApi)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_catalog() {
///     let fixture = TestFixture::new().await;
///     fixture.pages.set_html(&fixtures::site("alpha").base_url, "...").await;
///
///     let response = fixture.get("/animes").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock page source - configure pages per URL
    pub pages: Arc<MockPageSource>,
    /// Mock discovery API - configure resolver sources
    pub discovery: Arc<MockDiscoveryApi>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with sites `alpha`, `beta` and `gamma`.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let pages = Arc::new(MockPageSource::new());
        let discovery = Arc::new(MockDiscoveryApi::new("mock"));

        let sites: Vec<_> = test_config
            .sites
            .iter()
            .map(|id| fixtures::site(id))
            .collect();

        let scraper = ScraperConfig {
            site_timeout_secs: test_config.site_timeout_secs,
            ..ScraperConfig::default()
        };

        let config = Config {
            sites: sites.clone(),
            scraper: scraper.clone(),
            ..Config::default()
        };

        let aggregator = Aggregator::new(sites, pages.clone(), scraper, TEST_USER_AGENT);

        let apis: Vec<Arc<dyn DiscoveryApi>> = vec![discovery.clone()];
        let resolver = EpisodeVideoResolver::new(
            apis,
            Vec::new(),
            Duration::from_secs(config.resolver.cache_ttl_secs),
            Duration::from_secs(1),
        );

        let state = Arc::new(anistream_server::state::AppState::new(
            config, aggregator, resolver,
        ));

        // Create router
        let router = anistream_server::api::create_router(state);

        Self {
            router,
            pages,
            discovery,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path).await
    }

    /// Send a GET request and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Registered site ids, in registration order
    pub sites: Vec<String>,
    /// Per-site scrape timeout
    pub site_timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            sites: vec!["alpha".into(), "beta".into(), "gamma".into()],
            site_timeout_secs: 2,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
