//! End-to-end tests with mocked external dependencies.
//!
//! These tests run the full server stack in-process with mock
//! implementations for page acquisition and video discovery.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use anistream_core::BrowserError;

use common::{fixtures, TestConfig, TestFixture, TEST_USER_AGENT};

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_endpoint_lists_site_ids() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.body["sites"],
        serde_json::json!(["alpha", "beta", "gamma"])
    );
    assert_eq!(response.body["resolver"]["service_url_configured"], false);
}

#[tokio::test]
async fn test_list_sites() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/sites").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["count"], 3);
    assert_eq!(response.body["data"][1]["id"], "beta");
    assert_eq!(response.body["data"][1]["baseUrl"], "https://beta.example/list");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/does/not/exist").await;

    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "Not Found");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/health").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("anistream_http_requests_total"));
}

// =============================================================================
// Catalog Tests
// =============================================================================

#[tokio::test]
async fn test_list_animes_aggregates_and_reports_failed_sites() {
    let fixture = TestFixture::new().await;
    fixture
        .pages
        .set_html(
            &fixtures::site("alpha").base_url,
            fixtures::catalog_page(&[("Naruto", "/anime/naruto"), ("Bleach", "/anime/bleach")]),
        )
        .await;
    fixture
        .pages
        .set_html(
            &fixtures::site("beta").base_url,
            fixtures::catalog_page(&[("NARUTO", "/a/naruto"), ("Frieren", "/a/frieren")]),
        )
        .await;
    // gamma has no page configured and fails to navigate

    let response = fixture.get("/animes").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["count"], 3);
    let titles: Vec<&str> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Naruto", "Bleach", "Frieren"]);
    assert_eq!(response.body["data"][0]["siteId"], "alpha");
    assert_eq!(
        response.body["data"][0]["url"],
        "https://alpha.example/anime/naruto"
    );
    assert!(response.body["siteErrors"]["gamma"].is_string());
    assert!(response.body["timestamp"].is_string());
}

#[tokio::test]
async fn test_list_animes_with_query_uses_search_template() {
    let fixture = TestFixture::new().await;
    let site = fixtures::site("beta");
    fixture
        .pages
        .set_html(
            &site.catalog_url(Some("one piece")),
            fixtures::catalog_page(&[("One Piece", "/a/one-piece")]),
        )
        .await;

    let response = fixture.get("/animes?q=one%20piece&site=beta").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["count"], 1);
    assert_eq!(response.body["data"][0]["id"], "beta-0");
    assert!(response.body.get("siteErrors").is_none());
    assert_eq!(
        fixture.pages.requests().await,
        vec!["https://beta.example/search?q=one%20piece".to_string()]
    );
}

#[tokio::test]
async fn test_list_animes_empty_is_success() {
    let fixture = TestFixture::with_config(TestConfig {
        sites: vec!["alpha".into()],
        ..TestConfig::default()
    })
    .await;
    fixture
        .pages
        .set_html(&fixtures::site("alpha").base_url, "<html><body></body></html>")
        .await;

    let response = fixture.get("/animes").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["count"], 0);
    assert_eq!(response.body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_list_animes_slow_site_does_not_block_others() {
    let fixture = TestFixture::with_config(TestConfig {
        site_timeout_secs: 1,
        ..TestConfig::default()
    })
    .await;
    for id in ["alpha", "beta"] {
        fixture
            .pages
            .set_html(
                &fixtures::site(id).base_url,
                fixtures::catalog_page(&[(format!("Show {}", id).as_str(), "/x")]),
            )
            .await;
    }
    fixture
        .pages
        .set_delay(&fixtures::site("gamma").base_url, Duration::from_secs(5))
        .await;

    let response = fixture.get("/animes").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["count"], 2);
    assert!(response.body["siteErrors"]["gamma"]
        .as_str()
        .unwrap()
        .contains("timed out"));
}

#[tokio::test]
async fn test_list_animes_browser_unavailable_is_500() {
    let fixture = TestFixture::new().await;
    fixture.pages.fail_launches(usize::MAX);

    let response = fixture.get("/animes").await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["message"], "An unexpected error occurred");
}

#[tokio::test]
async fn test_list_animes_unknown_site_is_404() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/animes?site=nowhere").await;

    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["message"], "Site not found: nowhere");
}

// =============================================================================
// Episode Tests
// =============================================================================

#[tokio::test]
async fn test_list_episodes_requires_anime_url() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/animes/alpha/alpha-0/episodes").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "Bad Request");
    assert_eq!(response.body["message"], "animeUrl is required");
}

#[tokio::test]
async fn test_list_episodes_sorted_by_number() {
    let fixture = TestFixture::new().await;
    fixture
        .pages
        .set_html(
            "https://alpha.example/anime/naruto",
            fixtures::episode_page(&[
                ("Episódio 3", "/watch/3"),
                ("Episódio 1 - Início", "/watch/1"),
                ("Episódio 2", "/watch/2"),
            ]),
        )
        .await;

    let response = fixture
        .get("/animes/alpha/alpha-0/episodes?animeUrl=https://alpha.example/anime/naruto")
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["count"], 3);
    let numbers: Vec<u64> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(response.body["data"][0]["id"], "alpha-alpha-0-ep-1");
    assert_eq!(response.body["data"][0]["url"], "https://alpha.example/watch/1");
    assert_eq!(response.body["data"][0]["duration"], "24:00");
}

#[tokio::test]
async fn test_list_episodes_failed_page_is_empty_success() {
    let fixture = TestFixture::new().await;
    fixture
        .pages
        .set_error(
            "https://alpha.example/anime/gone",
            BrowserError::Navigation("net::ERR_ABORTED".to_string()),
        )
        .await;

    let response = fixture
        .get("/animes/alpha/alpha-9/episodes?animeUrl=https://alpha.example/anime/gone")
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["count"], 0);
}

#[tokio::test]
async fn test_list_episodes_unknown_site_is_404() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .get("/animes/nowhere/x-0/episodes?animeUrl=https://x.example/a")
        .await;

    assert_status!(response, StatusCode::NOT_FOUND);
}

// =============================================================================
// Stream Tests
// =============================================================================

#[tokio::test]
async fn test_stream_requires_episode_url() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/episodes/alpha/alpha-0-ep-1/stream").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "episodeUrl is required");
}

#[tokio::test]
async fn test_stream_found_in_inline_script() {
    let fixture = TestFixture::new().await;
    fixture
        .pages
        .set_html(
            "https://alpha.example/watch/1",
            r#"<html><body><div id="player"></div>
            <script>var cfg = { file: "https:\/\/cdn.example\/hls\/ep1.m3u8" };</script>
            </body></html>"#,
        )
        .await;

    let response = fixture
        .get("/episodes/alpha/alpha-0-ep-1/stream?episodeUrl=https://alpha.example/watch/1")
        .await;

    assert_status!(response, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["streamingUrl"], "https://cdn.example/hls/ep1.m3u8");
    assert_eq!(data["external"], false);
    assert_eq!(data["source"], "script");
    assert_eq!(data["referer"], "https://alpha.example/watch/1");
    assert_eq!(data["headers"]["User-Agent"], TEST_USER_AGENT);
}

#[tokio::test]
async fn test_stream_on_empty_page_is_external() {
    let fixture = TestFixture::new().await;
    fixture
        .pages
        .set_html("https://alpha.example/watch/2", "<html><body><p>soon</p></body></html>")
        .await;

    let response = fixture
        .get("/episodes/alpha/alpha-0-ep-2/stream?episodeUrl=https://alpha.example/watch/2")
        .await;

    assert_status!(response, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["external"], true);
    assert_eq!(data["streamingUrl"], "https://alpha.example/watch/2");
    assert_eq!(data["headers"]["Referer"], "https://alpha.example/watch/2");
    assert!(data.get("error").is_none());
}

#[tokio::test]
async fn test_stream_navigation_failure_is_external_with_error() {
    let fixture = TestFixture::new().await;
    fixture
        .pages
        .set_error(
            "https://alpha.example/watch/3",
            BrowserError::Timeout {
                url: "https://alpha.example/watch/3".to_string(),
                secs: 30,
            },
        )
        .await;

    let response = fixture
        .get("/episodes/alpha/alpha-0-ep-3/stream?episodeUrl=https://alpha.example/watch/3")
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["external"], true);
    assert!(response.body["data"]["error"]
        .as_str()
        .unwrap()
        .contains("timed out"));
}

// =============================================================================
// Resolver Tests
// =============================================================================

#[tokio::test]
async fn test_resolve_uses_discovery_then_cache() {
    let fixture = TestFixture::new().await;
    fixture
        .discovery
        .set_sources(vec!["https://cdn.example/naruto/5.mp4".to_string()])
        .await;

    let first = fixture.get("/resolve?title=Naruto&episode=5").await;
    assert_status!(first, StatusCode::OK);
    assert_eq!(first.body["data"]["url"], "https://cdn.example/naruto/5.mp4");
    assert_eq!(first.body["data"]["source"]["type"], "api");
    assert_eq!(first.body["data"]["source"]["name"], "mock");
    assert_eq!(first.body["data"]["cached"], false);

    let second = fixture.get("/resolve?title=Naruto&episode=5").await;
    assert_eq!(second.body["data"]["cached"], true);
    assert_eq!(fixture.discovery.calls().await.len(), 1);

    let stats = fixture.get("/resolve/stats").await;
    assert_eq!(stats.body["data"]["cache_entries"], 1);

    let cleared = fixture.delete("/resolve/cache").await;
    assert_status!(cleared, StatusCode::OK);
    assert_eq!(cleared.body["data"]["removed"], 1);

    let third = fixture.get("/resolve?title=Naruto&episode=5").await;
    assert_eq!(third.body["data"]["cached"], false);
    assert_eq!(fixture.discovery.calls().await.len(), 2);
}

#[tokio::test]
async fn test_resolve_placeholder_is_deterministic() {
    let fixture = TestFixture::new().await;
    fixture.discovery.fail_with_status(503).await;

    let first = fixture.get("/resolve?title=Naruto&episode=5").await;
    fixture.delete("/resolve/cache").await;
    let second = fixture.get("/resolve?title=Naruto&episode=5").await;

    assert_status!(first, StatusCode::OK);
    assert_eq!(first.body["data"]["source"]["type"], "placeholder");
    assert_eq!(first.body["data"]["url"], second.body["data"]["url"]);
}

#[tokio::test]
async fn test_resolve_requires_parameters() {
    let fixture = TestFixture::new().await;

    let missing = fixture.get("/resolve?title=Naruto").await;
    assert_status!(missing, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["message"], "episode is required");

    let invalid = fixture.get("/resolve?title=Naruto&episode=five").await;
    assert_status!(invalid, StatusCode::BAD_REQUEST);
}
