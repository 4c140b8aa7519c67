//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the anistream server:
//! - HTTP request metrics (latency, counts, in-flight)
//! - Core scrape and resolver metrics (registered from `anistream_core`)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;
use tracing::error;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
///
/// Scrape endpoints drive a real browser, so the buckets reach past the
/// per-site timeout.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "anistream_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.005, 0.025, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 45.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("anistream_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "anistream_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Core metrics (site scrapes, stream resolution, resolver chain)
    for metric in anistream_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Refresh gauges that are derived from application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let stats = state.resolver().stats().await;
    anistream_core::metrics::RESOLVER_CACHE_ENTRIES.set(stats.cache_entries as i64);
}

static ROUTE_WITH_IDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/(animes|episodes)/[^/]+/[^/]+/(episodes|stream)$").unwrap());

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace site and record ids with
/// placeholders).
pub fn normalize_path(path: &str) -> String {
    if let Some(caps) = ROUTE_WITH_IDS.captures(path) {
        let (resource, action) = (&caps[1], &caps[2]);
        let id_name = if resource == "animes" {
            "anime_id"
        } else {
            "episode_id"
        };
        return format!("/{}/{{site_id}}/{{{}}}/{}", resource, id_name, action);
    }
    NUMERIC_SEGMENT.replace_all(path, "/{id}$1").to_string()
}
