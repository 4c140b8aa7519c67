//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Multi-site dispatch (per-site scrape outcomes and latency)
//! - Stream resolution (which strategy produced the URL)
//! - Client-side resolver (cache hits, discovery APIs, placeholders)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Dispatch
// =============================================================================

/// Site scrapes total by site and outcome.
pub static SITE_SCRAPES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("anistream_site_scrapes_total", "Total site scrapes"),
        &["site", "outcome"], // "success", "timeout", "error"
    )
    .unwrap()
});

/// Site scrape duration in seconds.
pub static SITE_SCRAPE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "anistream_site_scrape_duration_seconds",
            "Duration of one site scrape including navigation",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 45.0, 60.0]),
        &["site"],
    )
    .unwrap()
});

/// Catalog entries returned per site scrape.
pub static CATALOG_ENTRIES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "anistream_catalog_entries",
            "Catalog entries extracted per site scrape",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 15.0, 20.0]),
        &["site"],
    )
    .unwrap()
});

// =============================================================================
// Stream resolution
// =============================================================================

/// Stream resolutions by winning strategy.
pub static STREAM_RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "anistream_stream_resolutions_total",
            "Watch-page stream resolutions",
        ),
        &["source"], // "video", "iframe", "script", "external"
    )
    .unwrap()
});

// =============================================================================
// Client resolver
// =============================================================================

/// Episode video lookups by outcome.
pub static RESOLVER_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("anistream_resolver_lookups_total", "Episode video lookups"),
        &["outcome"], // "cache_hit", "api", "placeholder"
    )
    .unwrap()
});

/// Discovery API calls by API and result.
pub static DISCOVERY_API_CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "anistream_discovery_api_calls_total",
            "Discovery API calls",
        ),
        &["api", "result"], // "hit", "empty", "error"
    )
    .unwrap()
});

/// Entries currently held in the resolution cache.
pub static RESOLVER_CACHE_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "anistream_resolver_cache_entries",
        "Entries in the resolution cache",
    )
    .unwrap()
});

/// All core metrics, for registration by the server.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SITE_SCRAPES.clone()),
        Box::new(SITE_SCRAPE_DURATION.clone()),
        Box::new(CATALOG_ENTRIES.clone()),
        Box::new(STREAM_RESOLUTIONS.clone()),
        Box::new(RESOLVER_LOOKUPS.clone()),
        Box::new(DISCOVERY_API_CALLS.clone()),
        Box::new(RESOLVER_CACHE_ENTRIES.clone()),
    ]
}
