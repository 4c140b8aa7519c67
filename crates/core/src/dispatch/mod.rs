//! Multi-site dispatch.
//!
//! The [`Aggregator`] owns the registered site descriptors and fans catalog
//! queries out to every site concurrently, isolating per-site failures.

mod aggregator;
mod dedup;

pub use aggregator::Aggregator;
pub use dedup::{dedup_by_title, normalize_title};

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::browser::BrowserError;
use crate::sites::CatalogEntry;

/// Combined catalog from one or more sites.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Deduplicated entries, in site-registration order.
    pub entries: Vec<CatalogEntry>,
    /// Failure message per site that produced no results.
    pub site_errors: BTreeMap<String, String>,
    pub duration_ms: u64,
}

/// Errors that escape the dispatch layer.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("Browser unavailable: {0}")]
    BrowserUnavailable(String),

    #[error("Scraping {site} timed out after {secs}s")]
    Timeout { site: String, secs: u64 },

    #[error(transparent)]
    Browser(#[from] BrowserError),
}
