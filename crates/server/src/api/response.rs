//! Success envelopes shared by the API handlers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// `{ success, data: [..], count, timestamp }`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
    /// Per-site failures of a catalog query.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub site_errors: BTreeMap<String, String>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
            timestamp: Utc::now(),
            site_errors: BTreeMap::new(),
        }
    }

    pub fn with_site_errors(mut self, site_errors: BTreeMap<String, String>) -> Self {
        self.site_errors = site_errors;
        self
    }
}

/// `{ success, data, timestamp }`
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
        }
    }
}
