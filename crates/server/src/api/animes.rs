//! Catalog and episode-list handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use anistream_core::{CatalogEntry, EpisodeEntry};

use super::error::{required, ApiError};
use super::response::ListResponse;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListAnimesParams {
    #[serde(default)]
    pub q: Option<String>,
    /// Restrict the query to one registered site.
    #[serde(default)]
    pub site: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEpisodesParams {
    #[serde(default)]
    pub anime_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    pub id: String,
    pub name: String,
    pub base_url: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /animes?q=&site=
///
/// Query every registered site (or only `site`) and return the
/// deduplicated catalog. Failing sites are reported in `siteErrors`.
pub async fn list_animes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListAnimesParams>,
) -> Result<Json<ListResponse<CatalogEntry>>, ApiError> {
    let query = params.q.as_deref();
    let aggregator = state.aggregator();

    let result = match params.site.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(site_id) => aggregator.search_site(site_id, query).await?,
        None => aggregator.search_all_sites(query).await?,
    };

    Ok(Json(
        ListResponse::new(result.entries).with_site_errors(result.site_errors),
    ))
}

/// GET /animes/{site_id}/{anime_id}/episodes?animeUrl=
pub async fn list_episodes(
    State(state): State<Arc<AppState>>,
    Path((site_id, anime_id)): Path<(String, String)>,
    Query(params): Query<ListEpisodesParams>,
) -> Result<Json<ListResponse<EpisodeEntry>>, ApiError> {
    let anime_url = required(params.anime_url, "animeUrl")?;
    debug!(site = %site_id, anime = %anime_id, url = %anime_url, "Listing episodes");

    let episodes = state
        .aggregator()
        .episodes(&site_id, &anime_id, &anime_url)
        .await?;
    Ok(Json(ListResponse::new(episodes)))
}

/// GET /sites
pub async fn list_sites(State(state): State<Arc<AppState>>) -> Json<ListResponse<SiteSummary>> {
    let sites = state
        .aggregator()
        .sites()
        .iter()
        .map(|site| SiteSummary {
            id: site.id.clone(),
            name: site.name.clone(),
            base_url: site.base_url.clone(),
        })
        .collect();
    Json(ListResponse::new(sites))
}
