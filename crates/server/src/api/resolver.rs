//! Episode video resolver handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use anistream_core::{ResolvedVideo, ResolverStats};

use super::error::{required, ApiError};
use super::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub episode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub removed: usize,
}

/// GET /resolve?title=&episode=
pub async fn resolve_video(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveParams>,
) -> Result<Json<DataResponse<ResolvedVideo>>, ApiError> {
    let title = required(params.title, "title")?;
    let episode: u32 = required(params.episode, "episode")?
        .parse()
        .map_err(|_| ApiError::BadRequest("episode must be a non-negative integer".to_string()))?;

    let resolved = state.resolver().resolve(&title, episode).await;
    Ok(Json(DataResponse::new(resolved)))
}

/// GET /resolve/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<DataResponse<ResolverStats>> {
    Json(DataResponse::new(state.resolver().stats().await))
}

/// DELETE /resolve/cache
///
/// Operator-triggered clear of the resolution cache.
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
) -> Json<DataResponse<ClearCacheResponse>> {
    let removed = state.resolver().clear_cache().await;
    Json(DataResponse::new(ClearCacheResponse { removed }))
}
