//! Stream resolution handler.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::debug;

use anistream_core::StreamingData;

use super::error::{required, ApiError};
use super::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamParams {
    #[serde(default)]
    pub episode_url: Option<String>,
}

/// GET /episodes/{site_id}/{episode_id}/stream?episodeUrl=
///
/// Always answers with a playable URL or the watch page itself
/// (`external: true`); page failures never surface as errors.
pub async fn get_stream(
    State(state): State<Arc<AppState>>,
    Path((site_id, episode_id)): Path<(String, String)>,
    Query(params): Query<StreamParams>,
) -> Result<Json<DataResponse<StreamingData>>, ApiError> {
    let episode_url = required(params.episode_url, "episodeUrl")?;
    debug!(site = %site_id, episode = %episode_id, url = %episode_url, "Resolving stream");

    let data = state.aggregator().stream(&episode_url).await;
    Ok(Json(DataResponse::new(data)))
}
