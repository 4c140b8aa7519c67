use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{animes, episodes, handlers, middleware::metrics_middleware, resolver};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Catalog
        .route("/sites", get(animes::list_sites))
        .route("/animes", get(animes::list_animes))
        .route(
            "/animes/{site_id}/{anime_id}/episodes",
            get(animes::list_episodes),
        )
        // Streams
        .route(
            "/episodes/{site_id}/{episode_id}/stream",
            get(episodes::get_stream),
        )
        // Video resolver
        .route("/resolve", get(resolver::resolve_video))
        .route("/resolve/stats", get(resolver::get_stats))
        .route("/resolve/cache", delete(resolver::clear_cache))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
