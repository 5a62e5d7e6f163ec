//! Web API router construction.

use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::web::{admin, analysis, matches, status};

/// Creates the web server router
pub fn build_router(app_state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(status::health))
        .route("/status", get(status::status))
        .route("/users/{id}/matches", get(matches::list_matches))
        .route(
            "/matches/{user_id}/{matched_user_id}/{action}",
            post(matches::apply_match_action),
        )
        .route("/analysis", get(analysis::get_analysis))
        .route("/admin/rebuild", post(admin::trigger_rebuild))
        .with_state(app_state);

    Router::new().nest("/api", api_router).layer((
        TraceLayer::new_for_http(),
        CorsLayer::permissive(),
        CompressionLayer::new(),
        TimeoutLayer::new(Duration::from_secs(30)),
    ))
}
