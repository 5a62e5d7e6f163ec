//! Administrative handlers.

use axum::extract::State;
use axum::response::Json;
use serde_json::{Value, json};
use tracing::info;

use crate::state::AppState;

/// `POST /api/admin/rebuild`
///
/// Wake the scheduler to run a match build immediately instead of waiting
/// for the next interval. Returns right away; the build runs in the
/// background.
pub(super) async fn trigger_rebuild(State(state): State<AppState>) -> Json<Value> {
    info!("Manual match rebuild requested");
    state.rebuild_notify.notify_one();
    Json(json!({
        "status": "scheduled",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
