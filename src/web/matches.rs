//! Recommendation feed and connection lifecycle handlers.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::data::models::ConnectionStatus;
use crate::data::{connections, users};
use crate::matching::lifecycle::{self, ConnectionAction};
use crate::state::AppState;
use crate::web::error::{ApiError, ApiErrorCode, db_error};

fn default_feed_limit() -> i64 {
    50
}

#[derive(Deserialize)]
pub struct FeedParams {
    pub status: Option<String>,
    #[serde(default = "default_feed_limit")]
    pub limit: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub matched_user_id: i32,
    pub display_name: String,
    pub compatibility_score: i32,
    pub match_reasons: Vec<String>,
    pub status: String,
    pub created_at: String,
    pub status_changed_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub user_id: i32,
    pub matches: Vec<FeedEntry>,
    pub count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub user_id: i32,
    pub matched_user_id: i32,
    pub status: ConnectionStatus,
}

/// `GET /api/users/{id}/matches`
///
/// A user's recommendation feed, best matches first. Optionally filtered to
/// a single lifecycle status.
pub(super) async fn list_matches(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Query(params): Query<FeedParams>,
) -> Result<Json<FeedResponse>, ApiError> {
    let status = match params.status.as_deref() {
        None => None,
        Some(raw) => Some(ConnectionStatus::parse(raw).ok_or_else(|| {
            ApiError::new(
                ApiErrorCode::InvalidStatus,
                format!("Unknown status '{raw}'. Valid: recommended, saved, dismissed, connected"),
            )
        })?),
    };
    let limit = params.limit.clamp(1, 500);

    let known = users::exists_active(&state.db_pool, user_id)
        .await
        .map_err(|e| db_error("User lookup", e))?;
    if !known {
        return Err(ApiError::new(
            ApiErrorCode::NotFound,
            format!("No active user with id {user_id}"),
        ));
    }

    let rows = connections::list_for_user(&state.db_pool, user_id, status, limit)
        .await
        .map_err(|e| db_error("Feed query", e))?;

    let matches: Vec<FeedEntry> = rows
        .into_iter()
        .map(|row| FeedEntry {
            matched_user_id: row.matched_user_id,
            display_name: row.display_name,
            compatibility_score: row.compatibility_score,
            match_reasons: row.match_reasons,
            status: row.status,
            created_at: row.created_at.to_rfc3339(),
            status_changed_at: row.status_changed_at.to_rfc3339(),
        })
        .collect();
    let count = matches.len();

    Ok(Json(FeedResponse {
        user_id,
        matches,
        count,
    }))
}

/// `POST /api/matches/{user_id}/{matched_user_id}/{action}`
///
/// Apply a lifecycle action (`save`, `dismiss`, `connect`) to one directed
/// recommendation. `connect` additionally requires the reverse direction to
/// be saved and flips both rows together.
pub(super) async fn apply_match_action(
    State(state): State<AppState>,
    Path((user_id, matched_user_id, action)): Path<(i32, i32, String)>,
) -> Result<Json<ActionResponse>, ApiError> {
    let action = ConnectionAction::parse(&action).ok_or_else(|| {
        ApiError::new(
            ApiErrorCode::InvalidAction,
            format!("Unknown action '{action}'. Valid: save, dismiss, connect"),
        )
    })?;

    let status = lifecycle::apply_action(&state.db_pool, user_id, matched_user_id, action).await?;

    Ok(Json(ActionResponse {
        user_id,
        matched_user_id,
        status,
    }))
}
