//! Match analysis report handler.

use axum::extract::State;
use axum::response::Json;
use std::time::{Duration, Instant};

use crate::matching::analysis::{self, MatchAnalysis};
use crate::state::AppState;
use crate::utils::log_if_slow;
use crate::web::error::{ApiError, db_error};

const SLOW_OP_THRESHOLD: Duration = Duration::from_millis(500);

/// `GET /api/analysis`
///
/// Aggregate statistics over the current match set: status counts, score
/// distribution per category, and the most frequently matched items.
pub(super) async fn get_analysis(
    State(state): State<AppState>,
) -> Result<Json<MatchAnalysis>, ApiError> {
    let start = Instant::now();
    let report = analysis::report(&state.db_pool)
        .await
        .map_err(|e| db_error("Analysis report", e))?;
    log_if_slow(start, SLOW_OP_THRESHOLD, "analysis_report");
    Ok(Json(report))
}
