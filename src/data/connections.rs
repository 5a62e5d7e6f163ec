//! Query functions for the `connection_flow` table.
//!
//! Each unordered user pair is stored as two directed rows so both users own
//! an independent lifecycle over the same underlying score.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use std::collections::HashSet;

use crate::data::models::{AnalysisRow, ConnectionStatus, FeedRow, SavedRow};
use crate::matching::aggregate::CompatibilityResult;

/// Upsert both directed rows for a computed pair result, atomically.
///
/// Rows in `recommended` or `saved` are refreshed in place (score, reasons,
/// breakdown); `dismissed` and `connected` rows are left untouched so a
/// rebuild can never resurrect a dismissal or overwrite a connection.
pub async fn upsert_pair(pool: &PgPool, result: &CompatibilityResult) -> Result<()> {
    let breakdown = serde_json::to_value(&result.category_scores)
        .context("Failed to serialize score breakdown")?;

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    for (user_id, matched_user_id) in [
        (result.user_a, result.user_b),
        (result.user_b, result.user_a),
    ] {
        sqlx::query(
            r#"
            INSERT INTO connection_flow
                (user_id, matched_user_id, compatibility_score, match_reasons, score_breakdown)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, matched_user_id) DO UPDATE
            SET compatibility_score = EXCLUDED.compatibility_score,
                match_reasons = EXCLUDED.match_reasons,
                score_breakdown = EXCLUDED.score_breakdown,
                updated_at = now()
            WHERE connection_flow.status IN ('recommended', 'saved')
            "#,
        )
        .bind(user_id)
        .bind(matched_user_id)
        .bind(result.total_score)
        .bind(&result.reasons)
        .bind(&breakdown)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await.context("Failed to commit pair upsert")?;
    Ok(())
}

/// Load canonical `(min, max)` pairs the builder must skip: pairs connected
/// in either direction, and pairs created after `recent_cutoff`.
pub async fn get_skip_pairs(
    pool: &PgPool,
    recent_cutoff: DateTime<Utc>,
) -> Result<HashSet<(i32, i32)>> {
    let rows: Vec<(i32, i32)> = sqlx::query_as(
        "SELECT user_id, matched_user_id FROM connection_flow \
         WHERE status = 'connected' OR created_at > $1",
    )
    .bind(recent_cutoff)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(a, b)| (a.min(b), a.max(b)))
        .collect())
}

/// A user's recommendation feed, best matches first.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: i32,
    status: Option<ConnectionStatus>,
    limit: i64,
) -> Result<Vec<FeedRow>> {
    let rows: Vec<FeedRow> = sqlx::query_as(
        r#"
        SELECT cf.matched_user_id, u.display_name, cf.compatibility_score,
               cf.match_reasons, cf.status, cf.created_at, cf.status_changed_at
        FROM connection_flow cf
        JOIN users u ON u.id = cf.matched_user_id
        WHERE cf.user_id = $1
          AND ($2::text IS NULL OR cf.status = $2)
        ORDER BY cf.compatibility_score DESC, cf.matched_user_id ASC
        LIMIT $3
        "#,
    )
    .bind(user_id)
    .bind(status.map(|s| s.as_str()))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch one directed row's id and status, locking it for the transaction.
pub async fn get_for_update(
    conn: &mut PgConnection,
    user_id: i32,
    matched_user_id: i32,
) -> Result<Option<(i32, String)>> {
    let row: Option<(i32, String)> = sqlx::query_as(
        "SELECT id, status FROM connection_flow \
         WHERE user_id = $1 AND matched_user_id = $2 \
         FOR UPDATE",
    )
    .bind(user_id)
    .bind(matched_user_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Set a row's status, stamping `status_changed_at`.
pub async fn set_status(conn: &mut PgConnection, id: i32, status: ConnectionStatus) -> Result<()> {
    sqlx::query(
        "UPDATE connection_flow \
         SET status = $2, status_changed_at = now(), updated_at = now() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(status.as_str())
    .execute(conn)
    .await?;
    Ok(())
}

/// All rows currently in `saved`, for the reset job.
pub async fn list_saved(pool: &PgPool) -> Result<Vec<SavedRow>> {
    let rows: Vec<SavedRow> = sqlx::query_as(
        "SELECT id, status_changed_at FROM connection_flow WHERE status = 'saved'",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Revert the given rows to `recommended`.
///
/// The `status = 'saved'` guard is repeated here so a row whose status
/// changed between selection and update is never reverted.
pub async fn reset_to_recommended(pool: &PgPool, ids: &[i32]) -> Result<u64> {
    let affected = sqlx::query(
        "UPDATE connection_flow \
         SET status = 'recommended', status_changed_at = now(), updated_at = now() \
         WHERE id = ANY($1) AND status = 'saved'",
    )
    .bind(ids)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(affected)
}

/// All directed rows with their score breakdowns, for the analysis report.
pub async fn list_for_analysis(pool: &PgPool) -> Result<Vec<AnalysisRow>> {
    let rows: Vec<AnalysisRow> = sqlx::query_as(
        "SELECT user_id, matched_user_id, status, score_breakdown FROM connection_flow",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
