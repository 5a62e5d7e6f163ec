//! Query functions for the `users` table.

use anyhow::Result;
use sqlx::PgPool;

use crate::data::models::EligibleUser;

/// Load the cohort eligible for a matching pass: active users with a stored
/// profile. Profile completeness beyond presence is judged by the
/// normalizer, which degrades unusable records to empty attribute sets.
pub async fn get_eligible_for_matching(pool: &PgPool) -> Result<Vec<EligibleUser>> {
    let rows: Vec<EligibleUser> = sqlx::query_as(
        "SELECT id, display_name, profile FROM users \
         WHERE is_active AND profile IS NOT NULL \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Check that a user exists and is active.
pub async fn exists_active(pool: &PgPool, user_id: i32) -> Result<bool> {
    let found: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 AND is_active")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}
