//! The connection lifecycle state machine and the periodic saved-reset job.
//!
//! ```text
//! recommended --save-->    saved
//! recommended --dismiss--> dismissed
//! saved       --dismiss--> dismissed
//! saved       --connect (mutual)--> connected   [terminal]
//! saved       --reset job, after idle window--> recommended
//! ```
//!
//! `connected` is terminal under every operation. The reset job reverts only
//! rows that are exactly `saved` and older than the window; the predicate is
//! deliberately narrow so `dismissed` rows can never be accidentally
//! revived.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use crate::data::connections;
use crate::data::models::ConnectionStatus;

/// An explicit user action on a directed recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    Save,
    Dismiss,
    Connect,
}

impl ConnectionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionAction::Save => "save",
            ConnectionAction::Dismiss => "dismiss",
            ConnectionAction::Connect => "connect",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "save" => Some(ConnectionAction::Save),
            "dismiss" => Some(ConnectionAction::Dismiss),
            "connect" => Some(ConnectionAction::Connect),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("no recommendation exists for user {user_id} -> {matched_user_id}")]
    NotFound { user_id: i32, matched_user_id: i32 },
    #[error("cannot {action} a recommendation in status {from}")]
    InvalidTransition {
        from: ConnectionStatus,
        action: &'static str,
    },
    #[error("connecting requires both users to have saved the recommendation")]
    MutualConsentRequired,
    #[error("stored status {0:?} is not a known lifecycle state")]
    CorruptStatus(String),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

/// Compute the successor status for an action, or reject the transition.
///
/// `Connect` validates only the local side here; the mutual requirement is
/// enforced transactionally in [`apply_action`].
pub fn next_status(
    current: ConnectionStatus,
    action: ConnectionAction,
) -> Result<ConnectionStatus, LifecycleError> {
    use ConnectionAction::*;
    use ConnectionStatus::*;

    match (current, action) {
        (Recommended, Save) => Ok(Saved),
        (Recommended, Dismiss) | (Saved, Dismiss) => Ok(Dismissed),
        (Saved, Connect) => Ok(Connected),
        (from, action) => Err(LifecycleError::InvalidTransition {
            from,
            action: action.as_str(),
        }),
    }
}

/// Whether the reset job applies to a record.
///
/// Exactly `saved` and idle past the window; every other status is exempt
/// regardless of age. This predicate is the mutual-connection safety
/// boundary: `connected` must never satisfy it.
pub fn reset_applies(
    status: ConnectionStatus,
    status_changed_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    status == ConnectionStatus::Saved && now - status_changed_at >= window
}

/// Row-lock order for a connect: both directed rows, lower user id first.
///
/// Both sides of a pair acquire locks in the same order, so two users
/// connecting with each other simultaneously serialize instead of
/// deadlocking.
fn lock_order(user_id: i32, matched_user_id: i32) -> [(i32, i32); 2] {
    if user_id < matched_user_id {
        [(user_id, matched_user_id), (matched_user_id, user_id)]
    } else {
        [(matched_user_id, user_id), (user_id, matched_user_id)]
    }
}

/// Apply a user action to a directed recommendation.
///
/// Runs in a single transaction. `Connect` locks both directed rows (in
/// canonical order, see [`lock_order`]) and flips them together, so a pair
/// can never end up half-connected.
#[instrument(skip(pool))]
pub async fn apply_action(
    pool: &PgPool,
    user_id: i32,
    matched_user_id: i32,
    action: ConnectionAction,
) -> Result<ConnectionStatus, LifecycleError> {
    let mut tx = pool.begin().await?;

    let (mine, reverse) = if action == ConnectionAction::Connect {
        let [first_key, second_key] = lock_order(user_id, matched_user_id);
        let first = connections::get_for_update(&mut *tx, first_key.0, first_key.1)
            .await
            .map_err(into_store_error)?;
        let second = connections::get_for_update(&mut *tx, second_key.0, second_key.1)
            .await
            .map_err(into_store_error)?;
        if first_key == (user_id, matched_user_id) {
            (first, Some(second))
        } else {
            (second, Some(first))
        }
    } else {
        let row = connections::get_for_update(&mut *tx, user_id, matched_user_id)
            .await
            .map_err(into_store_error)?;
        (row, None)
    };

    let (row_id, status_str) = mine.ok_or(LifecycleError::NotFound {
        user_id,
        matched_user_id,
    })?;
    let current = ConnectionStatus::parse(&status_str)
        .ok_or_else(|| LifecycleError::CorruptStatus(status_str.clone()))?;

    let next = next_status(current, action)?;

    if let Some(reverse) = reverse {
        // Mutual consent: the reverse direction must also be saved.
        match reverse {
            Some((reverse_id, reverse_status))
                if ConnectionStatus::parse(&reverse_status) == Some(ConnectionStatus::Saved) =>
            {
                connections::set_status(&mut *tx, reverse_id, ConnectionStatus::Connected)
                    .await
                    .map_err(into_store_error)?;
            }
            _ => return Err(LifecycleError::MutualConsentRequired),
        }
    }

    connections::set_status(&mut *tx, row_id, next)
        .await
        .map_err(into_store_error)?;
    tx.commit().await?;

    info!(
        user_id,
        matched_user_id,
        action = action.as_str(),
        from = current.as_str(),
        to = next.as_str(),
        "Connection lifecycle transition"
    );
    Ok(next)
}

/// Revert stale `saved` recommendations to `recommended`.
///
/// Idempotent: a second run in the same window finds nothing eligible
/// (reverted rows carry a fresh `status_changed_at`). Returns the number of
/// rows reverted.
#[instrument(skip(pool))]
pub async fn run_reset(pool: &PgPool, window: Duration) -> anyhow::Result<u64> {
    let now = Utc::now();
    let saved = connections::list_saved(pool)
        .await
        .context("Failed to load saved recommendations")?;

    let stale: Vec<i32> = saved
        .iter()
        .filter(|row| reset_applies(ConnectionStatus::Saved, row.status_changed_at, now, window))
        .map(|row| row.id)
        .collect();

    if stale.is_empty() {
        debug!(saved = saved.len(), "No stale saved recommendations to reset");
        return Ok(0);
    }

    let reverted = connections::reset_to_recommended(pool, &stale)
        .await
        .context("Failed to reset stale saved recommendations")?;

    info!(
        saved = saved.len(),
        stale = stale.len(),
        reverted,
        window_days = window.num_days(),
        "Saved-reset pass complete"
    );
    Ok(reverted)
}

fn into_store_error(e: anyhow::Error) -> LifecycleError {
    match e.downcast::<sqlx::Error>() {
        Ok(db) => LifecycleError::Store(db),
        Err(other) => LifecycleError::Store(sqlx::Error::Protocol(other.to_string())),
    }
}
