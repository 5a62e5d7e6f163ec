//! The match set builder: runs the aggregator over the eligible cohort and
//! upserts recommendation rows.
//!
//! A pass is idempotent: re-running on an unchanged cohort rewrites the same
//! scores in place and never duplicates rows. Per-pair failures are isolated
//! and counted; one bad pair never aborts the pass.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

use crate::data::{connections, users};
use crate::matching::aggregate::{MatchWeights, aggregate};
use crate::matching::profile::{self, UserProfile};

/// Minimum total score a pair must reach to be recommended at all.
/// Zero-score pairs produce no row: users see "no match", not a 0.
const MIN_RECOMMEND_SCORE: i32 = 1;

/// Outcome counters for one builder pass.
#[derive(Debug, Default)]
pub struct MatchRunStats {
    /// Eligible users loaded for this pass.
    pub cohort_size: usize,
    /// Users whose stored profile normalized to nothing comparable.
    pub empty_profiles: usize,
    /// Unordered pairs evaluated.
    pub pairs_considered: usize,
    /// Pairs skipped because a direction is connected or recently created.
    pub pairs_skipped_existing: usize,
    /// Pairs scoring below [`MIN_RECOMMEND_SCORE`].
    pub pairs_below_threshold: usize,
    /// Pairs whose directed rows were written or refreshed.
    pub pairs_upserted: usize,
    /// Pairs whose write failed; logged individually, pass continued.
    pub failures: usize,
}

/// Enumerate canonical `(a, b)` pairs with `a < b`, excluding `skip`.
///
/// Self-pairs cannot occur by construction; the strict ordering also
/// guarantees each unordered pair appears exactly once.
pub fn pair_plan(user_ids: &[i32], skip: &HashSet<(i32, i32)>) -> Vec<(i32, i32)> {
    let mut seen = HashSet::new();
    let mut plan = Vec::new();
    for (i, &a) in user_ids.iter().enumerate() {
        for &b in &user_ids[i + 1..] {
            let pair = (a.min(b), a.max(b));
            if pair.0 == pair.1 || skip.contains(&pair) || !seen.insert(pair) {
                continue;
            }
            plan.push(pair);
        }
    }
    plan
}

/// Run a full matching pass over the eligible cohort.
///
/// `recent_window` controls how fresh an existing row must be for its pair
/// to be skipped instead of rescored.
#[instrument(skip(pool, weights))]
pub async fn run_match_pass(
    pool: &PgPool,
    weights: &MatchWeights,
    recent_window: Duration,
) -> Result<MatchRunStats> {
    let start = std::time::Instant::now();
    let mut stats = MatchRunStats::default();

    let cohort = users::get_eligible_for_matching(pool)
        .await
        .context("Failed to load eligible cohort")?;
    stats.cohort_size = cohort.len();

    if cohort.len() < 2 {
        info!(cohort = cohort.len(), "Cohort too small for matching, nothing to do");
        return Ok(stats);
    }

    // Normalization is total: a malformed profile degrades to an empty
    // attribute set, which scores zero against everyone and is skipped.
    let mut profiles: HashMap<i32, UserProfile> = HashMap::with_capacity(cohort.len());
    for user in &cohort {
        let normalized = profile::normalize(user.id, &user.profile);
        if normalized.is_empty() {
            stats.empty_profiles += 1;
            debug!(user_id = user.id, "Profile has no comparable attributes, pairs will score zero");
        }
        profiles.insert(user.id, normalized);
    }

    let recent_cutoff = Utc::now() - recent_window;
    let skip = connections::get_skip_pairs(pool, recent_cutoff)
        .await
        .context("Failed to load existing pair state")?;

    let user_ids: Vec<i32> = cohort.iter().map(|u| u.id).collect();
    let all_pairs = user_ids.len() * (user_ids.len() - 1) / 2;
    let plan = pair_plan(&user_ids, &skip);
    stats.pairs_skipped_existing = all_pairs - plan.len();

    for (a, b) in plan {
        stats.pairs_considered += 1;

        // The map is keyed from the same id list the plan was built from.
        let (Some(pa), Some(pb)) = (profiles.get(&a), profiles.get(&b)) else {
            continue;
        };

        let result = aggregate(pa, pb, weights);
        if result.total_score < MIN_RECOMMEND_SCORE {
            stats.pairs_below_threshold += 1;
            continue;
        }

        // Partial-failure isolation: report the pair and keep going.
        match connections::upsert_pair(pool, &result).await {
            Ok(()) => stats.pairs_upserted += 1,
            Err(e) => {
                stats.failures += 1;
                warn!(
                    user_id = a,
                    matched_user_id = b,
                    error = ?e,
                    "Failed to upsert pair, continuing pass"
                );
            }
        }
    }

    info!(
        cohort = stats.cohort_size,
        empty_profiles = stats.empty_profiles,
        considered = stats.pairs_considered,
        skipped_existing = stats.pairs_skipped_existing,
        below_threshold = stats.pairs_below_threshold,
        upserted = stats.pairs_upserted,
        failures = stats.failures,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Match pass complete"
    );

    if stats.failures > 0 {
        warn!(failures = stats.failures, "Match pass finished with isolated pair failures");
    }

    Ok(stats)
}
