//! Periodic background passes: the match builder and the saved-reset job.
//!
//! The scheduler wakes every 60 seconds, checks per-pass intervals, and runs
//! due passes in a spawned task so shutdown stays responsive. Last-run
//! timestamps are persisted to `app_kv` so restarts don't redo recent work.
//!
//! Passes for the same cohort are serialized here (a cycle is skipped while
//! the previous one is still running). Two racing processes updating the
//! same row could still lose one update; at this cadence that is accepted
//! rather than locked around.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Notify, broadcast};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

use crate::config::Config;
use crate::data::kv;
use crate::matching::aggregate::MatchWeights;
use crate::matching::{builder, lifecycle};

/// How often the scheduler wakes to evaluate pass intervals.
const WORK_INTERVAL: Duration = Duration::from_secs(60);

// app_kv keys for persisting pass timestamps across restarts.
pub const KV_MATCH_BUILD: &str = "scheduler.match_build";
pub const KV_SAVED_RESET: &str = "scheduler.saved_reset";

/// Convert a persisted UTC timestamp to an `Instant`, preserving remaining cooldown.
///
/// If the persisted time is older than `interval`, returns an `Instant` that
/// triggers immediate execution. If it's recent, the returned `Instant`
/// reflects how much time has actually elapsed so the remaining cooldown is
/// respected.
fn persisted_to_instant(persisted: Option<DateTime<Utc>>, interval: Duration) -> Instant {
    match persisted {
        None => Instant::now() - interval,
        Some(ts) => {
            let elapsed = (Utc::now() - ts).to_std().unwrap_or(interval);
            if elapsed >= interval {
                Instant::now() - interval
            } else {
                Instant::now() - elapsed
            }
        }
    }
}

/// Drives the match-build and saved-reset passes on their intervals.
pub struct Scheduler {
    pool: PgPool,
    weights: MatchWeights,
    match_interval: Duration,
    reset_interval: Duration,
    reset_window: chrono::Duration,
    recent_window: chrono::Duration,
    /// Manual match-rebuild trigger from the admin endpoint.
    rebuild_notify: Arc<Notify>,
}

impl Scheduler {
    pub fn new(pool: PgPool, config: &Config, rebuild_notify: Arc<Notify>) -> Self {
        Self {
            pool,
            weights: MatchWeights::default(),
            match_interval: Duration::from_secs(u64::from(config.match_build_interval_hours) * 3600),
            reset_interval: Duration::from_secs(u64::from(config.reset_check_interval_hours) * 3600),
            reset_window: chrono::Duration::days(i64::from(config.reset_window_days)),
            recent_window: chrono::Duration::hours(i64::from(config.recent_pair_hours)),
            rebuild_notify,
        }
    }

    /// Runs the scheduler's main loop with graceful shutdown support.
    ///
    /// On shutdown, in-progress work is cancelled via `CancellationToken`
    /// and given a short grace period before being abandoned.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("Scheduler service started");

        let mut next_run = time::Instant::now();
        let mut current_work: Option<(tokio::task::JoinHandle<()>, CancellationToken)> = None;
        let mut rebuild_requested = false;

        // Load persisted timestamps so we don't redo work that completed recently.
        let persisted_build = kv::get_timestamp(&self.pool, KV_MATCH_BUILD).await.unwrap_or(None);
        let persisted_reset = kv::get_timestamp(&self.pool, KV_SAVED_RESET).await.unwrap_or(None);

        if persisted_build.is_some() || persisted_reset.is_some() {
            info!(
                last_match_build = ?persisted_build,
                last_saved_reset = ?persisted_reset,
                "Loaded persisted scheduler timestamps"
            );
        }

        let mut last_match_build = persisted_to_instant(persisted_build, self.match_interval);
        let mut last_saved_reset = persisted_to_instant(persisted_reset, self.reset_interval);

        loop {
            tokio::select! {
                _ = self.rebuild_notify.notified() => {
                    info!("Match rebuild triggered manually via notify");
                    rebuild_requested = true;
                    next_run = time::Instant::now();
                    continue;
                }
                _ = time::sleep_until(next_run) => {
                    // Skip this cycle if the previous one is still running.
                    if let Some((ref handle, _)) = current_work
                        && !handle.is_finished()
                    {
                        trace!("Previous scheduling cycle still running, skipping");
                        next_run = time::Instant::now() + WORK_INTERVAL;
                        continue;
                    }

                    let should_build = rebuild_requested
                        || last_match_build.elapsed() >= self.match_interval;
                    let should_reset = last_saved_reset.elapsed() >= self.reset_interval;
                    rebuild_requested = false;

                    if !should_build && !should_reset {
                        next_run = time::Instant::now() + WORK_INTERVAL;
                        continue;
                    }

                    let cancel_token = CancellationToken::new();
                    let work_handle = tokio::spawn({
                        let pool = self.pool.clone();
                        let weights = self.weights.clone();
                        let reset_window = self.reset_window;
                        let recent_window = self.recent_window;
                        let cancel_token = cancel_token.clone();

                        async move {
                            tokio::select! {
                                _ = async {
                                    if should_build {
                                        match Self::run_match_build(&pool, &weights, recent_window).await {
                                            Ok(()) => {
                                                if let Err(e) = kv::set_timestamp(&pool, KV_MATCH_BUILD, Utc::now()).await {
                                                    warn!(error = ?e, "Failed to persist match build timestamp");
                                                }
                                            }
                                            Err(e) => error!(error = ?e, "Match build pass failed"),
                                        }
                                    }

                                    if should_reset {
                                        match lifecycle::run_reset(&pool, reset_window).await {
                                            Ok(_) => {
                                                if let Err(e) = kv::set_timestamp(&pool, KV_SAVED_RESET, Utc::now()).await {
                                                    warn!(error = ?e, "Failed to persist saved reset timestamp");
                                                }
                                            }
                                            Err(e) => error!(error = ?e, "Saved-reset pass failed"),
                                        }
                                    }
                                } => {}
                                _ = cancel_token.cancelled() => {
                                    trace!("Scheduling work cancelled gracefully");
                                }
                            }
                        }
                    });

                    // Update in-memory timestamps to prevent re-triggering
                    // while the spawned task is still running. The DB is
                    // updated on success inside the task above.
                    if should_build {
                        last_match_build = Instant::now();
                    }
                    if should_reset {
                        last_saved_reset = Instant::now();
                    }

                    current_work = Some((work_handle, cancel_token));
                    next_run = time::Instant::now() + WORK_INTERVAL;
                }
                _ = shutdown_rx.recv() => {
                    info!("Scheduler received shutdown signal");

                    if let Some((handle, cancel_token)) = current_work.take() {
                        cancel_token.cancel();

                        if tokio::time::timeout(Duration::from_secs(5), handle).await.is_err() {
                            warn!("Scheduling work did not complete within 5s, abandoning");
                        } else {
                            trace!("Scheduling work completed gracefully");
                        }
                    }

                    info!("Scheduler exiting gracefully");
                    break;
                }
            }
        }
    }

    async fn run_match_build(
        pool: &PgPool,
        weights: &MatchWeights,
        recent_window: chrono::Duration,
    ) -> Result<()> {
        info!("Starting match build pass");
        let stats = builder::run_match_pass(pool, weights, recent_window).await?;
        info!(
            cohort = stats.cohort_size,
            upserted = stats.pairs_upserted,
            failures = stats.failures,
            "Match build pass finished"
        );
        Ok(())
    }
}
