//! Environment-backed application configuration.

use serde::Deserialize;

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Seconds the app waits for services to drain on shutdown.
fn default_shutdown_timeout() -> u64 {
    10
}

/// Days a `saved` recommendation may sit idle before reverting.
fn default_reset_window_days() -> u32 {
    7
}

/// Hours between match build passes.
fn default_match_build_interval_hours() -> u32 {
    24
}

/// Hours between saved-reset checks. The reset window itself is
/// `reset_window_days`; checking more often than the window only makes the
/// revert land closer to the deadline.
fn default_reset_check_interval_hours() -> u32 {
    24
}

/// Hours within which an existing pair row is considered fresh and skipped
/// by the builder instead of rescored.
fn default_recent_pair_hours() -> u32 {
    144
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
    #[serde(default = "default_reset_window_days")]
    pub reset_window_days: u32,
    #[serde(default = "default_match_build_interval_hours")]
    pub match_build_interval_hours: u32,
    #[serde(default = "default_reset_check_interval_hours")]
    pub reset_check_interval_hours: u32,
    #[serde(default = "default_recent_pair_hours")]
    pub recent_pair_hours: u32,
}
