//! Row types shared across the data layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a directed connection recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Recommended,
    Saved,
    Dismissed,
    Connected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Recommended => "recommended",
            ConnectionStatus::Saved => "saved",
            ConnectionStatus::Dismissed => "dismissed",
            ConnectionStatus::Connected => "connected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "recommended" => Some(ConnectionStatus::Recommended),
            "saved" => Some(ConnectionStatus::Saved),
            "dismissed" => Some(ConnectionStatus::Dismissed),
            "connected" => Some(ConnectionStatus::Connected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user eligible for the matching pass.
#[derive(Debug, sqlx::FromRow)]
pub struct EligibleUser {
    pub id: i32,
    pub display_name: String,
    pub profile: serde_json::Value,
}

/// One entry of a user's recommendation feed, joined with the matched
/// user's display name.
#[derive(Debug, sqlx::FromRow)]
pub struct FeedRow {
    pub matched_user_id: i32,
    pub display_name: String,
    pub compatibility_score: i32,
    pub match_reasons: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub status_changed_at: DateTime<Utc>,
}

/// A directed connection row as loaded for the analysis report.
#[derive(Debug, sqlx::FromRow)]
pub struct AnalysisRow {
    pub user_id: i32,
    pub matched_user_id: i32,
    pub status: String,
    pub score_breakdown: serde_json::Value,
}

/// A `saved` row considered by the reset job.
#[derive(Debug, sqlx::FromRow)]
pub struct SavedRow {
    pub id: i32,
    pub status_changed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_status_round_trip() {
        for status in [
            ConnectionStatus::Recommended,
            ConnectionStatus::Saved,
            ConnectionStatus::Dismissed,
            ConnectionStatus::Connected,
        ] {
            assert_eq!(ConnectionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ConnectionStatus::parse("pending"), None);
    }
}
