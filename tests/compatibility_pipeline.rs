//! End-to-end test of the pure compatibility pipeline: raw profile JSON in,
//! persisted-shape results and lifecycle decisions out. No database.

use chrono::{Duration, Utc};
use serde_json::json;

use kindred::data::models::{AnalysisRow, ConnectionStatus};
use kindred::matching::aggregate::{CategoryContribution, MatchWeights, aggregate};
use kindred::matching::analysis::summarize;
use kindred::matching::builder::pair_plan;
use kindred::matching::lifecycle::{ConnectionAction, next_status, reset_applies};
use kindred::matching::profile::normalize;

fn alice() -> serde_json::Value {
    json!({
        "interests": ["AI", "Golf", "Photography"],
        "goals": ["find a mentor"],
        "industry": "Technology",
        "organizations_current": ["Acme Corp"],
        "organizations_interested": ["Rotary Club"],
        "headline": "Machine learning engineer",
        "bio": "Building recommendation systems for healthcare."
    })
}

fn bob() -> serde_json::Value {
    json!({
        "interests": ["ai", "tennis"],
        "goals": ["mentor others"],
        "industry": "technology",
        "organizations_current": ["Rotary Club"],
        "headline": "Healthcare data consultant"
    })
}

#[test]
fn pipeline_produces_scored_pair_with_reasons() {
    let a = normalize(1, &alice());
    let b = normalize(2, &bob());
    let weights = MatchWeights::default();

    let result = aggregate(&a, &b, &weights);

    // Shared interest, complementary goals, equal industry, overlapping
    // organizations, and shared "healthcare" keyword all contribute.
    assert!(result.total_score > 0);
    assert!(result.total_score <= 100);
    assert_eq!(result.user_a, 1);
    assert_eq!(result.user_b, 2);
    assert!(!result.reasons.is_empty());
    assert!(result.reasons.len() <= 3);

    // Argument order must not matter.
    let flipped = aggregate(&b, &a, &weights);
    assert_eq!(flipped.total_score, result.total_score);
    assert_eq!(flipped.reasons, result.reasons);
}

#[test]
fn pipeline_breakdown_round_trips_through_storage_shape() {
    let a = normalize(1, &alice());
    let b = normalize(2, &bob());
    let result = aggregate(&a, &b, &MatchWeights::default());

    // The builder persists category_scores as JSONB; the analysis reader
    // must be able to consume exactly that value.
    let stored = serde_json::to_value(&result.category_scores).unwrap();
    let reread: Vec<CategoryContribution> = serde_json::from_value(stored.clone()).unwrap();
    assert_eq!(reread.len(), result.category_scores.len());

    let rows = vec![
        AnalysisRow {
            user_id: 1,
            matched_user_id: 2,
            status: "recommended".to_string(),
            score_breakdown: stored.clone(),
        },
        AnalysisRow {
            user_id: 2,
            matched_user_id: 1,
            status: "saved".to_string(),
            score_breakdown: stored,
        },
    ];
    let report = summarize(&rows);
    assert_eq!(report.total_pairs, 1);
    assert_eq!(report.status_counts.get("recommended"), Some(&1));
    assert_eq!(report.status_counts.get("saved"), Some(&1));
    assert_eq!(report.unreadable_breakdowns, 0);
    assert!(!report.top_matched_items.is_empty());
}

#[test]
fn pipeline_plans_each_unordered_pair_once() {
    let mut skip = std::collections::HashSet::new();
    skip.insert((1, 3));

    let pairs = pair_plan(&[3, 1, 2], &skip);
    assert_eq!(pairs.len(), 2);
    assert!(!pairs.contains(&(1, 3)));
    assert!(pairs.contains(&(1, 2)));
    assert!(pairs.contains(&(2, 3)));
    for (a, b) in &pairs {
        assert!(a < b);
    }
}

#[test]
fn lifecycle_walks_save_then_connect() {
    let saved = next_status(ConnectionStatus::Recommended, ConnectionAction::Save).unwrap();
    assert_eq!(saved, ConnectionStatus::Saved);

    let connected = next_status(saved, ConnectionAction::Connect).unwrap();
    assert_eq!(connected, ConnectionStatus::Connected);

    // Connected is terminal.
    assert!(next_status(connected, ConnectionAction::Dismiss).is_err());
    assert!(next_status(connected, ConnectionAction::Save).is_err());
}

#[test]
fn reset_window_only_touches_stale_saved_rows() {
    let now = Utc::now();
    let window = Duration::days(7);

    let stale = now - Duration::days(8);
    let fresh = now - Duration::days(2);

    assert!(reset_applies(ConnectionStatus::Saved, stale, now, window));
    assert!(!reset_applies(ConnectionStatus::Saved, fresh, now, window));
    assert!(!reset_applies(ConnectionStatus::Dismissed, stale, now, window));
    assert!(!reset_applies(ConnectionStatus::Connected, stale, now, window));
}
