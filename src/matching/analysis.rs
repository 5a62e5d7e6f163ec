//! Read-only aggregate statistics over persisted match results.
//!
//! Consumes the materialized `score_breakdown` column; never mutates. Score
//! statistics are computed over the canonical direction only
//! (`user_id < matched_user_id`) so each pair counts once, while status
//! counts cover every directed row.

use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::BTreeMap;

use crate::data::connections;
use crate::data::models::AnalysisRow;
use crate::matching::aggregate::CategoryContribution;

/// How many of the most frequent matched items the report includes.
const TOP_ITEM_LIMIT: usize = 10;

/// Aggregate contribution of one category across the cohort.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryStat {
    pub category: String,
    /// Pairs where this category contributed a non-zero score.
    pub matches: u64,
    /// Mean of this category's score across all scored pairs.
    pub avg_contribution: f32,
}

/// A matched item and how many pairs it appeared in.
#[derive(Debug, Clone, Serialize)]
pub struct ItemCount {
    pub item: String,
    pub count: u64,
}

/// The full analysis report.
#[derive(Debug, Clone, Serialize)]
pub struct MatchAnalysis {
    /// Unordered pairs with a persisted result.
    pub total_pairs: u64,
    /// Directed rows per lifecycle status.
    pub status_counts: BTreeMap<String, u64>,
    /// Per-category aggregate contribution, highest average first.
    pub categories: Vec<CategoryStat>,
    /// Most frequent matched items across all categories.
    pub top_matched_items: Vec<ItemCount>,
    /// Rows whose stored breakdown could not be read (excluded from score
    /// statistics).
    pub unreadable_breakdowns: u64,
}

/// Pure aggregation over loaded rows. An empty input yields a zeroed report.
pub fn summarize(rows: &[AnalysisRow]) -> MatchAnalysis {
    let mut status_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut total_pairs = 0u64;
    let mut unreadable = 0u64;
    let mut matches: BTreeMap<String, u64> = BTreeMap::new();
    let mut score_sums: BTreeMap<String, f64> = BTreeMap::new();
    let mut item_counts: BTreeMap<String, u64> = BTreeMap::new();

    for row in rows {
        *status_counts.entry(row.status.clone()).or_default() += 1;

        // Score statistics once per unordered pair.
        if row.user_id >= row.matched_user_id {
            continue;
        }
        total_pairs += 1;

        let contributions: Vec<CategoryContribution> =
            match serde_json::from_value(row.score_breakdown.clone()) {
                Ok(c) => c,
                Err(_) => {
                    unreadable += 1;
                    continue;
                }
            };

        for contribution in contributions {
            let name = contribution.score.category.as_str().to_string();
            *score_sums.entry(name.clone()).or_default() += f64::from(contribution.score.score);
            if contribution.score.score > 0.0 {
                *matches.entry(name).or_default() += 1;
                for item in contribution.score.matched_items {
                    *item_counts.entry(item).or_default() += 1;
                }
            }
        }
    }

    let scored_pairs = total_pairs.saturating_sub(unreadable);
    let mut categories: Vec<CategoryStat> = score_sums
        .iter()
        .map(|(name, sum)| CategoryStat {
            category: name.clone(),
            matches: matches.get(name).copied().unwrap_or(0),
            avg_contribution: if scored_pairs > 0 {
                (*sum / scored_pairs as f64) as f32
            } else {
                0.0
            },
        })
        .collect();
    categories.sort_by(|a, b| {
        b.avg_contribution
            .partial_cmp(&a.avg_contribution)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });

    let mut top_matched_items: Vec<ItemCount> = item_counts
        .into_iter()
        .map(|(item, count)| ItemCount { item, count })
        .collect();
    top_matched_items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.item.cmp(&b.item)));
    top_matched_items.truncate(TOP_ITEM_LIMIT);

    MatchAnalysis {
        total_pairs,
        status_counts,
        categories,
        top_matched_items,
        unreadable_breakdowns: unreadable,
    }
}

/// Load and summarize the current state of the match set.
pub async fn report(pool: &PgPool) -> Result<MatchAnalysis> {
    let rows = connections::list_for_analysis(pool).await?;
    Ok(summarize(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(user_id: i32, matched_user_id: i32, status: &str, breakdown: serde_json::Value) -> AnalysisRow {
        AnalysisRow {
            user_id,
            matched_user_id,
            status: status.to_string(),
            score_breakdown: breakdown,
        }
    }

    fn breakdown(entries: &[(&str, f32, &[&str])]) -> serde_json::Value {
        let arr: Vec<serde_json::Value> = entries
            .iter()
            .map(|(category, score, items)| {
                json!({
                    "category": category,
                    "score": score,
                    "matched_items": items,
                    "weighted": score * 0.3,
                })
            })
            .collect();
        json!(arr)
    }

    #[test]
    fn test_empty_cohort_yields_zeroed_report() {
        let report = summarize(&[]);
        assert_eq!(report.total_pairs, 0);
        assert!(report.status_counts.is_empty());
        assert!(report.categories.is_empty());
        assert!(report.top_matched_items.is_empty());
    }

    #[test]
    fn test_pairs_counted_once_statuses_counted_per_direction() {
        let b = breakdown(&[("interests", 0.5, &["ai"])]);
        let rows = vec![
            row(1, 2, "saved", b.clone()),
            row(2, 1, "recommended", b.clone()),
        ];
        let report = summarize(&rows);
        assert_eq!(report.total_pairs, 1);
        assert_eq!(report.status_counts.get("saved"), Some(&1));
        assert_eq!(report.status_counts.get("recommended"), Some(&1));
    }

    #[test]
    fn test_category_stats_and_top_items() {
        let rows = vec![
            row(1, 2, "recommended", breakdown(&[("interests", 0.5, &["ai", "golf"])])),
            row(1, 3, "recommended", breakdown(&[("interests", 0.25, &["ai"]), ("industry", 1.0, &["tech"])])),
            row(2, 3, "recommended", breakdown(&[("interests", 0.0, &[])])),
        ];
        let report = summarize(&rows);

        assert_eq!(report.total_pairs, 3);
        let interests = report
            .categories
            .iter()
            .find(|c| c.category == "interests")
            .unwrap();
        assert_eq!(interests.matches, 2);
        assert!((interests.avg_contribution - 0.25).abs() < 1e-6);

        assert_eq!(report.top_matched_items[0].item, "ai");
        assert_eq!(report.top_matched_items[0].count, 2);
    }

    #[test]
    fn test_unreadable_breakdown_tolerated() {
        let rows = vec![row(1, 2, "recommended", json!("garbage"))];
        let report = summarize(&rows);
        assert_eq!(report.total_pairs, 1);
        assert_eq!(report.unreadable_breakdowns, 1);
        assert!(report.top_matched_items.is_empty());
    }
}
