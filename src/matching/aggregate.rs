//! Weighted aggregation of category scores into a single compatibility
//! result.
//!
//! `total_score = round(100 * Σ(w_c * s_c) / Σ w_c)` over a fixed weight
//! table. The table is configuration: weights may be retuned without
//! touching the aggregation contract. Aggregation is pure and deterministic,
//! which is what makes recomputation idempotent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::matching::MatchError;
use crate::matching::category::{CategoryScore, MatchCategory, score_category};
use crate::matching::profile::UserProfile;

/// Maximum number of human-readable reasons attached to a result.
pub const REASON_CAP: usize = 3;

/// Default category weights.
///
/// Interests and goals dominate because they are the signals users fill in
/// deliberately; keywords are derived from free text and weighted below
/// them; industry equality is a weak single-bit signal.
pub const DEFAULT_WEIGHTS: &[(&str, f32)] = &[
    ("interests", 0.30),
    ("goals", 0.25),
    ("organizations", 0.20),
    ("keywords", 0.15),
    ("industry", 0.10),
];

/// A validated category weight table.
///
/// Iteration order is the table's declaration order, which doubles as the
/// stable tie-break when ranking category contributions.
#[derive(Debug, Clone)]
pub struct MatchWeights {
    weights: IndexMap<MatchCategory, f32>,
}

impl Default for MatchWeights {
    fn default() -> Self {
        let mut weights = IndexMap::new();
        weights.insert(MatchCategory::Interests, 0.30);
        weights.insert(MatchCategory::Goals, 0.25);
        weights.insert(MatchCategory::Organizations, 0.20);
        weights.insert(MatchCategory::Keywords, 0.15);
        weights.insert(MatchCategory::Industry, 0.10);
        Self { weights }
    }
}

impl MatchWeights {
    /// Build a weight table from `(category name, weight)` pairs.
    ///
    /// Unknown category names and negative weights are configuration errors
    /// and fail loudly; they are never silently skipped.
    pub fn from_pairs(pairs: &[(&str, f32)]) -> Result<Self, MatchError> {
        let mut weights = IndexMap::new();
        for &(name, weight) in pairs {
            let category = MatchCategory::parse(name)
                .ok_or_else(|| MatchError::InvalidCategory(name.to_string()))?;
            if weight < 0.0 {
                return Err(MatchError::InvalidWeight {
                    category: name.to_string(),
                    weight,
                });
            }
            weights.insert(category, weight);
        }
        Ok(Self { weights })
    }

    fn total_weight(&self) -> f32 {
        self.weights.values().sum()
    }
}

/// A scored category together with its weighted contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryContribution {
    #[serde(flatten)]
    pub score: CategoryScore,
    /// `weight * score`, the term this category adds to the total.
    pub weighted: f32,
}

/// The full compatibility result for one unordered user pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityResult {
    /// Canonical ordering: `user_a < user_b`.
    pub user_a: i32,
    pub user_b: i32,
    /// Weighted total in `[0, 100]`.
    pub total_score: i32,
    /// All scored categories, sorted by descending weighted contribution
    /// (ties broken by weight-table declaration order, stable).
    pub category_scores: Vec<CategoryContribution>,
    /// Top matched items across contributing categories, capped at
    /// [`REASON_CAP`].
    pub reasons: Vec<String>,
}

/// Compute the compatibility result for a pair of profiles.
pub fn aggregate(a: &UserProfile, b: &UserProfile, weights: &MatchWeights) -> CompatibilityResult {
    // Canonicalize so (a, b) and (b, a) produce identical results.
    let (first, second) = if a.user_id <= b.user_id { (a, b) } else { (b, a) };

    let mut contributions: Vec<CategoryContribution> = weights
        .weights
        .iter()
        .map(|(&category, &weight)| {
            let score = score_category(first, second, category);
            let weighted = weight * score.score;
            CategoryContribution { score, weighted }
        })
        .collect();

    let total_weight = weights.total_weight();
    let total_score = if total_weight > 0.0 {
        let weighted_sum: f32 = contributions.iter().map(|c| c.weighted).sum();
        (100.0 * weighted_sum / total_weight).round() as i32
    } else {
        0
    };

    // Stable sort keeps declaration order for equal contributions.
    contributions.sort_by(|x, y| {
        y.weighted
            .partial_cmp(&x.weighted)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Zero-score contributions are skipped, not a stop condition: a
    // zero-weight category with matches ties at weighted == 0 and may sort
    // after a zero-score one, but its items are still valid reasons.
    let mut reasons = Vec::new();
    'outer: for contribution in &contributions {
        if contribution.score.score <= 0.0 {
            continue;
        }
        for item in &contribution.score.matched_items {
            if reasons.len() >= REASON_CAP {
                break 'outer;
            }
            reasons.push(item.clone());
        }
    }

    CompatibilityResult {
        user_a: first.user_id,
        user_b: second.user_id,
        total_score: total_score.clamp(0, 100),
        category_scores: contributions,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::profile::normalize;
    use serde_json::json;

    fn profile(id: i32, raw: serde_json::Value) -> UserProfile {
        normalize(id, &raw)
    }

    #[test]
    fn test_single_category_worked_example() {
        // Jaccard(A, B) = 1/3 with interests as the only weighted category.
        let a = profile(1, json!({"interests": ["ai", "golf"]}));
        let b = profile(2, json!({"interests": ["ai", "tennis"]}));
        let weights = MatchWeights::from_pairs(&[("interests", 1.0)]).unwrap();

        let result = aggregate(&a, &b, &weights);
        assert_eq!(result.total_score, 33);
        assert_eq!(result.reasons, vec!["ai"]);
    }

    #[test]
    fn test_disjoint_profiles_score_zero_with_no_reasons() {
        let a = profile(1, json!({"interests": ["ai", "golf"]}));
        let b = profile(2, json!({"interests": ["tennis", "chess"]}));
        let result = aggregate(&a, &b, &MatchWeights::default());
        assert_eq!(result.total_score, 0);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_score_bounds() {
        let identical = json!({
            "interests": ["ai"],
            "goals": ["grow my network"],
            "industry": "tech",
            "organizations_current": ["acme"],
            "headline": "robotics engineering"
        });
        let a = profile(1, identical.clone());
        let b = profile(2, identical);
        let result = aggregate(&a, &b, &MatchWeights::default());
        assert_eq!(result.total_score, 100);

        let empty = aggregate(
            &profile(3, json!({})),
            &profile(4, json!({})),
            &MatchWeights::default(),
        );
        assert_eq!(empty.total_score, 0);
    }

    #[test]
    fn test_deterministic_and_symmetric() {
        let a = profile(
            7,
            json!({"interests": ["ai", "golf"], "goals": ["find a mentor"], "industry": "tech"}),
        );
        let b = profile(
            3,
            json!({"interests": ["ai"], "goals": ["mentor others"], "industry": "tech"}),
        );
        let weights = MatchWeights::default();

        let r1 = aggregate(&a, &b, &weights);
        let r2 = aggregate(&a, &b, &weights);
        let r3 = aggregate(&b, &a, &weights);

        assert_eq!(r1.total_score, r2.total_score);
        assert_eq!(r1.reasons, r2.reasons);
        // Canonical pair ordering makes argument order irrelevant.
        assert_eq!(r1.user_a, 3);
        assert_eq!(r1.user_b, 7);
        assert_eq!(r1.total_score, r3.total_score);
        assert_eq!(r1.reasons, r3.reasons);
    }

    #[test]
    fn test_reasons_ranked_by_weighted_contribution_and_capped() {
        let a = profile(
            1,
            json!({
                "interests": ["ai", "golf", "chess"],
                "industry": "tech",
                "organizations_current": ["acme", "rotary"]
            }),
        );
        let b = profile(
            2,
            json!({
                "interests": ["ai", "golf", "chess"],
                "industry": "tech",
                "organizations_current": ["acme", "rotary"]
            }),
        );
        let result = aggregate(&a, &b, &MatchWeights::default());

        // Interests (weight 0.30, score 1.0) outrank organizations and
        // industry, so its items fill the cap first.
        assert_eq!(result.reasons, vec!["ai", "golf", "chess"]);
        assert_eq!(result.reasons.len(), REASON_CAP);
        assert_eq!(
            result.category_scores[0].score.category,
            MatchCategory::Interests
        );
    }

    #[test]
    fn test_tie_break_follows_declaration_order() {
        // Industry and a custom-weighted keywords category contribute
        // equally; the earlier table entry must sort first.
        let a = profile(1, json!({"industry": "tech", "bio": "sailing"}));
        let b = profile(2, json!({"industry": "tech", "bio": "sailing"}));
        let weights = MatchWeights::from_pairs(&[("industry", 0.5), ("keywords", 0.5)]).unwrap();

        let result = aggregate(&a, &b, &weights);
        assert_eq!(
            result.category_scores[0].score.category,
            MatchCategory::Industry
        );
        assert_eq!(result.reasons, vec!["tech", "sailing"]);
    }

    #[test]
    fn test_zero_weight_category_still_contributes_reasons() {
        // Industry (weight 0.5) scores 0, interests (weight 0.0) score 1.0;
        // both contribute weighted 0 and industry sorts first by declaration
        // order. The shared interest must still surface as a reason.
        let a = profile(1, json!({"interests": ["ai"], "industry": "tech"}));
        let b = profile(2, json!({"interests": ["ai"], "industry": "retail"}));
        let weights = MatchWeights::from_pairs(&[("industry", 0.5), ("interests", 0.0)]).unwrap();

        let result = aggregate(&a, &b, &weights);
        assert_eq!(result.total_score, 0);
        assert_eq!(result.reasons, vec!["ai"]);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let err = MatchWeights::from_pairs(&[("astrology", 0.5)]).unwrap_err();
        assert!(matches!(err, MatchError::InvalidCategory(name) if name == "astrology"));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = MatchWeights::from_pairs(&[("interests", -0.1)]).unwrap_err();
        assert!(matches!(err, MatchError::InvalidWeight { .. }));
    }

    #[test]
    fn test_default_weights_match_published_table() {
        let from_table = MatchWeights::from_pairs(DEFAULT_WEIGHTS).unwrap();
        let default = MatchWeights::default();
        assert_eq!(from_table.weights, default.weights);
    }
}
