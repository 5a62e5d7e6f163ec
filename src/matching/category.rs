//! Per-category similarity scoring for a pair of normalized profiles.
//!
//! Each category yields a score in `[0, 1]` plus the literal matched values
//! that produced it, so every score the user sees can be explained.
//! Invariant: `matched_items` is empty exactly when `score == 0`.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::matching::profile::UserProfile;

/// Goal pairs considered complementary across two profiles.
///
/// The table is consulted in both directions; identical goals on both sides
/// also count as a match. Treated as configuration: extending the table must
/// not change scorer semantics.
const COMPLEMENTARY_GOALS: &[(&str, &str)] = &[
    ("find a mentor", "mentor others"),
    ("find a job", "hire talent"),
    ("raise funding", "invest in startups"),
    ("find clients", "find vendors"),
    ("grow my network", "grow my network"),
    ("find a cofounder", "find a cofounder"),
];

/// A dimension of profile comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchCategory {
    Interests,
    Goals,
    Organizations,
    Industry,
    Keywords,
}

impl MatchCategory {
    /// All categories in declaration order. Declaration order is the stable
    /// tie-break used when ranking contributions.
    pub const ALL: [MatchCategory; 5] = [
        MatchCategory::Interests,
        MatchCategory::Goals,
        MatchCategory::Organizations,
        MatchCategory::Industry,
        MatchCategory::Keywords,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchCategory::Interests => "interests",
            MatchCategory::Goals => "goals",
            MatchCategory::Organizations => "organizations",
            MatchCategory::Industry => "industry",
            MatchCategory::Keywords => "keywords",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "interests" => Some(MatchCategory::Interests),
            "goals" => Some(MatchCategory::Goals),
            "organizations" => Some(MatchCategory::Organizations),
            "industry" => Some(MatchCategory::Industry),
            "keywords" => Some(MatchCategory::Keywords),
            _ => None,
        }
    }
}

/// Similarity of one category for one profile pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: MatchCategory,
    /// Similarity in `[0, 1]`.
    pub score: f32,
    /// The literal values that matched, for explainability.
    pub matched_items: Vec<String>,
}

impl CategoryScore {
    fn zero(category: MatchCategory) -> Self {
        Self {
            category,
            score: 0.0,
            matched_items: Vec::new(),
        }
    }
}

/// Score a single category for a pair of profiles.
///
/// Symmetric categories (all set-overlap categories, industry, goals) return
/// the same score regardless of argument order; matched-item ordering for
/// set-overlap categories follows the first profile.
pub fn score_category(a: &UserProfile, b: &UserProfile, category: MatchCategory) -> CategoryScore {
    match category {
        MatchCategory::Interests => jaccard(category, &a.interests, &b.interests),
        MatchCategory::Keywords => jaccard(category, &a.keywords, &b.keywords),
        MatchCategory::Organizations => {
            // A user's current and prospective organizations both signal
            // affiliation, so each side compares the union of the two.
            let a_orgs: IndexSet<String> = a
                .organizations_current
                .iter()
                .chain(a.organizations_interested.iter())
                .cloned()
                .collect();
            let b_orgs: IndexSet<String> = b
                .organizations_current
                .iter()
                .chain(b.organizations_interested.iter())
                .cloned()
                .collect();
            jaccard(category, &a_orgs, &b_orgs)
        }
        MatchCategory::Industry => score_industry(a, b),
        MatchCategory::Goals => score_goals(a, b),
    }
}

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`.
///
/// Scores 0 when either set is empty: absence of data must not be rewarded
/// as compatibility. Matched items are the intersection in `a`'s order.
fn jaccard(category: MatchCategory, a: &IndexSet<String>, b: &IndexSet<String>) -> CategoryScore {
    if a.is_empty() || b.is_empty() {
        return CategoryScore::zero(category);
    }

    let matched: Vec<String> = a.iter().filter(|item| b.contains(*item)).cloned().collect();
    if matched.is_empty() {
        return CategoryScore::zero(category);
    }

    let union = a.len() + b.len() - matched.len();
    CategoryScore {
        category,
        score: matched.len() as f32 / union as f32,
        matched_items: matched,
    }
}

/// Exact equality on industry, case-insensitive, both sides present.
fn score_industry(a: &UserProfile, b: &UserProfile) -> CategoryScore {
    match (&a.industry, &b.industry) {
        (Some(ia), Some(ib)) if ia == ib => CategoryScore {
            category: MatchCategory::Industry,
            score: 1.0,
            matched_items: vec![ia.clone()],
        },
        _ => CategoryScore::zero(MatchCategory::Industry),
    }
}

/// True when two goals complement each other (table lookup, either
/// direction) or are identical.
fn goals_complement(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    COMPLEMENTARY_GOALS
        .iter()
        .any(|&(x, y)| (a == x && b == y) || (a == y && b == x))
}

/// Complementarity score over the goal sets.
///
/// Score is the number of distinct complementary pairings normalized by the
/// smaller goal set, clamped to 1. Matched items render both sides of each
/// pairing in lexicographic order so the result is identical regardless of
/// argument order.
fn score_goals(a: &UserProfile, b: &UserProfile) -> CategoryScore {
    if a.goals.is_empty() || b.goals.is_empty() {
        return CategoryScore::zero(MatchCategory::Goals);
    }

    let mut matched: IndexSet<String> = IndexSet::new();
    for ga in &a.goals {
        for gb in &b.goals {
            if goals_complement(ga, gb) {
                matched.insert(render_goal_pair(ga, gb));
            }
        }
    }

    if matched.is_empty() {
        return CategoryScore::zero(MatchCategory::Goals);
    }

    let denom = a.goals.len().min(b.goals.len()) as f32;
    let mut matched_items: Vec<String> = matched.into_iter().collect();
    matched_items.sort();

    CategoryScore {
        category: MatchCategory::Goals,
        score: (matched_items.len() as f32 / denom).min(1.0),
        matched_items,
    }
}

/// Canonical rendering of a complementary goal pairing.
fn render_goal_pair(a: &str, b: &str) -> String {
    if a == b {
        a.to_string()
    } else if a < b {
        format!("{a} + {b}")
    } else {
        format!("{b} + {a}")
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
    fn test_jaccard_overlap() {
        let a = profile(1, json!({"interests": ["ai", "golf"]}));
        let b = profile(2, json!({"interests": ["ai", "tennis"]}));
        let cs = score_category(&a, &b, MatchCategory::Interests);
        assert!((cs.score - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(cs.matched_items, vec!["ai"]);
    }

    #[test]
    fn test_empty_set_scores_zero_not_one() {
        let a = profile(1, json!({}));
        let b = profile(2, json!({}));
        let cs = score_category(&a, &b, MatchCategory::Interests);
        assert_eq!(cs.score, 0.0);
        assert!(cs.matched_items.is_empty());

        // One side empty is also zero, never rewarded.
        let c = profile(3, json!({"interests": ["ai"]}));
        let cs = score_category(&a, &c, MatchCategory::Interests);
        assert_eq!(cs.score, 0.0);
    }

    #[test]
    fn test_matched_items_empty_iff_score_zero() {
        let a = profile(1, json!({"interests": ["ai"], "goals": ["find a mentor"], "industry": "tech"}));
        let b = profile(2, json!({"interests": ["ai"], "goals": ["mentor others"], "industry": "tech"}));
        let c = profile(3, json!({"interests": ["golf"], "goals": ["find clients"], "industry": "retail"}));

        for cat in MatchCategory::ALL {
            for other in [&b, &c] {
                let cs = score_category(&a, other, cat);
                assert_eq!(
                    cs.matched_items.is_empty(),
                    cs.score == 0.0,
                    "category {:?} violated matched_items/score invariant",
                    cat
                );
            }
        }
    }

    #[test]
    fn test_matched_items_follow_first_profile_order() {
        let a = profile(1, json!({"interests": ["golf", "ai", "chess"]}));
        let b = profile(2, json!({"interests": ["chess", "golf"]}));
        let cs = score_category(&a, &b, MatchCategory::Interests);
        assert_eq!(cs.matched_items, vec!["golf", "chess"]);
    }

    #[test]
    fn test_industry_case_insensitive_equality() {
        let a = profile(1, json!({"industry": "FinTech"}));
        let b = profile(2, json!({"industry": "fintech"}));
        let cs = score_category(&a, &b, MatchCategory::Industry);
        assert_eq!(cs.score, 1.0);
        assert_eq!(cs.matched_items, vec!["fintech"]);
    }

    #[test]
    fn test_industry_absent_scores_zero() {
        let a = profile(1, json!({}));
        let b = profile(2, json!({}));
        // Two absent industries are not a match.
        assert_eq!(score_category(&a, &b, MatchCategory::Industry).score, 0.0);
    }

    #[test]
    fn test_goals_complementarity() {
        let a = profile(1, json!({"goals": ["find a mentor"]}));
        let b = profile(2, json!({"goals": ["mentor others"]}));
        let cs = score_category(&a, &b, MatchCategory::Goals);
        assert_eq!(cs.score, 1.0);
        assert_eq!(cs.matched_items, vec!["find a mentor + mentor others"]);
    }

    #[test]
    fn test_goals_symmetry() {
        let a = profile(1, json!({"goals": ["find a mentor", "raise funding"]}));
        let b = profile(2, json!({"goals": ["mentor others", "invest in startups", "find clients"]}));
        let ab = score_category(&a, &b, MatchCategory::Goals);
        let ba = score_category(&b, &a, MatchCategory::Goals);
        assert_eq!(ab, ba);
        assert_eq!(ab.matched_items.len(), 2);
    }

    #[test]
    fn test_symmetric_categories_are_symmetric() {
        let a = profile(
            1,
            json!({
                "interests": ["ai", "golf"],
                "industry": "tech",
                "organizations_current": ["acme"],
                "headline": "robotics and sailing"
            }),
        );
        let b = profile(
            2,
            json!({
                "interests": ["golf", "surfing"],
                "industry": "tech",
                "organizations_interested": ["acme"],
                "bio": "sailing enthusiast"
            }),
        );
        for cat in MatchCategory::ALL {
            let ab = score_category(&a, &b, cat);
            let ba = score_category(&b, &a, cat);
            assert_eq!(ab.score, ba.score, "score asymmetric for {:?}", cat);
        }
    }

    #[test]
    fn test_organizations_union_of_current_and_interested() {
        let a = profile(1, json!({"organizations_current": ["acme corp"]}));
        let b = profile(2, json!({"organizations_interested": ["acme corp"]}));
        let cs = score_category(&a, &b, MatchCategory::Organizations);
        assert_eq!(cs.score, 1.0);
        assert_eq!(cs.matched_items, vec!["acme corp"]);
    }

    #[test]
    fn test_category_serialization() {
        assert_eq!(MatchCategory::Interests.as_str(), "interests");
        assert_eq!(MatchCategory::parse("goals"), Some(MatchCategory::Goals));
        assert_eq!(MatchCategory::parse("industry"), Some(MatchCategory::Industry));
        assert_eq!(MatchCategory::parse("astrology"), None);
    }
}
