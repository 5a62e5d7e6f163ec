//! Profile attribute extraction and normalization.
//!
//! Converts the raw `users.profile` JSON record into the fixed attribute set
//! the scorer compares. Normalization is total: missing, null, or malformed
//! fields degrade to empty sets, never errors. Attribute values are trimmed,
//! lower-cased, and deduplicated while preserving first-seen order, which is
//! what makes matched-item ordering deterministic downstream.

use indexmap::IndexSet;
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Minimum keyword length after tokenization.
const MIN_KEYWORD_LEN: usize = 3;

/// Common English filler words excluded from free-text keyword sets.
const STOPWORDS: &[&str] = &[
    "and", "the", "for", "with", "that", "this", "from", "have", "are", "was", "were", "will",
    "been", "has", "had", "not", "but", "all", "can", "our", "your", "their", "about", "into",
    "over", "more", "than", "who", "what", "when", "where", "how", "out", "you", "they", "its",
    "also", "very", "just", "per",
];

/// A user's normalized comparison attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: i32,
    pub interests: IndexSet<String>,
    pub goals: IndexSet<String>,
    /// Lower-cased industry name, `None` when absent or blank.
    pub industry: Option<String>,
    pub organizations_current: IndexSet<String>,
    pub organizations_interested: IndexSet<String>,
    /// Keywords tokenized from free-text fields (headline, bio).
    pub keywords: IndexSet<String>,
}

impl UserProfile {
    /// An empty profile for a user with no usable attributes.
    pub fn empty(user_id: i32) -> Self {
        Self {
            user_id,
            interests: IndexSet::new(),
            goals: IndexSet::new(),
            industry: None,
            organizations_current: IndexSet::new(),
            organizations_interested: IndexSet::new(),
            keywords: IndexSet::new(),
        }
    }

    /// True when no category has anything to compare.
    pub fn is_empty(&self) -> bool {
        self.interests.is_empty()
            && self.goals.is_empty()
            && self.industry.is_none()
            && self.organizations_current.is_empty()
            && self.organizations_interested.is_empty()
            && self.keywords.is_empty()
    }
}

/// Normalize a raw profile record into a [`UserProfile`].
///
/// Pure and infallible by contract: any shape of `raw` (including non-object
/// values) yields a profile, with unusable fields normalized to empty.
pub fn normalize(user_id: i32, raw: &Value) -> UserProfile {
    let interests = string_set(raw.get("interests"));
    let goals = string_set(raw.get("goals"));
    let industry = raw
        .get("industry")
        .and_then(Value::as_str)
        .map(normalize_term)
        .filter(|s| !s.is_empty());
    let organizations_current = string_set(raw.get("organizations_current"));
    let organizations_interested = string_set(raw.get("organizations_interested"));

    let mut keywords = IndexSet::new();
    for field in ["headline", "bio"] {
        if let Some(text) = raw.get(field).and_then(Value::as_str) {
            tokenize_into(text, &mut keywords);
        }
    }

    UserProfile {
        user_id,
        interests,
        goals,
        industry,
        organizations_current,
        organizations_interested,
        keywords,
    }
}

/// Trim and lower-case a single attribute value.
fn normalize_term(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Strip diacritics so "José" and "Jose" tokenize identically.
fn fold_accents(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Extract a deduplicated, insertion-ordered string set from a JSON array.
///
/// Non-array values and non-string elements are ignored.
fn string_set(value: Option<&Value>) -> IndexSet<String> {
    let Some(arr) = value.and_then(Value::as_array) else {
        return IndexSet::new();
    };

    arr.iter()
        .filter_map(Value::as_str)
        .map(normalize_term)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Tokenize free text into lower-cased, accent-folded keywords.
fn tokenize_into(text: &str, out: &mut IndexSet<String>) {
    let folded = fold_accents(text);
    for token in folded.split(|c: char| !c.is_alphanumeric()) {
        let token = token.to_lowercase();
        if token.chars().count() < MIN_KEYWORD_LEN || STOPWORDS.contains(&token.as_str()) {
            continue;
        }
        out.insert(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_normalize_to_empty() {
        let profile = normalize(1, &json!({}));
        assert!(profile.is_empty());
        assert_eq!(profile.user_id, 1);
    }

    #[test]
    fn test_non_object_record_degrades_to_empty() {
        assert!(normalize(1, &json!(null)).is_empty());
        assert!(normalize(1, &json!("corrupted")).is_empty());
        assert!(normalize(1, &json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn test_attribute_sets_are_trimmed_lowercased_deduplicated() {
        let profile = normalize(
            1,
            &json!({"interests": ["  AI ", "ai", "Golf", "", "  "]}),
        );
        let interests: Vec<&str> = profile.interests.iter().map(String::as_str).collect();
        assert_eq!(interests, vec!["ai", "golf"]);
    }

    #[test]
    fn test_set_preserves_first_seen_order() {
        let profile = normalize(1, &json!({"interests": ["zeta", "alpha", "mid", "alpha"]}));
        let interests: Vec<&str> = profile.interests.iter().map(String::as_str).collect();
        assert_eq!(interests, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_malformed_field_types_ignored() {
        let profile = normalize(
            1,
            &json!({"interests": "not-an-array", "goals": [1, true, null, "mentor others"]}),
        );
        assert!(profile.interests.is_empty());
        let goals: Vec<&str> = profile.goals.iter().map(String::as_str).collect();
        assert_eq!(goals, vec!["mentor others"]);
    }

    #[test]
    fn test_blank_industry_is_none() {
        assert_eq!(normalize(1, &json!({"industry": "   "})).industry, None);
        assert_eq!(
            normalize(1, &json!({"industry": " FinTech "})).industry,
            Some("fintech".to_string())
        );
    }

    #[test]
    fn test_keyword_tokenization() {
        let profile = normalize(
            1,
            &json!({"headline": "Building ML pipelines for healthcare", "bio": "I love golf and the outdoors."}),
        );
        assert!(profile.keywords.contains("pipelines"));
        assert!(profile.keywords.contains("healthcare"));
        assert!(profile.keywords.contains("golf"));
        // Stopwords and short tokens dropped.
        assert!(!profile.keywords.contains("the"));
        assert!(!profile.keywords.contains("for"));
        assert!(!profile.keywords.contains("ml"));
    }

    #[test]
    fn test_keywords_accent_folded() {
        let profile = normalize(1, &json!({"bio": "Café networking in São Paulo"}));
        assert!(profile.keywords.contains("cafe"));
        assert!(profile.keywords.contains("sao"));
        assert!(profile.keywords.contains("paulo"));
    }
}
