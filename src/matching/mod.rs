//! The compatibility-matching engine.
//!
//! Pipeline: raw user record -> [`profile`] normalization -> per-category
//! scoring in [`category`] -> weighted aggregation in [`aggregate`] ->
//! persisted recommendation rows written by [`builder`]. Recommendation
//! lifecycle (save/dismiss/connect and the periodic saved-reset) lives in
//! [`lifecycle`]; [`analysis`] is a read-only aggregate view over the
//! persisted results.
//!
//! Everything up to the builder is pure and deterministic: identical input
//! profiles always produce identical scores and reasons.

pub mod aggregate;
pub mod analysis;
pub mod builder;
pub mod category;
pub mod lifecycle;
pub mod profile;

/// Errors from the scoring configuration layer.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// A weight table named a category that does not exist.
    #[error("unknown match category: {0}")]
    InvalidCategory(String),
    /// A weight table carried a negative weight.
    #[error("negative weight {weight} for category {category}")]
    InvalidWeight { category: String, weight: f32 },
}
