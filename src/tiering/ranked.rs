//! Final per-tier truncation.

use crate::domain::{MAX_PER_TIER, RecommendationResult, ScoredSchool};

/// Keep the first `MAX_PER_TIER` entries of each tier, in the order received.
pub fn build_result(
    mut reach: Vec<ScoredSchool>,
    mut matched: Vec<ScoredSchool>,
    mut safety: Vec<ScoredSchool>,
) -> RecommendationResult {
    reach.truncate(MAX_PER_TIER);
    matched.truncate(MAX_PER_TIER);
    safety.truncate(MAX_PER_TIER);

    RecommendationResult {
        reach,
        matched,
        safety,
    }
}
