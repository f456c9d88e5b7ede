//! Admission tiering engine.
//!
//! `Aggregate -> Classify -> Score -> Truncate`, single pass, no state.
//! Any stage failure aborts the run and is returned unchanged.

pub mod aggregate;
pub mod classify;
pub mod probability;
pub mod ranked;

use crate::domain::{RawRecord, RecommendationResult, Tier};
use crate::error::PipelineError;

pub use classify::TierCounts;

/// Result of one tiering run plus the counts the report shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Tiering {
    pub records: usize,
    pub schools: usize,
    /// Schools per tier before truncation.
    pub qualified: TierCounts,
    pub result: RecommendationResult,
}

/// Run the whole engine over one row set for one candidate score.
pub fn run(records: &[RawRecord], candidate_score: f64) -> Result<Tiering, PipelineError> {
    let summaries = aggregate::aggregate_records(records)?;
    let schools = summaries.len();

    let split = classify::split_tiers(summaries, candidate_score);
    let qualified = split.counts();

    let reach = probability::score_tier(Tier::Reach, split.reach, candidate_score);
    let matched = probability::score_tier(Tier::Match, split.matched, candidate_score);
    let safety = probability::score_tier(Tier::Safety, split.safety, candidate_score);

    let result = ranked::build_result(reach, matched, safety);

    Ok(Tiering {
        records: records.len(),
        schools,
        qualified,
        result,
    })
}

/// Like `run`, returning only the recommendation.
pub fn recommend(records: &[RawRecord], candidate_score: f64) -> Result<RecommendationResult, PipelineError> {
    run(records, candidate_score).map(|t| t.result)
}
