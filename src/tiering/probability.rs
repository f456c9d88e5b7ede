//! Tier-specific admission probability.
//!
//! Each tier uses a linear term in the score gap plus a log-damped enrollment
//! term, clamped to a tier bound:
//!
//! | tier   | formula                                        | bound    |
//! |--------|------------------------------------------------|----------|
//! | Reach  | `40 - (avg - score) * 4 + ln(enroll) * 2`      | `>= 20`  |
//! | Match  | `60 + (score - avg) * 4 + ln(enroll) * 2`      | `<= 90`  |
//! | Safety | `90 + (score - avg) * 0.5 + ln(enroll)`        | `<= 99`  |
//!
//! `enroll` is floored at 1 so the logarithm is always defined.

use crate::domain::{SchoolSummary, ScoredSchool, Tier};

pub const REACH_FLOOR: f64 = 20.0;
pub const MATCH_CEILING: f64 = 90.0;
pub const SAFETY_CEILING: f64 = 99.0;

/// Admission probability in percent, rounded to one decimal.
pub fn admission_probability(tier: Tier, avg: f64, total_enrollment: u64, candidate_score: f64) -> f64 {
    let enroll_term = (total_enrollment.max(1) as f64).ln();

    let raw = match tier {
        Tier::Reach => (40.0 - (avg - candidate_score) * 4.0 + enroll_term * 2.0).max(REACH_FLOOR),
        Tier::Match => (60.0 + (candidate_score - avg) * 4.0 + enroll_term * 2.0).min(MATCH_CEILING),
        Tier::Safety => (90.0 + (candidate_score - avg) * 0.5 + enroll_term).min(SAFETY_CEILING),
    };

    round_one_decimal(raw)
}

/// Round to one decimal place, ties to even.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Annotate every summary of one tier with its probability.
pub fn score_tier(tier: Tier, summaries: Vec<SchoolSummary>, candidate_score: f64) -> Vec<ScoredSchool> {
    summaries
        .into_iter()
        .map(|summary| {
            let admission_probability = admission_probability(
                tier,
                summary.representative_average_score,
                summary.total_enrollment,
                candidate_score,
            );
            ScoredSchool {
                summary,
                tier,
                admission_probability,
            }
        })
        .collect()
}
