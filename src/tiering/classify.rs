//! Reach / Match / Safety partitioning.

use crate::domain::{MATCH_BAND, SchoolSummary, Tier};

/// Summaries split by tier, each in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierSplit {
    pub reach: Vec<SchoolSummary>,
    pub matched: Vec<SchoolSummary>,
    pub safety: Vec<SchoolSummary>,
}

impl TierSplit {
    pub fn counts(&self) -> TierCounts {
        TierCounts {
            reach: self.reach.len(),
            matched: self.matched.len(),
            safety: self.safety.len(),
        }
    }
}

/// How many schools qualified for each tier before truncation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts {
    pub reach: usize,
    pub matched: usize,
    pub safety: usize,
}

impl TierCounts {
    pub fn get(&self, tier: Tier) -> usize {
        match tier {
            Tier::Reach => self.reach,
            Tier::Match => self.matched,
            Tier::Safety => self.safety,
        }
    }

    pub fn total(&self) -> usize {
        self.reach + self.matched + self.safety
    }
}

/// Tier of a school whose representative score is `avg`.
///
/// Both Match boundaries are inclusive: `avg == score` and
/// `avg == score - 10` are Match.
pub fn classify(avg: f64, candidate_score: f64) -> Tier {
    if avg > candidate_score {
        Tier::Reach
    } else if candidate_score - MATCH_BAND <= avg && avg <= candidate_score {
        Tier::Match
    } else {
        Tier::Safety
    }
}

/// Partition summaries into the three tiers.
pub fn split_tiers(summaries: Vec<SchoolSummary>, candidate_score: f64) -> TierSplit {
    let mut split = TierSplit::default();
    for summary in summaries {
        match classify(summary.representative_average_score, candidate_score) {
            Tier::Reach => split.reach.push(summary),
            Tier::Match => split.matched.push(summary),
            Tier::Safety => split.safety.push(summary),
        }
    }
    tracing::debug!(
        candidate_score,
        reach = split.reach.len(),
        matched = split.matched.len(),
        safety = split.safety.len(),
        "classified schools"
    );
    split
}
