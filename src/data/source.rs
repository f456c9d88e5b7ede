//! The row-source boundary.
//!
//! Everything upstream of the tiering engine is an untrusted collaborator
//! reached through `RowSource::fetch_rows`. A source either returns a complete
//! row set or an error; it never hands back partial data.

use crate::domain::QueryConstraints;
use crate::domain::RawRecord;
use crate::error::PipelineError;

/// Supplier of raw admission records.
pub trait RowSource: Sync {
    /// Short human-readable description (for logs and report headers).
    fn describe(&self) -> String;

    fn fetch_rows(&self, constraints: &QueryConstraints) -> Result<Vec<RawRecord>, PipelineError>;
}

/// Values meaning "no elective subject requirement".
const UNRESTRICTED: [&str; 4] = ["不限", "none", "any", "无"];

/// Whether a program's elective requirement is met by the chosen subjects.
///
/// A requirement such as `物理加化学` is satisfied only if every listed subject
/// was chosen. Empty or unrestricted requirements always match.
pub fn subjects_satisfied(requirement: &str, chosen: &[String]) -> bool {
    let requirement = requirement.trim();
    if requirement.is_empty()
        || UNRESTRICTED
            .iter()
            .any(|u| requirement.eq_ignore_ascii_case(u))
    {
        return true;
    }

    requirement
        .split(|c: char| matches!(c, '加' | '+' | '、' | ',' | '，' | '/') || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .all(|needed| chosen.iter().any(|c| c.trim() == needed))
}

/// Substring-based major filter.
///
/// `want` keeps majors whose name contains it; `unwant` drops majors whose
/// name contains it. Blank filters are ignored.
pub fn major_matches(major: &str, want: Option<&str>, unwant: Option<&str>) -> bool {
    if let Some(want) = want.map(str::trim).filter(|w| !w.is_empty()) {
        if !major.contains(want) {
            return false;
        }
    }
    if let Some(unwant) = unwant.map(str::trim).filter(|u| !u.is_empty()) {
        if major.contains(unwant) {
            return false;
        }
    }
    true
}

/// Whether a row's score is within the configured window above the candidate.
///
/// Rows whose score cannot be read are kept so the aggregator can reject them.
pub fn within_max_above(score: Option<f64>, constraints: &QueryConstraints) -> bool {
    match (score, constraints.max_above) {
        (Some(score), Some(window)) => score < constraints.candidate_score + window,
        _ => true,
    }
}

/// Rows whose desirability falls below this are dropped when ordering.
pub const DESIRABILITY_CUTOFF: f64 = 0.3;

/// Weight used for a missing or unrecognized assessment grade or school rank.
const FALLBACK_WEIGHT: f64 = 0.3;

/// Discipline-assessment grade mapped onto `[0.3, 1.0]`.
pub fn assessment_weight(grade: Option<&str>) -> f64 {
    match grade.map(str::trim) {
        Some("A+") => 1.0,
        Some("A") => 0.9,
        Some("A-") => 0.8,
        Some("B+") => 0.7,
        Some("B") => 0.6,
        Some("B-") => 0.5,
        _ => FALLBACK_WEIGHT,
    }
}

/// `1 - rank / 500` for a known national rank.
pub fn ranking_weight(rank: Option<f64>) -> f64 {
    match rank {
        Some(r) if r.is_finite() && r > 0.0 => 1.0 - r / 500.0,
        _ => FALLBACK_WEIGHT,
    }
}

/// Weighted desirability of one program row for a candidate.
///
/// | component            | weight | term                        |
/// |----------------------|--------|-----------------------------|
/// | score match          | 0.3    | `1 - |avg - score| / 50`    |
/// | discipline grade     | 0.4    | `assessment_weight`         |
/// | school rank          | 0.1    | `ranking_weight`            |
/// | enrollment size      | 0.2    | `ln(n + 1) / ln(100)`       |
pub fn desirability(
    candidate_score: f64,
    average_score: f64,
    enrollment: f64,
    assessment: Option<&str>,
    school_rank: Option<f64>,
) -> f64 {
    let score_match = 1.0 - (average_score - candidate_score).abs() / 50.0;
    let size = (enrollment + 1.0).ln() / 100f64.ln();

    0.3 * score_match + 0.4 * assessment_weight(assessment) + 0.1 * ranking_weight(school_rank) + 0.2 * size
}

/// Sort rows by descending desirability and drop those under the cutoff.
///
/// The sort is stable, so equal scores keep source order. Rows `score` cannot
/// rate are kept after the rated ones, in source order, for the aggregator to
/// judge.
pub fn order_by_desirability<T>(rows: Vec<T>, score: impl Fn(&T) -> Option<f64>) -> Vec<T> {
    let mut rated = Vec::new();
    let mut unrated = Vec::new();
    for row in rows {
        match score(&row) {
            Some(d) if d >= DESIRABILITY_CUTOFF => rated.push((d, row)),
            Some(_) => {}
            None => unrated.push(row),
        }
    }

    rated.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    rated.into_iter().map(|(_, row)| row).chain(unrated).collect()
}
