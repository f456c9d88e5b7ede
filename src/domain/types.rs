//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - handed between pipeline stages by value
//! - exported to JSON/CSV
//! - received from an upstream row service as JSON

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Maximum number of schools reported per tier.
pub const MAX_PER_TIER: usize = 5;

/// Width (in score points) of the Match band below the candidate's score.
pub const MATCH_BAND: f64 = 10.0;

/// A single loosely-typed value delivered by a row source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "null"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// A positional record as produced by the upstream query layer.
///
/// Expected layout: `[school_name, major_name, enrollment, average_score, ...]`.
/// Trailing fields are carried but ignored by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub Vec<Cell>);

impl RawRecord {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self(cells)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.0
    }
}

impl From<RawAdmissionRow> for RawRecord {
    fn from(row: RawAdmissionRow) -> Self {
        RawRecord(vec![
            Cell::Text(row.school_name),
            Cell::Text(row.major_name),
            Cell::Int(i64::from(row.enrollment)),
            Cell::Float(row.average_score),
        ])
    }
}

impl fmt::Display for RawRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, cell) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{cell}")?;
        }
        write!(f, "]")
    }
}

/// One validated per-major admission row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAdmissionRow {
    pub school_name: String,
    pub major_name: String,
    pub enrollment: u32,
    pub average_score: f64,
}

impl RawAdmissionRow {
    pub fn new(school_name: &str, major_name: &str, enrollment: u32, average_score: f64) -> Self {
        Self {
            school_name: school_name.to_string(),
            major_name: major_name.to_string(),
            enrollment,
            average_score,
        }
    }
}

/// One school after collapsing all of its per-major rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolSummary {
    pub school_name: String,
    pub total_enrollment: u64,
    /// Highest `average_score` among the school's rows (its hardest program).
    pub representative_average_score: f64,
}

/// Admission-likelihood tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Reach,
    Match,
    Safety,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Reach, Tier::Match, Tier::Safety];

    pub fn display_name(self) -> &'static str {
        match self {
            Tier::Reach => "Reach",
            Tier::Match => "Match",
            Tier::Safety => "Safety",
        }
    }

    pub fn label(self, style: LabelStyle) -> &'static str {
        match (style, self) {
            (LabelStyle::En, tier) => tier.display_name(),
            (LabelStyle::Zh, Tier::Reach) => "冲一冲",
            (LabelStyle::Zh, Tier::Match) => "稳一稳",
            (LabelStyle::Zh, Tier::Safety) => "保一保",
        }
    }
}

/// Which tier labels to use as keys in exported results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// `Reach` / `Match` / `Safety`.
    #[default]
    En,
    /// `冲一冲` / `稳一稳` / `保一保`.
    Zh,
}

/// A school annotated with its tier and admission probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSchool {
    #[serde(flatten)]
    pub summary: SchoolSummary,
    #[serde(skip)]
    pub tier: Tier,
    /// Percentage, already rounded to one decimal.
    #[serde(serialize_with = "serialize_percent")]
    pub admission_probability: f64,
}

impl ScoredSchool {
    pub fn probability_label(&self) -> String {
        format_percent(self.admission_probability)
    }
}

/// Render a percentage with exactly one decimal, e.g. `87.3%`.
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

fn serialize_percent<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_percent(*value))
}

/// Final output of one pipeline run: at most `MAX_PER_TIER` schools per tier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationResult {
    pub reach: Vec<ScoredSchool>,
    pub matched: Vec<ScoredSchool>,
    pub safety: Vec<ScoredSchool>,
}

impl RecommendationResult {
    pub fn tier(&self, tier: Tier) -> &[ScoredSchool] {
        match tier {
            Tier::Reach => &self.reach,
            Tier::Match => &self.matched,
            Tier::Safety => &self.safety,
        }
    }

    pub fn is_empty(&self) -> bool {
        Tier::ALL.iter().all(|t| self.tier(*t).is_empty())
    }

    pub fn len(&self) -> usize {
        Tier::ALL.iter().map(|t| self.tier(*t).len()).sum()
    }

    /// View for serialization with the chosen tier labels as keys.
    pub fn labeled(&self, style: LabelStyle) -> LabeledResult<'_> {
        LabeledResult { result: self, style }
    }
}

impl Serialize for RecommendationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.labeled(LabelStyle::En).serialize(serializer)
    }
}

/// Serializes as a map with exactly three keys in Reach, Match, Safety order.
#[derive(Debug, Clone, Copy)]
pub struct LabeledResult<'a> {
    result: &'a RecommendationResult,
    style: LabelStyle,
}

impl Serialize for LabeledResult<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Tier::ALL.len()))?;
        for tier in Tier::ALL {
            map.serialize_entry(tier.label(self.style), self.result.tier(tier))?;
        }
        map.end()
    }
}

/// The candidate a recommendation is computed for.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CandidateProfile {
    pub score: f64,
    pub rank: Option<u32>,
    pub want_major: Option<String>,
    pub unwant_major: Option<String>,
    /// Elective subjects chosen by the candidate (e.g. 物理, 化学, 生物).
    pub subjects: Vec<String>,
}

/// Accepted exam score range.
pub const SCORE_MIN: f64 = 50.0;
pub const SCORE_MAX: f64 = 750.0;

impl CandidateProfile {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            ..Self::default()
        }
    }

    /// Caller-side validation; the tiering engine itself accepts any score.
    pub fn validate(&self) -> Result<(), String> {
        if !self.score.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&self.score) {
            return Err(format!(
                "Score {} is outside the accepted range {SCORE_MIN}..={SCORE_MAX}.",
                self.score
            ));
        }
        if self.subjects.len() > 3 {
            return Err(format!("At most 3 elective subjects, got {}.", self.subjects.len()));
        }
        Ok(())
    }
}

/// A named candidate in a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub profile: CandidateProfile,
}

/// Filters a row source applies before handing rows to the pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryConstraints {
    pub candidate_score: f64,
    pub want_major: Option<String>,
    pub unwant_major: Option<String>,
    pub subjects: Vec<String>,
    /// Drop rows whose score is this many points (or more) above the candidate.
    pub max_above: Option<f64>,
    /// Order rows by desirability (and drop weak ones) instead of source order.
    pub by_desirability: bool,
}

impl QueryConstraints {
    pub fn for_candidate(profile: &CandidateProfile, filters: SourceFilters) -> Self {
        Self {
            candidate_score: profile.score,
            want_major: profile.want_major.clone(),
            unwant_major: profile.unwant_major.clone(),
            subjects: profile.subjects.clone(),
            max_above: filters.max_above,
            by_desirability: filters.by_desirability,
        }
    }
}

/// Row-source options shared by every candidate of a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SourceFilters {
    pub max_above: Option<f64>,
    pub by_desirability: bool,
}

/// Where raw admission rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum RowSourceSpec {
    /// Local admissions table.
    Csv(PathBuf),
    /// Remote tabular-query service (URL resolved from flags or `.env`).
    Http { url: Option<String>, timeout_secs: Option<u64> },
}

/// Terminal output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
}

/// A full `recommend` run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RecommendConfig {
    pub source: RowSourceSpec,
    pub profile: CandidateProfile,
    pub filters: SourceFilters,
    pub labels: LabelStyle,
    pub output: OutputFormat,

    pub export_json: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school(name: &str, enroll: u64, avg: f64, tier: Tier, p: f64) -> ScoredSchool {
        ScoredSchool {
            summary: SchoolSummary {
                school_name: name.to_string(),
                total_enrollment: enroll,
                representative_average_score: avg,
            },
            tier,
            admission_probability: p,
        }
    }

    #[test]
    fn result_serializes_three_ordered_keys() {
        let result = RecommendationResult {
            reach: vec![school("A大学", 150, 610.0, Tier::Reach, 20.0)],
            matched: vec![],
            safety: vec![school("C大学", 80, 580.0, Tier::Safety, 99.0)],
        };

        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"Reach":[{"school_name":"A大学","total_enrollment":150,"representative_average_score":610.0,"admission_probability":"20.0%"}],"Match":[],"Safety":[{"school_name":"C大学","total_enrollment":80,"representative_average_score":580.0,"admission_probability":"99.0%"}]}"#
        );
    }

    #[test]
    fn localized_labels_are_unescaped() {
        let result = RecommendationResult::default();
        let json = serde_json::to_string(&result.labeled(LabelStyle::Zh)).unwrap();
        assert_eq!(json, r#"{"冲一冲":[],"稳一稳":[],"保一保":[]}"#);
    }

    #[test]
    fn cells_deserialize_by_shape() {
        let record: RawRecord = serde_json::from_str(r#"["A", "X", 100, 610.5, null, true]"#).unwrap();
        assert_eq!(
            record.cells(),
            &[
                Cell::Text("A".to_string()),
                Cell::Text("X".to_string()),
                Cell::Int(100),
                Cell::Float(610.5),
                Cell::Null,
                Cell::Bool(true),
            ]
        );
        assert_eq!(record.to_string(), r#"["A", "X", 100, 610.5, null, true]"#);
    }

    #[test]
    fn profile_validation() {
        assert!(CandidateProfile::new(600.0).validate().is_ok());
        assert!(CandidateProfile::new(750.0).validate().is_ok());
        assert!(CandidateProfile::new(751.0).validate().is_err());
        assert!(CandidateProfile::new(f64::NAN).validate().is_err());

        let mut profile = CandidateProfile::new(600.0);
        profile.subjects = vec!["物理".into(), "化学".into(), "生物".into(), "历史".into()];
        assert!(profile.validate().is_err());
    }

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(format_percent(87.3), "87.3%");
        assert_eq!(format_percent(90.0), "90.0%");
    }
}
