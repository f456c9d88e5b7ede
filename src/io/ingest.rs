//! CSV admissions-table ingest.
//!
//! Turns an enrollment-plan/admission-score export into positional
//! `RawRecord`s and serves them through `RowSource`.
//!
//! Design goals:
//! - **Strict schema** for the four required columns (clear errors + exit code 2)
//! - **No silent skipping**: unreadable CSV rows fail the load (exit code 3);
//!   value validation is left to the aggregator
//! - **Deterministic behavior**: rows are served in file order

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::Deserialize;

use crate::data::source::{
    RowSource, desirability, major_matches, order_by_desirability, subjects_satisfied, within_max_above,
};
use crate::domain::{Candidate, CandidateProfile, Cell, QueryConstraints, RawRecord};
use crate::error::{AppError, PipelineError};

const SCHOOL_COLUMNS: [&str; 3] = ["school_name", "school", "院校名称"];
const MAJOR_COLUMNS: [&str; 3] = ["major_name", "major", "专业名称"];
const ENROLLMENT_COLUMNS: [&str; 3] = ["enrollment", "招生人数", "计划数"];
const SCORE_COLUMNS: [&str; 4] = ["average_score", "avg_score", "平均分", "总成绩"];
const REQUIREMENT_COLUMNS: [&str; 2] = ["subject_requirement", "科目要求"];
const ASSESSMENT_COLUMNS: [&str; 2] = ["subject_assessment", "学科评估"];
const RANKING_COLUMNS: [&str; 2] = ["school_rank", "学校排名"];

/// One table row, kept in positional form plus the fields the filters need.
#[derive(Debug, Clone)]
pub struct TableRow {
    pub record: RawRecord,
    pub subject_requirement: Option<String>,
    /// Discipline-assessment grade such as `A+` or `B-`.
    pub assessment: Option<String>,
    pub school_rank: Option<f64>,
}

/// A loaded admissions table.
#[derive(Debug, Clone)]
pub struct AdmissionTable {
    pub label: String,
    pub rows: Vec<TableRow>,
}

/// Load an admissions table from a CSV file.
pub fn load_admission_table(path: &Path) -> Result<AdmissionTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_admission_table(file, path.display().to_string())
}

/// Load an admissions table from any reader.
pub fn read_admission_table<R: Read>(reader: R, label: String) -> Result<AdmissionTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let school_idx = resolve_column(&header_map, &SCHOOL_COLUMNS)?;
    let major_idx = resolve_column(&header_map, &MAJOR_COLUMNS)?;
    let enrollment_idx = resolve_column(&header_map, &ENROLLMENT_COLUMNS)?;
    let score_idx = resolve_column(&header_map, &SCORE_COLUMNS)?;
    let requirement_idx = optional_column(&header_map, &REQUIREMENT_COLUMNS);
    let assessment_idx = optional_column(&header_map, &ASSESSMENT_COLUMNS);
    let ranking_idx = optional_column(&header_map, &RANKING_COLUMNS);

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(3, format!("CSV parse error at line {line}: {e}")))?;

        let cells = vec![
            text_cell(&record, school_idx),
            text_cell(&record, major_idx),
            enrollment_cell(&record, enrollment_idx),
            text_cell(&record, score_idx),
        ];

        rows.push(TableRow {
            record: RawRecord::new(cells),
            subject_requirement: optional_text(&record, requirement_idx),
            assessment: optional_text(&record, assessment_idx),
            school_rank: optional_text(&record, ranking_idx).and_then(|r| r.parse().ok()),
        });
    }

    tracing::debug!(source = %label, rows = rows.len(), "loaded admissions table");
    Ok(AdmissionTable { label, rows })
}

impl AdmissionTable {
    /// Rows passing the candidate's constraints.
    ///
    /// Rows come in file order unless `by_desirability` is set, in which case
    /// they are ranked and weak rows are dropped.
    pub fn select(&self, constraints: &QueryConstraints) -> Vec<RawRecord> {
        let kept: Vec<&TableRow> = self
            .rows
            .iter()
            .filter(|row| {
                let major = match row.record.cells().get(1) {
                    Some(Cell::Text(m)) => m.as_str(),
                    _ => "",
                };
                major_matches(
                    major,
                    constraints.want_major.as_deref(),
                    constraints.unwant_major.as_deref(),
                )
            })
            .filter(|row| {
                // No chosen subjects means the candidate did not ask for this filter.
                constraints.subjects.is_empty()
                    || row
                        .subject_requirement
                        .as_deref()
                        .is_none_or(|req| subjects_satisfied(req, &constraints.subjects))
            })
            .filter(|row| within_max_above(row_score(&row.record), constraints))
            .collect();

        let kept = if constraints.by_desirability {
            order_by_desirability(kept, |row| row_desirability(row, constraints.candidate_score))
        } else {
            kept
        };
        kept.into_iter().map(|row| row.record.clone()).collect()
    }
}

impl RowSource for AdmissionTable {
    fn describe(&self) -> String {
        format!("csv {}", self.label)
    }

    fn fetch_rows(&self, constraints: &QueryConstraints) -> Result<Vec<RawRecord>, PipelineError> {
        let selected = self.select(constraints);
        tracing::info!(
            source = %self.label,
            table_rows = self.rows.len(),
            selected = selected.len(),
            by_desirability = constraints.by_desirability,
            "selected admission rows"
        );
        Ok(selected)
    }
}

#[derive(Debug, Deserialize)]
struct CandidateRow {
    id: String,
    score: f64,
    #[serde(default)]
    rank: Option<u32>,
    #[serde(default)]
    major: Option<String>,
    #[serde(default)]
    exclude_major: Option<String>,
    #[serde(default)]
    subjects: Option<String>,
}

/// Load batch candidates from a CSV file.
pub fn load_candidates(path: &Path) -> Result<Vec<Candidate>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open candidates CSV '{}': {e}", path.display())))?;
    read_candidates(file)
}

/// Read batch candidates (`id,score[,rank,major,exclude_major,subjects]`).
///
/// Every candidate is validated; the first invalid one fails the load.
pub fn read_candidates<R: Read>(reader: R) -> Result<Vec<Candidate>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out = Vec::new();
    for (idx, result) in reader.deserialize::<CandidateRow>().enumerate() {
        let line = idx + 2;
        let row = result.map_err(|e| AppError::new(2, format!("Invalid candidate at line {line}: {e}")))?;

        let profile = CandidateProfile {
            score: row.score,
            rank: row.rank,
            want_major: non_blank(row.major),
            unwant_major: non_blank(row.exclude_major),
            subjects: row.subjects.as_deref().map(split_subjects).unwrap_or_default(),
        };
        profile
            .validate()
            .map_err(|e| AppError::new(2, format!("Invalid candidate '{}' at line {line}: {e}", row.id)))?;

        out.push(Candidate { id: row.id, profile });
    }
    Ok(out)
}

/// Split a subject list such as `物理、化学、生物` or `物理/化学`.
pub fn split_subjects(raw: &str) -> Vec<String> {
    raw.split(|c: char| matches!(c, ',' | '，' | '、' | '/' | ';') || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_lowercase()
}

fn resolve_column(header_map: &HashMap<String, usize>, names: &[&str]) -> Result<usize, AppError> {
    names
        .iter()
        .find_map(|n| header_map.get(*n).copied())
        .ok_or_else(|| {
            AppError::new(
                2,
                format!("Missing required column: one of {}", names.join(" / ")),
            )
        })
}

fn optional_column(header_map: &HashMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| header_map.get(*n).copied())
}

fn optional_text(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn text_cell(record: &StringRecord, idx: usize) -> Cell {
    match record.get(idx).map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Cell::Text(s.to_string()),
        None => Cell::Null,
    }
}

/// Enrollment plans are often published with grouping separators (`1,200`).
fn enrollment_cell(record: &StringRecord, idx: usize) -> Cell {
    match text_cell(record, idx) {
        Cell::Text(s) => Cell::Text(s.chars().filter(|c| !matches!(c, ',' | '，')).collect()),
        other => other,
    }
}

/// `None` when enrollment or score is unreadable; the aggregator reports those.
fn row_desirability(row: &TableRow, candidate_score: f64) -> Option<f64> {
    let enrollment = match row.record.cells().get(2)? {
        Cell::Text(s) => s.parse::<u32>().ok()?,
        _ => return None,
    };
    let score = row_score(&row.record)?;
    Some(desirability(
        candidate_score,
        score,
        f64::from(enrollment),
        row.assessment.as_deref(),
        row.school_rank,
    ))
}

fn row_score(record: &RawRecord) -> Option<f64> {
    match record.cells().get(3)? {
        Cell::Text(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiering;

    const TABLE: &str = "\u{feff}院校名称,专业名称,计划数,平均分,科目要求\n\
A大学,临床医学,\"1,000\",610,物理加化学\n\
A大学,口腔医学,50,605,化学\n\
B大学,法学,200,595,历史\n\
C大学,基础医学,80,580,不限\n";

    fn load() -> AdmissionTable {
        read_admission_table(TABLE.as_bytes(), "inline".to_string()).unwrap()
    }

    #[test]
    fn resolves_chinese_headers_and_strips_separators() {
        let table = load();
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[0].record.cells()[2], Cell::Text("1000".to_string()));
        assert_eq!(table.rows[0].subject_requirement.as_deref(), Some("物理加化学"));
    }

    #[test]
    fn filters_by_major_and_subjects() {
        let table = load();
        let constraints = QueryConstraints {
            candidate_score: 600.0,
            want_major: Some("医学".to_string()),
            subjects: vec!["物理".to_string(), "化学".to_string(), "生物".to_string()],
            ..QueryConstraints::default()
        };
        let rows = table.fetch_rows(&constraints).unwrap();
        let schools: Vec<_> = rows.iter().map(|r| r.cells()[0].clone()).collect();
        assert_eq!(
            schools,
            [
                Cell::Text("A大学".to_string()),
                Cell::Text("A大学".to_string()),
                Cell::Text("C大学".to_string()),
            ]
        );

        let result = tiering::recommend(&rows, 600.0).unwrap();
        assert_eq!(result.reach[0].summary.total_enrollment, 1050);
        assert_eq!(result.safety[0].summary.school_name, "C大学");
    }

    #[test]
    fn max_above_drops_far_reach_rows() {
        let table = load();
        let constraints = QueryConstraints {
            candidate_score: 590.0,
            max_above: Some(20.0),
            ..QueryConstraints::default()
        };
        let rows = table.select(&constraints);
        // 610 >= 590 + 20 is dropped; everything else is kept.
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn desirability_order_ranks_and_cuts() {
        let csv = "school,major,enrollment,average_score,学科评估,学校排名\n\
D大学,金融,50,560,B,200\n\
A大学,临床医学,100,610,A+,10\n\
B大学,法学,100,600,,\n\
C大学,计算机,100,600,,\n\
E大学,历史,10,480,A+,1\n\
F大学,哲学,many,600,,\n";
        let table = read_admission_table(csv.as_bytes(), "ranked".to_string()).unwrap();
        assert_eq!(table.rows[0].assessment.as_deref(), Some("B"));
        assert_eq!(table.rows[0].school_rank, Some(200.0));
        assert_eq!(table.rows[2].assessment, None);

        let school = |r: &RawRecord| r.cells()[0].to_string();
        let mut constraints = QueryConstraints {
            candidate_score: 600.0,
            ..QueryConstraints::default()
        };

        let file_order: Vec<_> = table.select(&constraints).iter().map(school).collect();
        assert_eq!(file_order.len(), 6);
        assert_eq!(file_order[0], "\"D大学\"");

        constraints.by_desirability = true;
        let ranked = table.select(&constraints);
        let names: Vec<_> = ranked.iter().map(school).collect();
        // A 0.938, B = C 0.650 (file order kept), D 0.531, E 0.184 dropped,
        // F unreadable and left last for the aggregator.
        assert_eq!(names, ["\"A大学\"", "\"B大学\"", "\"C大学\"", "\"D大学\"", "\"F大学\""]);
        assert_eq!(table.select(&constraints), ranked);
    }

    #[test]
    fn missing_required_column_is_config_error() {
        let err = read_admission_table("school,major,enrollment\nA,X,1\n".as_bytes(), "x".to_string())
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("average_score"));
    }

    #[test]
    fn bad_values_reach_the_aggregator() {
        let csv = "school_name,major_name,enrollment,average_score\nA,X,many,600\n";
        let table = read_admission_table(csv.as_bytes(), "x".to_string()).unwrap();
        let rows = table.select(&QueryConstraints::default());
        assert!(matches!(
            tiering::recommend(&rows, 600.0),
            Err(PipelineError::MalformedRow { index: 0, .. })
        ));
    }

    #[test]
    fn reads_candidates() {
        let csv = "id,score,rank,major,exclude_major,subjects\n\
s1,600,1200,医学,,物理、化学、生物\n\
s2,545.5,,,法学,\n";
        let candidates = read_candidates(csv.as_bytes()).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id, "s1");
        assert_eq!(candidates[0].profile.rank, Some(1200));
        assert_eq!(candidates[0].profile.want_major.as_deref(), Some("医学"));
        assert_eq!(candidates[0].profile.unwant_major, None);
        assert_eq!(candidates[0].profile.subjects, ["物理", "化学", "生物"]);
        assert_eq!(candidates[1].profile.score, 545.5);
        assert_eq!(candidates[1].profile.unwant_major.as_deref(), Some("法学"));
        assert!(candidates[1].profile.subjects.is_empty());
    }

    #[test]
    fn out_of_range_candidate_fails_load() {
        let err = read_candidates("id,score\nx,900\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn short_rows_become_null_cells() {
        let csv = "school_name,major_name,enrollment,average_score\nA,X\n";
        let table = read_admission_table(csv.as_bytes(), "x".to_string()).unwrap();
        assert_eq!(table.rows[0].record.cells()[2], Cell::Null);
    }
}
