//! Export recommendation results.
//!
//! - JSON: the three-key result object, non-ASCII text written unescaped
//! - CSV: one flat row per recommended school, easy to open in a spreadsheet

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{LabelStyle, LabeledResult, RecommendationResult, Tier};
use crate::error::AppError;

/// Render a result as pretty JSON with the chosen tier labels.
pub fn result_to_json(result: &RecommendationResult, labels: LabelStyle) -> Result<String, AppError> {
    serde_json::to_string_pretty(&result.labeled(labels))
        .map_err(|e| AppError::new(4, format!("Failed to serialize result JSON: {e}")))
}

/// Write a result JSON file.
pub fn write_result_json(path: &Path, result: &RecommendationResult, labels: LabelStyle) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create result JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, &result.labeled(labels))
        .map_err(|e| AppError::new(2, format!("Failed to write result JSON: {e}")))?;
    Ok(())
}

/// One candidate's entry in batch JSON output.
#[derive(Debug, Serialize)]
pub struct BatchEntryJson<'a> {
    pub candidate: &'a str,
    pub score: f64,
    pub result: LabeledResult<'a>,
}

/// Render batch results as a pretty JSON array, in candidate order.
pub fn batch_to_json(entries: &[BatchEntryJson<'_>]) -> Result<String, AppError> {
    serde_json::to_string_pretty(entries)
        .map_err(|e| AppError::new(4, format!("Failed to serialize batch JSON: {e}")))
}

/// Write batch results as a JSON file.
pub fn write_batch_json(path: &Path, entries: &[BatchEntryJson<'_>]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create batch JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, entries)
        .map_err(|e| AppError::new(2, format!("Failed to write batch JSON: {e}")))?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    candidate: &'a str,
    tier: &'a str,
    school_name: &'a str,
    total_enrollment: u64,
    representative_average_score: f64,
    admission_probability: String,
}

/// Write per-school results for one or more candidates to CSV.
pub fn write_results_csv<'a, W: Write>(
    writer: W,
    results: impl IntoIterator<Item = (&'a str, &'a RecommendationResult)>,
    labels: LabelStyle,
) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (candidate, result) in results {
        for tier in Tier::ALL {
            for school in result.tier(tier) {
                wtr.serialize(CsvRow {
                    candidate,
                    tier: tier.label(labels),
                    school_name: &school.summary.school_name,
                    total_enrollment: school.summary.total_enrollment,
                    representative_average_score: school.summary.representative_average_score,
                    admission_probability: school.probability_label(),
                })
                .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
            }
        }
    }
    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Write per-school results to a CSV file.
pub fn write_results_csv_file<'a>(
    path: &Path,
    results: impl IntoIterator<Item = (&'a str, &'a RecommendationResult)>,
    labels: LabelStyle,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results_csv(file, results, labels)
}
