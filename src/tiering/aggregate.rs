//! Collapse per-major admission rows into one summary per school.
//!
//! The aggregator is the first place untrusted upstream data is looked at, so
//! it also owns validation of loosely-typed records into `RawAdmissionRow`s.
//! Nothing is coerced: a record that does not carry a usable enrollment or
//! score fails the whole aggregation.

use std::collections::HashMap;

use crate::domain::{Cell, RawAdmissionRow, RawRecord, SchoolSummary};
use crate::error::PipelineError;

/// Number of positional fields a record must carry.
pub const REQUIRED_FIELDS: usize = 4;

/// Validate one positional record.
///
/// `index` is the record's zero-based position in its row set and is only used
/// for error reporting.
pub fn parse_record(index: usize, record: &RawRecord) -> Result<RawAdmissionRow, PipelineError> {
    let malformed = |reason: String| PipelineError::MalformedRow {
        index,
        record: record.to_string(),
        reason,
    };

    let cells = record.cells();
    if cells.len() < REQUIRED_FIELDS {
        return Err(malformed(format!(
            "expected at least {REQUIRED_FIELDS} fields, got {}",
            cells.len()
        )));
    }

    let school_name = parse_name(&cells[0]).map_err(|e| malformed(format!("school_name: {e}")))?;
    let major_name = parse_name(&cells[1]).map_err(|e| malformed(format!("major_name: {e}")))?;
    let enrollment = parse_enrollment(&cells[2]).map_err(|e| malformed(format!("enrollment: {e}")))?;
    let average_score = parse_score(&cells[3]).map_err(|e| malformed(format!("average_score: {e}")))?;

    Ok(RawAdmissionRow {
        school_name,
        major_name,
        enrollment,
        average_score,
    })
}

/// Validate every record, then aggregate.
///
/// Fails on the first malformed record; no partial output is returned.
pub fn aggregate_records(records: &[RawRecord]) -> Result<Vec<SchoolSummary>, PipelineError> {
    let rows = records
        .iter()
        .enumerate()
        .map(|(idx, record)| parse_record(idx, record))
        .collect::<Result<Vec<_>, _>>()?;

    let summaries = aggregate_rows(&rows);
    tracing::debug!(
        records = records.len(),
        schools = summaries.len(),
        "aggregated admission rows"
    );
    Ok(summaries)
}

/// Aggregate already-validated rows.
///
/// Output is in first-seen order of `school_name`.
pub fn aggregate_rows(rows: &[RawAdmissionRow]) -> Vec<SchoolSummary> {
    let mut index_by_school: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<SchoolSummary> = Vec::new();

    for row in rows {
        let idx = *index_by_school
            .entry(row.school_name.as_str())
            .or_insert_with(|| {
                summaries.push(SchoolSummary {
                    school_name: row.school_name.clone(),
                    total_enrollment: 0,
                    representative_average_score: row.average_score,
                });
                summaries.len() - 1
            });

        let summary = &mut summaries[idx];
        summary.total_enrollment += u64::from(row.enrollment);
        if row.average_score > summary.representative_average_score {
            summary.representative_average_score = row.average_score;
        }
    }

    summaries
}

fn parse_name(cell: &Cell) -> Result<String, String> {
    match cell {
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                Err("empty text".to_string())
            } else {
                Ok(s.to_string())
            }
        }
        Cell::Int(i) => Ok(i.to_string()),
        other => Err(format!("expected text, got {other}")),
    }
}

fn parse_enrollment(cell: &Cell) -> Result<u32, String> {
    match cell {
        Cell::Int(i) => u32::try_from(*i).map_err(|_| format!("{i} is not a non-negative count")),
        Cell::Float(v) => {
            if v.is_finite() && v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(u32::MAX) {
                Ok(*v as u32)
            } else {
                Err(format!("{v} is not a non-negative whole number"))
            }
        }
        Cell::Text(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("{s:?} is not a non-negative integer")),
        other => Err(format!("expected an integer, got {other}")),
    }
}

fn parse_score(cell: &Cell) -> Result<f64, String> {
    let v = match cell {
        Cell::Int(i) => *i as f64,
        Cell::Float(v) => *v,
        Cell::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("{s:?} is not a number"))?,
        other => return Err(format!("expected a number, got {other}")),
    };
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("{v} is not finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(school: &str, major: &str, enroll: i64, avg: f64) -> RawRecord {
        RawRecord::new(vec![
            Cell::Text(school.to_string()),
            Cell::Text(major.to_string()),
            Cell::Int(enroll),
            Cell::Float(avg),
        ])
    }

    #[test]
    fn sums_enrollment_and_keeps_max_score() {
        let records = vec![
            rec("A大学", "X", 100, 610.0),
            rec("B大学", "Z", 200, 595.0),
            rec("A大学", "Y", 50, 605.0),
            rec("A大学", "X", 10, 612.5),
        ];

        let summaries = aggregate_records(&records).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].school_name, "A大学");
        assert_eq!(summaries[0].total_enrollment, 160);
        assert_eq!(summaries[0].representative_average_score, 612.5);
        assert_eq!(summaries[1].school_name, "B大学");
        assert_eq!(summaries[1].total_enrollment, 200);
    }

    #[test]
    fn preserves_first_seen_order() {
        let records = vec![
            rec("C", "m", 1, 500.0),
            rec("A", "m", 1, 500.0),
            rec("C", "n", 1, 500.0),
            rec("B", "m", 1, 500.0),
        ];
        let names: Vec<_> = aggregate_records(&records)
            .unwrap()
            .into_iter()
            .map(|s| s.school_name)
            .collect();
        assert_eq!(names, ["C", "A", "B"]);
    }

    #[test]
    fn empty_input_yields_no_summaries() {
        assert!(aggregate_records(&[]).unwrap().is_empty());
    }

    #[test]
    fn accepts_text_and_integral_float_cells() {
        let record = RawRecord::new(vec![
            Cell::Text(" A ".to_string()),
            Cell::Text("X".to_string()),
            Cell::Float(120.0),
            Cell::Text("598.5".to_string()),
            Cell::Text("ignored trailing field".to_string()),
        ]);
        let row = parse_record(0, &record).unwrap();
        assert_eq!(row, RawAdmissionRow::new("A", "X", 120, 598.5));

        let record = RawRecord::new(vec![
            Cell::Text("A".to_string()),
            Cell::Text("X".to_string()),
            Cell::Text("75".to_string()),
            Cell::Int(600),
        ]);
        assert_eq!(parse_record(0, &record).unwrap().enrollment, 75);
    }

    #[test]
    fn rejects_non_numeric_enrollment_and_aborts() {
        let mut records = vec![rec("A", "X", 100, 610.0)];
        records.push(RawRecord::new(vec![
            Cell::Text("B".to_string()),
            Cell::Text("Y".to_string()),
            Cell::Text("1,200".to_string()),
            Cell::Float(590.0),
        ]));

        let err = aggregate_records(&records).unwrap_err();
        match err {
            PipelineError::MalformedRow { index, record, reason } => {
                assert_eq!(index, 1);
                assert!(record.contains("\"1,200\""));
                assert!(reason.starts_with("enrollment:"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_short_negative_and_non_finite_rows() {
        let short = RawRecord::new(vec![Cell::Text("A".to_string()), Cell::Text("X".to_string())]);
        assert!(matches!(
            parse_record(0, &short),
            Err(PipelineError::MalformedRow { .. })
        ));

        assert!(parse_record(0, &rec("A", "X", -5, 600.0)).is_err());
        assert!(parse_record(0, &rec("A", "X", 5, f64::NAN)).is_err());

        let fractional = RawRecord::new(vec![
            Cell::Text("A".to_string()),
            Cell::Text("X".to_string()),
            Cell::Float(12.5),
            Cell::Float(600.0),
        ]);
        assert!(parse_record(0, &fractional).is_err());

        let text_nan = RawRecord::new(vec![
            Cell::Text("A".to_string()),
            Cell::Text("X".to_string()),
            Cell::Int(1),
            Cell::Text("NaN".to_string()),
        ]);
        assert!(parse_record(0, &text_nan).is_err());

        let null_name = RawRecord::new(vec![Cell::Null, Cell::Text("X".to_string()), Cell::Int(1), Cell::Int(600)]);
        assert!(parse_record(0, &null_name).is_err());
    }
}
