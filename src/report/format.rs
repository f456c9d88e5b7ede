//! Formatted terminal output.
//!
//! We keep formatting code in one place so the engine stays free of
//! presentation concerns and output changes are localized.

use chrono::Local;

use crate::app::pipeline::{BatchOutcome, RunOutput};
use crate::domain::{CandidateProfile, LabelStyle, ScoredSchool, Tier};
use crate::tiering::Tiering;

/// Format the run summary (candidate, source, row/school counts, tier counts).
pub fn format_run_summary(run: &RunOutput, profile: &CandidateProfile) -> String {
    let mut out = String::new();

    out.push_str("=== admit - Reach / Match / Safety ===\n");
    out.push_str(&format!("Generated: {}\n", Local::now().format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("Source: {}\n", run.source));
    out.push_str(&format!("Score: {}", profile.score));
    if let Some(rank) = profile.rank {
        out.push_str(&format!(" | rank {rank}"));
    }
    out.push('\n');
    if let Some(major) = &profile.want_major {
        out.push_str(&format!("Major: {major}\n"));
    }
    if let Some(major) = &profile.unwant_major {
        out.push_str(&format!("Excluding: {major}\n"));
    }
    if !profile.subjects.is_empty() {
        out.push_str(&format!("Subjects: {}\n", profile.subjects.join(", ")));
    }

    out.push_str(&format_counts(&run.tiering));
    out.push('\n');
    out
}

fn format_counts(tiering: &Tiering) -> String {
    let q = &tiering.qualified;
    format!(
        "Rows: {} | schools: {} | qualified reach={} match={} safety={}\n",
        tiering.records, tiering.schools, q.reach, q.matched, q.safety
    )
}

/// Format the three tier tables.
pub fn format_tiers(tiering: &Tiering, labels: LabelStyle) -> String {
    let mut out = String::new();

    for (i, tier) in Tier::ALL.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let shown = tiering.result.tier(tier);
        let qualified = tiering.qualified.get(tier);
        out.push_str(&format!("{} ({} of {qualified}):\n", tier.label(labels), shown.len()));
        out.push_str(&format_table(shown));
    }

    out
}

/// One line per candidate: shown/qualified counts per tier and the top pick.
pub fn format_batch_summary(outcomes: &[BatchOutcome]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<16} {:>7} {:>9} {:>9} {:>9}  {}\n",
        "candidate", "score", "reach", "match", "safety", "top match"
    ));
    out.push_str(&format!("{:-<16} {:-<7} {:-<9} {:-<9} {:-<9}  {:-<12}\n", "", "", "", "", "", ""));

    for o in outcomes {
        let t = &o.run.tiering;
        let counts = |tier: Tier| format!("{}/{}", t.result.tier(tier).len(), t.qualified.get(tier));
        let top = t
            .result
            .matched
            .first()
            .map(|s| format!("{} {}", s.summary.school_name, s.probability_label()))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<16} {:>7.1} {:>9} {:>9} {:>9}  {}\n",
            truncate(&o.candidate.id, 16),
            o.candidate.profile.score,
            counts(Tier::Reach),
            counts(Tier::Match),
            counts(Tier::Safety),
            top,
        ));
    }

    out
}

fn format_table(rows: &[ScoredSchool]) -> String {
    if rows.is_empty() {
        return "  (none)\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<28} {:>10} {:>10} {:>8}\n",
        "school", "enrollment", "avg_score", "prob"
    ));
    out.push_str(&format!("{:-<28} {:-<10} {:-<10} {:-<8}\n", "", "", "", ""));

    for r in rows {
        out.push_str(
            format!(
                "{:<28} {:>10} {:>10.1} {:>8}\n",
                truncate(&r.summary.school_name, 28),
                r.summary.total_enrollment,
                r.summary.representative_average_score,
                r.probability_label(),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cell, RawRecord};
    use crate::tiering;

    fn rec(school: &str, enroll: i64, avg: f64) -> RawRecord {
        RawRecord::new(vec![
            Cell::Text(school.to_string()),
            Cell::Text("X".to_string()),
            Cell::Int(enroll),
            Cell::Float(avg),
        ])
    }

    #[test]
    fn tables_show_shown_and_qualified_counts() {
        let mut records: Vec<_> = (0..7).map(|i| rec(&format!("R{i}"), 10, 620.0 + i as f64)).collect();
        records.push(rec("M", 10, 600.0));
        let tiering = tiering::run(&records, 600.0).unwrap();

        let text = format_tiers(&tiering, LabelStyle::En);
        assert!(text.contains("Reach (5 of 7):"));
        assert!(text.contains("Match (1 of 1):"));
        assert!(text.contains("Safety (0 of 0):\n  (none)"));
        assert!(text.contains("R0"));
        assert!(!text.contains("R5"));
    }

    #[test]
    fn zh_labels_in_tables() {
        let tiering = tiering::run(&[rec("C大学", 80, 580.0)], 600.0).unwrap();
        let text = format_tiers(&tiering, LabelStyle::Zh);
        assert!(text.contains("保一保 (1 of 1):"));
        assert!(text.contains("99.0%"));
    }

    #[test]
    fn batch_summary_has_one_line_per_candidate() {
        use crate::app::pipeline::run_batch;
        use crate::domain::{Candidate, CandidateProfile};
        use crate::io::ingest::read_admission_table;

        let table = read_admission_table(
            "school,major,enrollment,average_score\nA大学,X,100,610\nB大学,Z,200,595\n".as_bytes(),
            "t".to_string(),
        )
        .unwrap();
        let candidates = vec![
            Candidate {
                id: "s1".to_string(),
                profile: CandidateProfile::new(600.0),
            },
            Candidate {
                id: "s2".to_string(),
                profile: CandidateProfile::new(700.0),
            },
        ];
        let outcomes = run_batch(&table, &candidates, Default::default()).unwrap();

        let text = format_batch_summary(&outcomes);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("s1"));
        assert!(lines[2].contains("B大学 90.0%"));
        assert!(lines[3].ends_with(" -"));
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("北京大学", 10), "北京大学");
    }
}
