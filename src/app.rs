//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - opens the row source (CSV table or HTTP service)
//! - runs the tiering pipeline for one or many candidates
//! - prints reports
//! - writes optional exports

use std::fs::File;
use std::io::Write;

use clap::Parser;
use serde::Serialize;

use crate::cli::{BatchArgs, Command, OutputArgs, RecommendArgs, SampleArgs, SourceArgs};
use crate::data::{SampleConfig, generate_sample};
use crate::domain::{CandidateProfile, LabelStyle, OutputFormat, RecommendConfig, RowSourceSpec, SourceFilters};
use crate::error::AppError;
use crate::io::export::BatchEntryJson;

pub mod pipeline;

/// Entry point for the `admit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    crate::logging::init();

    match cli.command {
        Command::Recommend(args) => handle_recommend(args),
        Command::Batch(args) => handle_batch(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let config = recommend_config_from_args(&args);
    let run = pipeline::run_recommend(&config)?;
    let result = &run.tiering.result;

    match config.output {
        OutputFormat::Table => {
            println!("{}", crate::report::format_run_summary(&run, &config.profile));
            print!("{}", crate::report::format_tiers(&run.tiering, config.labels));
        }
        OutputFormat::Json => {
            println!("{}", crate::io::export::result_to_json(result, config.labels)?);
        }
    }

    // Optional exports.
    if let Some(path) = &config.export_json {
        crate::io::export::write_result_json(path, result, config.labels)?;
    }
    if let Some(path) = &config.export_csv {
        crate::io::export::write_results_csv_file(path, [("", result)], config.labels)?;
    }

    Ok(())
}

fn handle_batch(args: BatchArgs) -> Result<(), AppError> {
    let candidates = crate::io::ingest::load_candidates(&args.candidates)?;
    let source = pipeline::open_source(&source_spec_from_args(&args.source))?;
    let outcomes = pipeline::run_batch(source.as_ref(), &candidates, source_filters_from_args(&args.source))?;

    match args.format {
        OutputFormat::Table => print!("{}", crate::report::format_batch_summary(&outcomes)),
        OutputFormat::Json => {
            let entries = batch_entries(&outcomes, args.output.labels);
            println!("{}", crate::io::export::batch_to_json(&entries)?);
        }
    }

    export_batch(&args.output, &outcomes)
}

fn batch_entries(outcomes: &[pipeline::BatchOutcome], labels: LabelStyle) -> Vec<BatchEntryJson<'_>> {
    outcomes
        .iter()
        .map(|o| BatchEntryJson {
            candidate: &o.candidate.id,
            score: o.candidate.profile.score,
            result: o.run.tiering.result.labeled(labels),
        })
        .collect()
}

fn export_batch(output: &OutputArgs, outcomes: &[pipeline::BatchOutcome]) -> Result<(), AppError> {
    if let Some(path) = &output.export {
        crate::io::export::write_batch_json(path, &batch_entries(outcomes, output.labels))?;
    }
    if let Some(path) = &output.export_csv {
        crate::io::export::write_results_csv_file(
            path,
            outcomes
                .iter()
                .map(|o| (o.candidate.id.as_str(), &o.run.tiering.result)),
            output.labels,
        )?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct SampleCsvRow<'a> {
    school_name: &'a str,
    major_name: &'a str,
    enrollment: u32,
    average_score: f64,
    subject_requirement: &'a str,
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = sample_config_from_args(&args);
    let rows = generate_sample(&config)?;

    let sink: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(
            File::create(path)
                .map_err(|e| AppError::new(2, format!("Failed to create sample CSV '{}': {e}", path.display())))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };

    let mut wtr = csv::Writer::from_writer(sink);
    for r in &rows {
        wtr.serialize(SampleCsvRow {
            school_name: &r.row.school_name,
            major_name: &r.row.major_name,
            enrollment: r.row.enrollment,
            average_score: r.row.average_score,
            subject_requirement: &r.subject_requirement,
        })
        .map_err(|e| AppError::new(4, format!("Failed to write sample row: {e}")))?;
    }
    wtr.flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush sample CSV: {e}")))?;

    tracing::info!(rows = rows.len(), seed = config.seed, "sample written");
    Ok(())
}

fn source_filters_from_args(args: &SourceArgs) -> SourceFilters {
    SourceFilters {
        max_above: args.max_above,
        by_desirability: args.by_desirability,
    }
}

fn source_spec_from_args(args: &SourceArgs) -> RowSourceSpec {
    match &args.csv {
        Some(path) => RowSourceSpec::Csv(path.clone()),
        None => RowSourceSpec::Http {
            url: args.url.clone(),
            timeout_secs: args.timeout,
        },
    }
}

pub fn recommend_config_from_args(args: &RecommendArgs) -> RecommendConfig {
    RecommendConfig {
        source: source_spec_from_args(&args.source),
        profile: CandidateProfile {
            score: args.score,
            rank: args.rank,
            want_major: args.major.clone().filter(|m| !m.trim().is_empty()),
            unwant_major: args.exclude_major.clone().filter(|m| !m.trim().is_empty()),
            subjects: args
                .subjects
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        },
        filters: source_filters_from_args(&args.source),
        labels: args.output.labels,
        output: args.format,
        export_json: args.output.export.clone(),
        export_csv: args.output.export_csv.clone(),
    }
}

pub fn sample_config_from_args(args: &SampleArgs) -> SampleConfig {
    SampleConfig {
        schools: args.schools,
        min_majors: args.min_majors,
        max_majors: args.max_majors,
        score_mean: args.mean,
        score_sd: args.sd,
        seed: args.seed,
        ..SampleConfig::default()
    }
}
