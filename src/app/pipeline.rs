//! Shared recommendation pipeline used by the `recommend` and `batch` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! open source -> fetch rows (filtered by constraints) -> tiering engine
//!
//! The command handlers can then focus on presentation (printing vs exports).

use rayon::prelude::*;

use crate::data::{HttpRowSource, RowSource};
use crate::domain::{Candidate, CandidateProfile, QueryConstraints, RecommendConfig, RowSourceSpec, SourceFilters};
use crate::error::{AppError, PipelineError};
use crate::io::ingest::load_admission_table;
use crate::tiering::{self, Tiering};

/// All computed outputs of a single recommendation.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Description of the row source the records came from.
    pub source: String,
    pub constraints: QueryConstraints,
    pub tiering: Tiering,
}

/// One candidate's outcome in a batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub candidate: Candidate,
    pub run: RunOutput,
}

/// Open the configured row source.
pub fn open_source(spec: &RowSourceSpec) -> Result<Box<dyn RowSource>, AppError> {
    match spec {
        RowSourceSpec::Csv(path) => Ok(Box::new(load_admission_table(path)?)),
        RowSourceSpec::Http { url, timeout_secs } => {
            Ok(Box::new(HttpRowSource::from_env(url.clone(), *timeout_secs)?))
        }
    }
}

/// Fetch rows for one candidate and run the tiering engine over them.
///
/// A failed fetch never reaches the engine.
pub fn run_with_source(
    source: &dyn RowSource,
    profile: &CandidateProfile,
    filters: SourceFilters,
) -> Result<RunOutput, PipelineError> {
    let constraints = QueryConstraints::for_candidate(profile, filters);
    let records = source.fetch_rows(&constraints)?;
    let tiering = tiering::run(&records, profile.score)?;

    tracing::debug!(
        score = profile.score,
        records = tiering.records,
        schools = tiering.schools,
        shown = tiering.result.len(),
        "recommendation computed"
    );

    Ok(RunOutput {
        source: source.describe(),
        constraints,
        tiering,
    })
}

/// Execute a single recommendation from a full config.
pub fn run_recommend(config: &RecommendConfig) -> Result<RunOutput, AppError> {
    config
        .profile
        .validate()
        .map_err(|e| AppError::new(2, format!("Invalid candidate: {e}")))?;

    let source = open_source(&config.source)?;
    Ok(run_with_source(source.as_ref(), &config.profile, config.filters)?)
}

/// Score every candidate against the same source, in parallel.
///
/// Outcomes are returned in input order. If any candidate fails, the error of
/// the earliest failing candidate is returned and no outcomes are.
pub fn run_batch(
    source: &dyn RowSource,
    candidates: &[Candidate],
    filters: SourceFilters,
) -> Result<Vec<BatchOutcome>, AppError> {
    let results: Vec<Result<RunOutput, PipelineError>> = candidates
        .par_iter()
        .map(|c| run_with_source(source, &c.profile, filters))
        .collect();

    let mut outcomes = Vec::with_capacity(candidates.len());
    for (candidate, result) in candidates.iter().zip(results) {
        let run = result.map_err(|e| {
            AppError::new(e.exit_code(), format!("candidate '{}': {e}", candidate.id))
        })?;
        outcomes.push(BatchOutcome {
            candidate: candidate.clone(),
            run,
        });
    }

    tracing::info!(candidates = outcomes.len(), "batch complete");
    Ok(outcomes)
}
