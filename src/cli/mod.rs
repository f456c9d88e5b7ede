//! Command-line parsing for the admission advisor.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! tiering engine and the row sources.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{LabelStyle, OutputFormat};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "admit", version, about = "College admission advisor (Reach / Match / Safety)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Recommend schools for one candidate.
    Recommend(RecommendArgs),
    /// Recommend schools for every candidate listed in a CSV file.
    ///
    /// Candidates are scored in parallel against the same row source.
    Batch(BatchArgs),
    /// Write a synthetic admissions table (for demos and testing).
    Sample(SampleArgs),
}

/// Where admission rows come from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Admissions table CSV (school, major, enrollment, average score).
    #[arg(short = 'f', long, value_name = "CSV", conflicts_with = "url")]
    pub csv: Option<PathBuf>,

    /// Row service URL (defaults to ADMIT_ROWS_URL from the environment / .env).
    #[arg(long)]
    pub url: Option<String>,

    /// Row service timeout in seconds (defaults to ADMIT_TIMEOUT_SECS or 30).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Ignore programs whose score is this many points (or more) above the candidate.
    #[arg(long, value_name = "POINTS")]
    pub max_above: Option<f64>,

    /// Rank rows by desirability (score fit, discipline grade, school rank,
    /// enrollment) and drop weak ones. Default is source order.
    #[arg(long)]
    pub by_desirability: bool,
}

/// Output options shared by `recommend` and `batch`.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Tier labels used in JSON output and tables.
    #[arg(long, value_enum, default_value_t = LabelStyle::En)]
    pub labels: LabelStyle,

    /// Export the result(s) as JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Export one row per recommended school as CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,
}

/// Options for a single recommendation.
#[derive(Debug, Args, Clone)]
pub struct RecommendArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Candidate exam score.
    #[arg(short = 's', long)]
    pub score: f64,

    /// Candidate province rank (informational).
    #[arg(long)]
    pub rank: Option<u32>,

    /// Desired major (substring match, e.g. 医学).
    #[arg(short = 'm', long)]
    pub major: Option<String>,

    /// Major to exclude (substring match).
    #[arg(long = "exclude-major")]
    pub exclude_major: Option<String>,

    /// Elective subjects, comma-separated (e.g. 物理,化学,生物).
    #[arg(long, value_delimiter = ',')]
    pub subjects: Vec<String>,

    /// Terminal output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Options for batch recommendations.
#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Candidates CSV with columns `id,score` and optional `rank,major,exclude_major,subjects`.
    #[arg(long, value_name = "CSV")]
    pub candidates: PathBuf,

    /// Terminal output format (`json` prints one entry per candidate).
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Options for synthetic table generation.
#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Number of schools.
    #[arg(short = 'n', long, default_value_t = 40)]
    pub schools: usize,

    /// Minimum majors per school.
    #[arg(long, default_value_t = 1)]
    pub min_majors: usize,

    /// Maximum majors per school.
    #[arg(long, default_value_t = 6)]
    pub max_majors: usize,

    /// Mean of the per-school top score.
    #[arg(long, default_value_t = 590.0)]
    pub mean: f64,

    /// Standard deviation of the per-school top score.
    #[arg(long, default_value_t = 45.0)]
    pub sd: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV (stdout if omitted).
    #[arg(short = 'o', long, value_name = "CSV")]
    pub out: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recommend_flags() {
        let cli = Cli::try_parse_from([
            "admit", "recommend", "-f", "rows.csv", "-s", "600", "-m", "医学", "--subjects", "物理,化学,生物",
            "--labels", "zh", "--format", "json",
        ])
        .unwrap();

        let Command::Recommend(args) = cli.command else {
            panic!("expected recommend");
        };
        assert_eq!(args.source.csv, Some(PathBuf::from("rows.csv")));
        assert_eq!(args.score, 600.0);
        assert_eq!(args.major.as_deref(), Some("医学"));
        assert_eq!(args.subjects, ["物理", "化学", "生物"]);
        assert_eq!(args.output.labels, LabelStyle::Zh);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn parses_batch_flags() {
        let cli = Cli::try_parse_from([
            "admit", "batch", "-f", "rows.csv", "--candidates", "c.csv", "--by-desirability", "--format", "json",
        ])
        .unwrap();

        let Command::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        assert!(args.source.by_desirability);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.candidates, PathBuf::from("c.csv"));
    }

    #[test]
    fn csv_and_url_conflict() {
        let res = Cli::try_parse_from([
            "admit", "recommend", "-f", "rows.csv", "--url", "http://x", "-s", "600",
        ]);
        assert!(res.is_err());
    }
}
