//! Error types.
//!
//! Two layers:
//! - `PipelineError`: typed failures of the tiering pipeline and its row sources.
//! - `AppError`: what the binary reports (message + process exit code).

use thiserror::Error;

/// Failures surfaced by a pipeline run.
///
/// Every variant aborts the whole run. No partial recommendation is produced.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    /// A raw record could not be turned into an admission row.
    #[error("malformed row #{index} {record}: {reason}")]
    MalformedRow {
        /// Zero-based position of the record in the row set.
        index: usize,
        /// Rendered content of the offending record.
        record: String,
        reason: String,
    },

    /// The row source did not answer within its deadline.
    #[error("upstream row fetch timed out after {seconds}s")]
    UpstreamTimeout { seconds: u64 },

    /// The row source answered with an error or an unusable payload.
    #[error("upstream row fetch failed: {0}")]
    UpstreamFailure(String),
}

impl PipelineError {
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::MalformedRow { .. } => 3,
            PipelineError::UpstreamTimeout { .. } | PipelineError::UpstreamFailure(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_exit_codes() {
        let malformed = PipelineError::MalformedRow {
            index: 2,
            record: "[\"A\"]".to_string(),
            reason: "expected at least 4 fields, got 1".to_string(),
        };
        let app: AppError = malformed.into();
        assert_eq!(app.exit_code(), 3);
        assert!(app.to_string().contains("malformed row #2"));

        let timeout: AppError = PipelineError::UpstreamTimeout { seconds: 30 }.into();
        assert_eq!(timeout.exit_code(), 4);
        assert_eq!(timeout.to_string(), "upstream row fetch timed out after 30s");
    }
}
