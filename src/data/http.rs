//! HTTP integration with the tabular-query service that supplies admission rows.
//!
//! The service is expected to answer
//! `GET <url>?score=..&major=..&exclude_major=..&subjects=..[&order=desirability]` with
//! `{"rows": [[school, major, enrollment, average_score, ...], ...]}`.
//! Ranking by desirability is the service's job; rows keep the order received.
//! Calls are bounded by a timeout and never retried here.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::source::{RowSource, within_max_above};
use crate::domain::{Cell, QueryConstraints, RawRecord};
use crate::error::{AppError, PipelineError};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_URL: &str = "ADMIT_ROWS_URL";
const ENV_API_KEY: &str = "ADMIT_API_KEY";
const ENV_TIMEOUT: &str = "ADMIT_TIMEOUT_SECS";

pub struct HttpRowSource {
    client: Client,
    url: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl HttpRowSource {
    /// Build a source from explicit settings, falling back to `.env` / environment.
    pub fn from_env(url: Option<String>, timeout_secs: Option<u64>) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let url = match url {
            Some(url) => url,
            None => std::env::var(ENV_URL)
                .map_err(|_| AppError::new(2, format!("Missing --url and {ENV_URL} in environment (.env).")))?,
        };
        let api_key = std::env::var(ENV_API_KEY).ok().filter(|k| !k.trim().is_empty());

        let timeout_secs = match timeout_secs {
            Some(t) => t,
            None => match std::env::var(ENV_TIMEOUT) {
                Ok(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| AppError::new(2, format!("Invalid {ENV_TIMEOUT} '{raw}' (expected seconds).")))?,
                Err(_) => DEFAULT_TIMEOUT_SECS,
            },
        };
        if timeout_secs == 0 {
            return Err(AppError::new(2, "Upstream timeout must be > 0 seconds."));
        }

        Self::new(url, api_key, timeout_secs)
    }

    pub fn new(url: String, api_key: Option<String>, timeout_secs: u64) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::new(2, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url,
            api_key,
            timeout_secs,
        })
    }

    fn map_transport_error(&self, err: reqwest::Error) -> PipelineError {
        if err.is_timeout() {
            PipelineError::UpstreamTimeout {
                seconds: self.timeout_secs,
            }
        } else {
            PipelineError::UpstreamFailure(format!("request to {} failed: {err}", self.url))
        }
    }
}

impl RowSource for HttpRowSource {
    fn describe(&self) -> String {
        format!("http {}", self.url)
    }

    fn fetch_rows(&self, constraints: &QueryConstraints) -> Result<Vec<RawRecord>, PipelineError> {
        let subjects = constraints.subjects.join(",");
        let score = constraints.candidate_score.to_string();
        let mut query: Vec<(&str, &str)> = vec![("score", score.as_str())];
        if let Some(major) = constraints.want_major.as_deref() {
            query.push(("major", major));
        }
        if let Some(major) = constraints.unwant_major.as_deref() {
            query.push(("exclude_major", major));
        }
        if !subjects.is_empty() {
            query.push(("subjects", subjects.as_str()));
        }
        if constraints.by_desirability {
            query.push(("order", "desirability"));
        }

        let mut req = self.client.get(&self.url).query(&query);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        tracing::info!(url = %self.url, timeout_secs = self.timeout_secs, "fetching admission rows");
        let resp = req.send().map_err(|e| self.map_transport_error(e))?;

        if !resp.status().is_success() {
            return Err(PipelineError::UpstreamFailure(format!(
                "row service answered with status {}",
                resp.status()
            )));
        }

        let body = resp.text().map_err(|e| self.map_transport_error(e))?;
        let records = parse_rows_body(&body)?;

        let records: Vec<RawRecord> = records
            .into_iter()
            .filter(|r| within_max_above(record_score(r), constraints))
            .collect();
        tracing::info!(rows = records.len(), "received admission rows");
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct RowsResponse {
    rows: Vec<RawRecord>,
}

/// Decode a row-service response body.
pub fn parse_rows_body(body: &str) -> Result<Vec<RawRecord>, PipelineError> {
    let parsed: RowsResponse = serde_json::from_str(body)
        .map_err(|e| PipelineError::UpstreamFailure(format!("unreadable row service response: {e}")))?;
    Ok(parsed.rows)
}

fn record_score(record: &RawRecord) -> Option<f64> {
    match record.cells().get(3)? {
        Cell::Int(i) => Some(*i as f64),
        Cell::Float(v) => Some(*v),
        Cell::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}
