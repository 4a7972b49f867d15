//! JSON output formatting.

use anyhow::Result;
use leadsearch_core::OperationStatus;
use leadsearch_fetch::{ForwardStatus, PageAttempt, PageStatus, QuotaStatus, SearchRun};
use serde::Serialize;
use std::time::Duration;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for a search run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutput {
    pub query: String,
    pub requested: u32,
    pub found: usize,
    pub complete: bool,
    pub results: Vec<ResultOutput>,
    pub score: ScoreOutput,
    pub pages: Vec<PageOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degradations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink: Option<SinkOutput>,
    pub duration_ms: u64,
}

/// A single search result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultOutput {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Relevance score with threshold verdict.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutput {
    pub value: f64,
    pub threshold: f64,
    pub meets_threshold: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A single page attempt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOutput {
    pub index: u32,
    pub start: u32,
    pub count: u32,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub attempts: u32,
    pub duration_ms: u64,
}

/// URL log and forwarding outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkOutput {
    pub persisted: usize,
    pub persist_failures: usize,
    pub forwarded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_error: Option<String>,
}

/// Quota consumption.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageOutput {
    pub service: String,
    pub used: u64,
    pub effective_budget: u64,
    pub monthly_limit: u64,
    pub safety_factor: f64,
    pub remaining: u64,
}

// ============================================================================
// Conversions
// ============================================================================

impl SearchOutput {
    /// Builds the output for a finished run.
    pub fn from_run(run: &SearchRun, threshold: f64) -> Self {
        Self {
            query: run.query.clone(),
            requested: run.desired_count,
            found: run.results.len(),
            complete: run.status.is_complete(),
            results: run
                .results
                .iter()
                .map(|r| ResultOutput {
                    url: r.url.clone(),
                    title: r.title.clone(),
                    snippet: r.snippet.clone(),
                })
                .collect(),
            score: ScoreOutput {
                value: run.score.score.value(),
                threshold,
                meets_threshold: run.score.score.meets(threshold),
                status: status_name(&run.score.status),
                reason: run.score.status.reason().map(str::to_string),
            },
            pages: run.pages.iter().map(page_output).collect(),
            degradations: run
                .status
                .degradations()
                .iter()
                .map(ToString::to_string)
                .collect(),
            sink: run.sink.as_ref().map(|sink| {
                let forward_error = match &sink.forward {
                    ForwardStatus::Acknowledged { .. } => None,
                    ForwardStatus::Failed { reason } => Some(reason.clone()),
                };
                SinkOutput {
                    persisted: sink.persist.written,
                    persist_failures: sink.persist.failures.len(),
                    forwarded: forward_error.is_none(),
                    forward_error,
                }
            }),
            duration_ms: millis(run.duration),
        }
    }
}

impl UsageOutput {
    /// Builds the output for a quota snapshot.
    pub fn new(service: &str, status: &QuotaStatus, safety_factor: f64) -> Self {
        Self {
            service: service.to_string(),
            used: status.used,
            effective_budget: status.effective_budget,
            monthly_limit: status.monthly_limit,
            safety_factor,
            remaining: status.remaining,
        }
    }
}

fn page_output(attempt: &PageAttempt) -> PageOutput {
    let (outcome, results, reason) = match &attempt.status {
        PageStatus::Fetched { results } => ("fetched", Some(*results), None),
        PageStatus::Failed { reason } => ("failed", None, Some(reason.clone())),
        PageStatus::QuotaExhausted => ("quota_exhausted", None, None),
        PageStatus::LedgerUnavailable { reason } => {
            ("ledger_unavailable", None, Some(reason.clone()))
        }
        PageStatus::DeadlineExceeded => ("deadline_exceeded", None, None),
    };

    PageOutput {
        index: attempt.page.index,
        start: attempt.page.start,
        count: attempt.page.count,
        outcome,
        results,
        reason,
        attempts: attempt.attempts,
        duration_ms: millis(attempt.duration),
    }
}

fn status_name(status: &OperationStatus) -> &'static str {
    match status {
        OperationStatus::Success => "success",
        OperationStatus::Degraded(_) => "degraded",
        OperationStatus::Fatal(_) => "fatal",
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }
}
