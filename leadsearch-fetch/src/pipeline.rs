//! Search orchestration for a single query run.
//!
//! The orchestrator plans pages for the desired result count, drives them
//! one at a time through the quota-guarded client, hands the collected URLs
//! to the result sink, and scores the combined snippets. Pagination is
//! strictly sequential: each page's quota check and ledger write completes
//! before the next page is attempted.
//!
//! Every run ends in `Done` after scoring, whatever happened while paging.

use std::fmt;
use std::time::Duration;

use leadsearch_core::{ResultSet, SearchResult};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::retry::RetryStrategy;
use crate::scoring::{RelevanceScorer, ScoreOutcome};
use crate::search::{PageError, PaginatedSearchClient, MAX_PAGE_SIZE};
use crate::sink::{ResultSink, SinkReport};

// ============================================================================
// Page Planning
// ============================================================================

/// One planned provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    /// Zero-based page index.
    pub index: u32,
    /// One-based provider offset: `index * 10 + 1`.
    pub start: u32,
    /// Results requested for this page.
    pub count: u32,
}

/// Splits `desired` results into pages of at most ten.
///
/// The counts sum to `desired`; zero yields no pages.
pub fn plan_pages(desired: u32) -> Vec<PageRequest> {
    let pages = desired.div_ceil(MAX_PAGE_SIZE);
    (0..pages)
        .map(|index| {
            let already = index * MAX_PAGE_SIZE;
            PageRequest {
                index,
                start: already + 1,
                count: MAX_PAGE_SIZE.min(desired - already),
            }
        })
        .collect()
}

// ============================================================================
// Run Records
// ============================================================================

/// Lifecycle phases of a query run, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Run accepted.
    Started,
    /// Pages are being fetched.
    Paginating,
    /// Every planned page was fetched.
    Completed,
    /// Pagination stopped early or a page was dropped.
    PartiallyCompleted,
    /// The relevance score was produced.
    Scored,
    /// The run is finished.
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Started => "started",
            RunPhase::Paginating => "paginating",
            RunPhase::Completed => "completed",
            RunPhase::PartiallyCompleted => "partially_completed",
            RunPhase::Scored => "scored",
            RunPhase::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Outcome of one planned page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PageStatus {
    /// The page returned results.
    Fetched {
        /// Results kept from this page.
        results: usize,
    },
    /// The call failed; the page contributes nothing.
    Failed {
        /// Error description.
        reason: String,
    },
    /// The quota guard refused the call.
    QuotaExhausted,
    /// The usage ledger could not be consulted.
    LedgerUnavailable {
        /// Error description.
        reason: String,
    },
    /// The run deadline passed before or during the call.
    DeadlineExceeded,
}

/// Record of a single page.
#[derive(Debug, Clone, Serialize)]
pub struct PageAttempt {
    /// The planned page.
    pub page: PageRequest,
    /// What happened.
    pub status: PageStatus,
    /// Calls made for this page, including retries.
    pub attempts: u32,
    /// Time spent on this page.
    pub duration: Duration,
}

/// Why a run did not fetch every planned page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// Quota ran out; later pages were not attempted.
    QuotaExhausted {
        /// First page not fetched.
        page: u32,
    },
    /// A page call failed and was skipped.
    PageFailed {
        /// Failed page.
        page: u32,
        /// Error description.
        reason: String,
    },
    /// The ledger was unreachable; later pages were not attempted.
    LedgerUnavailable {
        /// First page not fetched.
        page: u32,
        /// Error description.
        reason: String,
    },
    /// The caller's deadline passed; later pages were not attempted.
    DeadlineExceeded {
        /// First page not fetched.
        page: u32,
    },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::QuotaExhausted { page } => {
                write!(f, "quota exhausted at page {page}")
            }
            Degradation::PageFailed { page, reason } => {
                write!(f, "page {page} failed: {reason}")
            }
            Degradation::LedgerUnavailable { page, reason } => {
                write!(f, "usage ledger unavailable at page {page}: {reason}")
            }
            Degradation::DeadlineExceeded { page } => {
                write!(f, "deadline exceeded at page {page}")
            }
        }
    }
}

/// How pagination ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "degradations", rename_all = "snake_case")]
pub enum RunStatus {
    /// All planned pages were fetched.
    Completed,
    /// Some pages were skipped or never attempted.
    PartiallyCompleted(Vec<Degradation>),
}

impl RunStatus {
    /// Returns true if every page was fetched.
    pub fn is_complete(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    /// Returns the degradations, if any.
    pub fn degradations(&self) -> &[Degradation] {
        match self {
            RunStatus::Completed => &[],
            RunStatus::PartiallyCompleted(d) => d,
        }
    }
}

/// Everything a query run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRun {
    /// The query as given.
    pub query: String,
    /// Requested result count.
    pub desired_count: u32,
    /// Results in page order.
    pub results: ResultSet,
    /// Relevance score of the combined snippets.
    pub score: ScoreOutcome,
    /// Pagination outcome.
    pub status: RunStatus,
    /// Per-page records.
    pub pages: Vec<PageAttempt>,
    /// Sink outcome; `None` when there were no URLs.
    pub sink: Option<SinkReport>,
    /// Phases entered, in order.
    pub phases: Vec<RunPhase>,
    /// Wall time of the run.
    pub duration: Duration,
}

impl SearchRun {
    /// Returns true if the run produced any results.
    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

enum PageOutcome {
    Fetched(Vec<SearchResult>),
    Skipped(PageStatus, Degradation),
    Stop(PageStatus, Degradation),
}

/// Drives one query from pagination through scoring.
#[derive(Debug)]
pub struct SearchOrchestrator {
    client: PaginatedSearchClient,
    sink: ResultSink,
    scorer: RelevanceScorer,
    retry: RetryStrategy,
}

impl SearchOrchestrator {
    /// Creates an orchestrator that makes one attempt per page.
    pub fn new(client: PaginatedSearchClient, sink: ResultSink, scorer: RelevanceScorer) -> Self {
        Self {
            client,
            sink,
            scorer,
            retry: RetryStrategy::no_retry(),
        }
    }

    /// Sets the per-page retry strategy. Retries consume quota.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the page client.
    pub fn client(&self) -> &PaginatedSearchClient {
        &self.client
    }

    /// Runs a query to completion.
    ///
    /// Pagination stops at quota exhaustion, ledger unavailability or the
    /// deadline. Whatever was gathered is still persisted, forwarded and
    /// scored.
    #[instrument(skip_all, fields(query = %query, desired = desired_count))]
    pub async fn run(&self, query: &str, desired_count: u32, deadline: Option<Instant>) -> SearchRun {
        let started = Instant::now();
        let mut phases = vec![RunPhase::Started];
        let mut results = ResultSet::new();
        let mut pages = Vec::new();
        let mut degradations = Vec::new();

        let plan = plan_pages(desired_count);
        info!(pages = plan.len(), "Starting search run");
        enter(&mut phases, RunPhase::Paginating);

        for page in plan {
            let page_started = Instant::now();
            let (outcome, attempts) = self.fetch_page(query, page, deadline).await;
            let duration = page_started.elapsed();

            match outcome {
                PageOutcome::Fetched(page_results) => {
                    debug!(page = page.index, results = page_results.len(), "Page fetched");
                    pages.push(PageAttempt {
                        page,
                        status: PageStatus::Fetched {
                            results: page_results.len(),
                        },
                        attempts,
                        duration,
                    });
                    results.extend_page(page_results);
                }
                PageOutcome::Skipped(status, degradation) => {
                    warn!(page = page.index, %degradation, "Skipping page");
                    pages.push(PageAttempt {
                        page,
                        status,
                        attempts,
                        duration,
                    });
                    degradations.push(degradation);
                }
                PageOutcome::Stop(status, degradation) => {
                    info!(page = page.index, %degradation, "Stopping pagination");
                    pages.push(PageAttempt {
                        page,
                        status,
                        attempts,
                        duration,
                    });
                    degradations.push(degradation);
                    break;
                }
            }
        }

        let status = if degradations.is_empty() {
            enter(&mut phases, RunPhase::Completed);
            RunStatus::Completed
        } else {
            enter(&mut phases, RunPhase::PartiallyCompleted);
            RunStatus::PartiallyCompleted(degradations)
        };

        let urls = results.urls();
        let sink = if urls.is_empty() {
            debug!("No URLs to persist or forward");
            None
        } else {
            Some(self.sink.deliver(&urls).await)
        };

        let combined = results.combined_snippets();
        let score = self.scorer.score(&combined, query).await;
        enter(&mut phases, RunPhase::Scored);
        enter(&mut phases, RunPhase::Done);

        info!(
            results = results.len(),
            score = %score.score,
            complete = status.is_complete(),
            "Search run finished"
        );

        SearchRun {
            query: query.to_string(),
            desired_count,
            results,
            score,
            status,
            pages,
            sink,
            phases,
            duration: started.elapsed(),
        }
    }

    /// Fetches one page, retrying per the strategy and honoring the deadline.
    async fn fetch_page(
        &self,
        query: &str,
        page: PageRequest,
        deadline: Option<Instant>,
    ) -> (PageOutcome, u32) {
        let mut attempt = 0;

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return (deadline_exceeded(page), attempt);
            }
            attempt += 1;

            let call = self.client.fetch_page(query, page.start, page.count);
            let result = match deadline {
                Some(d) => match tokio::time::timeout_at(d, call).await {
                    Ok(result) => result,
                    Err(_) => return (deadline_exceeded(page), attempt),
                },
                None => call.await,
            };

            let error = match result {
                Ok(page_results) => return (PageOutcome::Fetched(page_results), attempt),
                Err(e) => e,
            };

            let outcome = match error {
                PageError::QuotaExhausted { .. } => PageOutcome::Stop(
                    PageStatus::QuotaExhausted,
                    Degradation::QuotaExhausted { page: page.index },
                ),
                PageError::LedgerUnavailable(e) => PageOutcome::Stop(
                    PageStatus::LedgerUnavailable {
                        reason: e.to_string(),
                    },
                    Degradation::LedgerUnavailable {
                        page: page.index,
                        reason: e.to_string(),
                    },
                ),
                PageError::CallFailed(e) if self.retry.should_retry(attempt, &e) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    debug!(page = page.index, attempt, ?delay, error = %e, "Retrying page");
                    if let Some(d) = deadline {
                        if Instant::now() + delay >= d {
                            return (deadline_exceeded(page), attempt);
                        }
                    }
                    tokio::time::sleep(delay).await;
                    continue;
                }
                err @ (PageError::CallFailed(_) | PageError::InvalidRequest(_)) => {
                    let reason = err.to_string();
                    PageOutcome::Skipped(
                        PageStatus::Failed {
                            reason: reason.clone(),
                        },
                        Degradation::PageFailed {
                            page: page.index,
                            reason,
                        },
                    )
                }
            };

            return (outcome, attempt);
        }
    }
}

fn deadline_exceeded(page: PageRequest) -> PageOutcome {
    PageOutcome::Stop(
        PageStatus::DeadlineExceeded,
        Degradation::DeadlineExceeded { page: page.index },
    )
}

fn enter(phases: &mut Vec<RunPhase>, phase: RunPhase) {
    debug!(%phase, "Run phase");
    phases.push(phase);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_pages_partial_last_page() {
        let plan = plan_pages(25);
        let starts: Vec<u32> = plan.iter().map(|p| p.start).collect();
        let counts: Vec<u32> = plan.iter().map(|p| p.count).collect();

        assert_eq!(starts, vec![1, 11, 21]);
        assert_eq!(counts, vec![10, 10, 5]);
        assert_eq!(plan[2].index, 2);
    }

    #[test]
    fn test_plan_pages_exact_multiple() {
        let plan = plan_pages(20);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].count, 10);
    }

    #[test]
    fn test_plan_pages_counts_sum_to_desired() {
        for desired in 1..=100 {
            let plan = plan_pages(desired);
            let total: u32 = plan.iter().map(|p| p.count).sum();
            assert_eq!(total, desired, "desired {desired}");
            assert_eq!(plan.len() as u32, desired.div_ceil(10), "desired {desired}");
            assert!(plan.iter().all(|p| (1..=10).contains(&p.count)));
            for (i, page) in plan.iter().enumerate() {
                assert_eq!(page.start, 1 + 10 * i as u32);
            }
        }
    }

    #[test]
    fn test_plan_pages_zero() {
        assert!(plan_pages(0).is_empty());
    }

    #[test]
    fn test_run_status_degradations() {
        assert!(RunStatus::Completed.degradations().is_empty());
        let partial = RunStatus::PartiallyCompleted(vec![Degradation::QuotaExhausted { page: 1 }]);
        assert!(!partial.is_complete());
        assert_eq!(partial.degradations()[0].to_string(), "quota exhausted at page 1");
    }
}
