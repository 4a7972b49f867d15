// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # LeadSearch Fetch
//!
//! Network-facing half of the LeadSearch pipeline.
//!
//! This crate provides:
//!
//! - **Quota guard**: serialized check-and-reserve against the usage ledger
//! - **Search backends**: the Google Custom Search client behind a trait
//! - **Paginated client**: one quota-guarded provider call per page
//! - **Result sink**: URL log writes and downstream forwarding
//! - **Relevance scoring**: zero-shot classification of combined snippets
//! - **Orchestrator**: the full query run from pagination to score
//!
//! ## Architecture
//!
//! ```text
//! query ──► SearchOrchestrator
//!              │
//!              ├─► PaginatedSearchClient ──► QuotaGuard ──► UsageLedger
//!              │          └─► SearchBackend (HTTP)
//!              ├─► ResultSink ──► UrlStore, IngestClient (HTTP)
//!              └─► RelevanceScorer ──► TextClassifier (HTTP)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use leadsearch_fetch::{plan_pages, SearchOrchestrator};
//!
//! let run = orchestrator.run("rust async runtimes", 25, None).await;
//! println!("{} results, score {}", run.results.len(), run.score.score);
//! ```

pub mod error;
pub mod http;
pub mod ingest;
pub mod pipeline;
pub mod quota;
pub mod retry;
pub mod scoring;
pub mod search;
pub mod sink;

pub use error::{FetchError, HttpError};
pub use http::{HttpClient, ResponseExt};
pub use ingest::{HttpIngestClient, IngestAck, IngestClient};
pub use pipeline::{
    plan_pages, Degradation, PageAttempt, PageRequest, PageStatus, RunPhase, RunStatus,
    SearchOrchestrator, SearchRun,
};
pub use quota::{QuotaConfig, QuotaDecision, QuotaGuard, QuotaStatus};
pub use retry::RetryStrategy;
pub use scoring::{
    InferenceClassifier, LabelScore, RelevanceScorer, ScoreOutcome, TextClassifier,
    DEFAULT_MAX_CHARS, UNRELATED_LABEL,
};
pub use search::{GoogleSearchBackend, PageError, PaginatedSearchClient, SearchBackend, MAX_PAGE_SIZE};
pub use sink::{ForwardStatus, PersistFailure, PersistReport, ResultSink, SinkReport};
