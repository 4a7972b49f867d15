//! Search provider backends and the quota-guarded page client.

use std::sync::Arc;

use async_trait::async_trait;
use leadsearch_core::{CoreError, FallbackEvent, FallbackReason, FallbackRecorder, SearchResult};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::error::FetchError;
use crate::http::{error_for_response, HttpClient};
use crate::quota::{QuotaDecision, QuotaGuard};

/// Largest page the provider returns.
pub const MAX_PAGE_SIZE: u32 = 10;

// ============================================================================
// Backend Trait
// ============================================================================

/// A metered web search provider.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Service name used as the usage ledger key.
    fn service(&self) -> &str;

    /// Issues one raw page call. `start` is the 1-based offset.
    async fn search_page(
        &self,
        query: &str,
        start: u32,
        count: u32,
    ) -> Result<Vec<SearchResult>, FetchError>;
}

// ============================================================================
// Google Custom Search
// ============================================================================

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

/// Google Custom Search JSON API backend.
#[derive(Debug, Clone)]
pub struct GoogleSearchBackend {
    http: HttpClient,
    endpoint: String,
    api_key: String,
    engine_id: String,
}

impl GoogleSearchBackend {
    /// Service name recorded in the usage ledger.
    pub const SERVICE: &'static str = "google";

    /// Creates a backend for the given endpoint and credentials.
    pub fn new(
        http: HttpClient,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
        }
    }

    fn into_results(items: Vec<CseItem>) -> Vec<SearchResult> {
        items
            .into_iter()
            .filter_map(|item| match SearchResult::new(item.link, item.title, item.snippet) {
                Ok(result) => Some(result),
                Err(e) => {
                    debug!(error = %e, "Dropping result with invalid link");
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl SearchBackend for GoogleSearchBackend {
    fn service(&self) -> &str {
        Self::SERVICE
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn search_page(
        &self,
        query: &str,
        start: u32,
        count: u32,
    ) -> Result<Vec<SearchResult>, FetchError> {
        let start = start.to_string();
        let count = count.to_string();
        let params = [
            ("key", self.api_key.as_str()),
            ("cx", self.engine_id.as_str()),
            ("q", query),
            ("start", start.as_str()),
            ("num", count.as_str()),
        ];

        let response = self.http.get_with_query(&self.endpoint, &params).await?;
        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        let body = response.text().await?;
        let parsed: CseResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::InvalidResponse(format!("search response: {e}")))?;

        let results = Self::into_results(parsed.items);
        debug!(results = results.len(), "Search page parsed");
        Ok(results)
    }
}

// ============================================================================
// Paginated Client
// ============================================================================

/// Why a single page call produced no results.
#[derive(Debug, Error)]
pub enum PageError {
    /// The quota guard refused the call.
    #[error("quota exhausted for {service} ({used}/{budget})")]
    QuotaExhausted {
        /// Service whose budget is spent.
        service: String,
        /// Calls recorded.
        used: u64,
        /// Effective budget.
        budget: u64,
    },

    /// The ledger could not be read or written; no call was issued.
    #[error("usage ledger unavailable: {0}")]
    LedgerUnavailable(CoreError),

    /// The provider call failed after quota was reserved.
    #[error("search call failed: {0}")]
    CallFailed(FetchError),

    /// The page parameters were out of range.
    #[error("invalid page request: {0}")]
    InvalidRequest(String),
}

/// Fetches single pages through the quota guard.
pub struct PaginatedSearchClient {
    backend: Arc<dyn SearchBackend>,
    guard: Arc<QuotaGuard>,
    recorder: Arc<dyn FallbackRecorder>,
}

impl PaginatedSearchClient {
    /// Creates a client over a backend and a shared guard.
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        guard: Arc<QuotaGuard>,
        recorder: Arc<dyn FallbackRecorder>,
    ) -> Self {
        Self {
            backend,
            guard,
            recorder,
        }
    }

    /// Returns the backend's service name.
    pub fn service(&self) -> &str {
        self.backend.service()
    }

    /// Returns the shared quota guard.
    pub fn guard(&self) -> &Arc<QuotaGuard> {
        &self.guard
    }

    /// Fetches one page. `start` is 1-based and `count` is in `1..=10`.
    ///
    /// Every issued call is counted in the ledger before it is made.
    #[instrument(skip(self), fields(service = %self.backend.service()))]
    pub async fn fetch_page(
        &self,
        query: &str,
        start: u32,
        count: u32,
    ) -> Result<Vec<SearchResult>, PageError> {
        if start == 0 {
            return Err(PageError::InvalidRequest("start offset is 1-based".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&count) {
            return Err(PageError::InvalidRequest(format!(
                "count must be between 1 and {MAX_PAGE_SIZE}, got {count}"
            )));
        }

        let service = self.backend.service().to_string();

        match self.guard.check_and_reserve(&service).await {
            Ok(QuotaDecision::Allowed { .. }) => {}
            Ok(QuotaDecision::Refused { used, budget }) => {
                return Err(PageError::QuotaExhausted {
                    service,
                    used,
                    budget,
                });
            }
            Err(e) => {
                warn!(error = %e, "Usage ledger unavailable, not issuing call");
                let event = FallbackEvent::new(FallbackReason::Other)
                    .with("service", &service)
                    .with("stage", "quota_check")
                    .with("error", &e);
                self.recorder.record(event).await;
                return Err(PageError::LedgerUnavailable(e));
            }
        }

        match self.backend.search_page(query, start, count).await {
            Ok(results) => Ok(results),
            Err(e) => {
                warn!(error = %e, start, count, "Search call failed");
                let event = FallbackEvent::new(FallbackReason::CallFailure)
                    .with("service", &service)
                    .with("start", start)
                    .with("count", count)
                    .with("error", &e);
                self.recorder.record(event).await;
                Err(PageError::CallFailed(e))
            }
        }
    }
}

impl std::fmt::Debug for PaginatedSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedSearchClient")
            .field("service", &self.backend.service())
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
