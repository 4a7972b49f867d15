//! Result sink: durable URL log plus downstream forwarding.
//!
//! Both halves are best-effort. Failures are logged and reported in the
//! returned status values, never raised.

use std::sync::Arc;

use leadsearch_core::{OperationStatus, UrlRecord, UrlStore};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::ingest::{IngestAck, IngestClient};

// ============================================================================
// Reports
// ============================================================================

/// A single URL that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistFailure {
    /// The URL.
    pub url: String,
    /// Why the write failed.
    pub error: String,
}

/// Outcome of writing a batch of URLs to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    /// URLs written.
    pub written: usize,
    /// URLs that failed, in input order.
    pub failures: Vec<PersistFailure>,
}

impl PersistReport {
    /// Overall status of the batch.
    pub fn status(&self) -> OperationStatus {
        if self.failures.is_empty() {
            OperationStatus::Success
        } else {
            OperationStatus::Degraded(format!(
                "{} of {} URLs not persisted",
                self.failures.len(),
                self.written + self.failures.len()
            ))
        }
    }
}

/// Outcome of forwarding a batch to the ingestion service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForwardStatus {
    /// The service accepted the batch.
    Acknowledged {
        /// The acknowledgement.
        ack: IngestAck,
    },
    /// The service could not be reached or rejected the batch.
    Failed {
        /// Error description.
        reason: String,
    },
}

impl ForwardStatus {
    /// Maps to the shared status type.
    pub fn status(&self) -> OperationStatus {
        match self {
            ForwardStatus::Acknowledged { .. } => OperationStatus::Success,
            ForwardStatus::Failed { reason } => OperationStatus::Degraded(reason.clone()),
        }
    }
}

/// Combined persist and forward outcome for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinkReport {
    /// URL log outcome.
    pub persist: PersistReport,
    /// Ingestion outcome.
    pub forward: ForwardStatus,
}

// ============================================================================
// Sink
// ============================================================================

/// Writes URLs to the log and forwards them downstream.
pub struct ResultSink {
    store: Arc<dyn UrlStore>,
    ingest: Arc<dyn IngestClient>,
}

impl ResultSink {
    /// Creates a sink.
    pub fn new(store: Arc<dyn UrlStore>, ingest: Arc<dyn IngestClient>) -> Self {
        Self { store, ingest }
    }

    /// Appends every URL with the current timestamp, in order.
    ///
    /// A failing URL does not stop the rest of the batch.
    #[instrument(skip(self, urls), fields(urls = urls.len()))]
    pub async fn persist(&self, urls: &[String]) -> PersistReport {
        let mut report = PersistReport::default();

        for url in urls {
            let record = UrlRecord::now(url.clone());
            match self.store.append(&record).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to persist URL");
                    report.failures.push(PersistFailure {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(written = report.written, failed = report.failures.len(), "URLs persisted");
        report
    }

    /// Submits the batch to the ingestion service.
    #[instrument(skip(self, urls), fields(urls = urls.len()))]
    pub async fn forward(&self, urls: &[String]) -> ForwardStatus {
        match self.ingest.submit(urls).await {
            Ok(ack) => {
                info!(status = ack.status, "URLs forwarded");
                ForwardStatus::Acknowledged { ack }
            }
            Err(e) => {
                warn!(error = %e, "Failed to forward URLs");
                ForwardStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Persists and then forwards the batch.
    pub async fn deliver(&self, urls: &[String]) -> SinkReport {
        let persist = self.persist(urls).await;
        let forward = self.forward(urls).await;
        SinkReport { persist, forward }
    }
}

impl std::fmt::Debug for ResultSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSink").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
