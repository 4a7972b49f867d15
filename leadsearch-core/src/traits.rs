//! Trait definitions for `LeadSearch`.
//!
//! These traits describe the shared, persistent collaborators of the
//! pipeline. Components receive them as `Arc<dyn Trait>` so that file-backed
//! stores can be swapped for in-memory fakes.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::{FallbackEvent, Reservation, UrlRecord};

/// Durable per-service call counter for the current quota period.
///
/// Implementations must persist the new count before `increment` returns
/// and must serialize updates to the same service, including updates made
/// by other processes sharing the same backing store.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Increments the counter for `service` and returns the new count.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StorageUnavailable` if the backing store cannot
    /// be reached. Not retried internally.
    async fn increment(&self, service: &str) -> Result<u64, CoreError>;

    /// Returns the current count for `service` (zero if never used).
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StorageUnavailable` if the backing store cannot
    /// be reached.
    async fn current_count(&self, service: &str) -> Result<u64, CoreError>;

    /// Increments the counter for `service` only if it is below `budget`.
    ///
    /// The read, compare and increment form one atomic step with respect to
    /// every other writer of the same store. An exhausted budget leaves the
    /// counter untouched.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StorageUnavailable` if the backing store cannot
    /// be reached.
    async fn reserve_below(&self, service: &str, budget: u64) -> Result<Reservation, CoreError>;
}

/// Write-only audit trail of fallback events.
///
/// Recording is best-effort: implementations log and swallow their own
/// failures, so this never aborts the caller.
#[async_trait]
pub trait FallbackRecorder: Send + Sync {
    /// Records one event.
    async fn record(&self, event: FallbackEvent);
}

/// Append-only store of discovered URLs.
#[async_trait]
pub trait UrlStore: Send + Sync {
    /// Appends a single record.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StorageUnavailable` if the write fails. Callers
    /// treat each record independently.
    async fn append(&self, record: &UrlRecord) -> Result<(), CoreError>;
}
