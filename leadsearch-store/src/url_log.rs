//! Append-only log of discovered URLs.
//!
//! The durable log is a CSV file with a `url,timestamp` header written on
//! first use. Each URL is appended as its own row so that one failed write
//! does not affect the others.

use async_trait::async_trait;
use leadsearch_core::{CoreError, UrlRecord, UrlStore};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::append_bytes;

/// Header row of the URL log.
pub const URL_LOG_HEADER: [&str; 2] = ["url", "timestamp"];

// ============================================================================
// CSV URL Log
// ============================================================================

/// CSV-backed URL log.
#[derive(Debug)]
pub struct CsvUrlLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvUrlLog {
    /// Opens the log at `path`, writing the header if the file is new.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let log = Self {
            path: path.into(),
            lock: Mutex::new(()),
        };
        log.ensure_header().await?;
        Ok(log)
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_header(&self) -> Result<(), StoreError> {
        let needs_header = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        if needs_header {
            append_bytes(&self.path, &encode_row(&URL_LOG_HEADER)?).await?;
            info!(path = %self.path.display(), "Initialized URL log");
        }
        Ok(())
    }

    /// Appends one record, re-creating the header if the file vanished.
    pub async fn try_append(&self, record: &UrlRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.ensure_header().await?;

        let timestamp = record.discovered_at.to_rfc3339();
        let row = encode_row(&[record.url.as_str(), timestamp.as_str()])?;
        append_bytes(&self.path, &row).await?;

        debug!(url = %record.url, "URL appended");
        Ok(())
    }
}

/// Encodes a single CSV row, including the trailing newline.
fn encode_row(fields: &[&str]) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|e| StoreError::Io(e.into_error()))
}

#[async_trait]
impl UrlStore for CsvUrlLog {
    async fn append(&self, record: &UrlRecord) -> Result<(), CoreError> {
        self.try_append(record).await.map_err(CoreError::from)
    }
}

// ============================================================================
// In-Memory URL Log
// ============================================================================

/// In-memory URL log for tests.
#[derive(Debug, Default)]
pub struct MemoryUrlLog {
    records: Mutex<Vec<UrlRecord>>,
    reject: Mutex<Vec<String>>,
    unavailable: AtomicBool,
}

impl MemoryUrlLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes appends of this exact URL fail.
    pub async fn reject_url(&self, url: impl Into<String>) {
        self.reject.lock().await.push(url.into());
    }

    /// Makes every append fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns everything appended so far.
    pub async fn records(&self) -> Vec<UrlRecord> {
        self.records.lock().await.clone()
    }

    /// Returns the appended URLs in order.
    pub async fn urls(&self) -> Vec<String> {
        self.records
            .lock()
            .await
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }
}

#[async_trait]
impl UrlStore for MemoryUrlLog {
    async fn append(&self, record: &UrlRecord) -> Result<(), CoreError> {
        if self.unavailable.load(Ordering::SeqCst) || self.reject.lock().await.contains(&record.url)
        {
            return Err(StoreError::Unavailable(format!("cannot append {}", record.url)).into());
        }
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
