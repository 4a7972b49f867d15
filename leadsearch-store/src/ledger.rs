//! Usage ledger implementations.
//!
//! The durable ledger keeps one JSON document per data directory:
//!
//! ```json
//! { "service": "usage", "google": 42 }
//! ```
//!
//! Every mutation is a read-modify-write performed while holding an
//! exclusive advisory lock on a sibling `<file>.lock`, so separate
//! processes sharing the document never lose increments. The new document
//! is written to disk before the new count is returned.

use async_trait::async_trait;
use fd_lock::RwLock;
use leadsearch_core::{CoreError, Reservation, UsageLedger, UsageRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::persistence::{create_parent_dir, write_json_atomic};

/// Value of the `service` marker field in the usage document.
const USAGE_MARKER: &str = "usage";

// ============================================================================
// Usage Document
// ============================================================================

/// On-disk shape of the usage counter store.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UsageDocument {
    service: String,
    #[serde(flatten)]
    counts: BTreeMap<String, u64>,
}

impl Default for UsageDocument {
    fn default() -> Self {
        Self {
            service: USAGE_MARKER.to_string(),
            counts: BTreeMap::new(),
        }
    }
}

impl UsageDocument {
    fn parse(content: &str, path: &Path) -> Result<Self, StoreError> {
        let doc: UsageDocument = serde_json::from_str(content)?;
        if doc.service != USAGE_MARKER {
            return Err(StoreError::Parse(format!(
                "unexpected service marker {:?} in {}",
                doc.service,
                path.display()
            )));
        }
        Ok(doc)
    }

    /// Blocking read; a missing file is an empty document.
    fn read(path: &Path) -> Result<Self, StoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn count(&self, service: &str) -> u64 {
        self.counts.get(service).copied().unwrap_or(0)
    }
}

/// Returns `<path>.lock`, the advisory lock file guarding `path`.
fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("api_usage"), OsString::from);
    name.push(".lock");
    path.with_file_name(name)
}

// ============================================================================
// JSON Usage Ledger
// ============================================================================

/// File-backed usage ledger, safe to share between processes.
#[derive(Debug)]
pub struct JsonUsageLedger {
    path: PathBuf,
    lock_path: PathBuf,
    local: Mutex<()>,
}

impl JsonUsageLedger {
    /// Opens the ledger at `path`, creating the document with `service` at
    /// zero if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>, service: &str) -> Result<Self, StoreError> {
        let path = path.into();
        create_parent_dir(&path).await?;

        let ledger = Self {
            lock_path: lock_path_for(&path),
            path,
            local: Mutex::new(()),
        };

        let key = service.to_string();
        let created = ledger
            .transact(move |doc| {
                if doc.counts.contains_key(&key) {
                    (false, false)
                } else {
                    doc.counts.insert(key, 0);
                    (true, true)
                }
            })
            .await?;
        if created {
            info!(path = %ledger.path.display(), service, "Initialized usage ledger");
        }

        Ok(ledger)
    }

    /// Returns the ledger file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a snapshot record for `service`.
    pub async fn record(&self, service: &str) -> Result<UsageRecord, StoreError> {
        let doc = self.load().await?;
        Ok(UsageRecord {
            service_name: service.to_string(),
            calls_this_period: doc.count(service),
        })
    }

    /// Reads the current document. Writers replace the file by rename, so
    /// a reader always sees a complete document without taking the lock.
    async fn load(&self) -> Result<UsageDocument, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => UsageDocument::parse(&content, &self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(UsageDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Runs `mutate` on the document while holding the cross-process lock.
    ///
    /// `mutate` returns its result and whether the document changed; a
    /// changed document is persisted before the lock is released.
    async fn transact<R, F>(&self, mutate: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut UsageDocument) -> (R, bool) + Send + 'static,
        R: Send + 'static,
    {
        // Keeps this process from parking several blocking threads on the
        // same file lock.
        let _local = self.local.lock().await;

        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        tokio::task::spawn_blocking(move || -> Result<R, StoreError> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(&lock_path)?;
            let mut lock = RwLock::new(file);
            let _held = lock.write()?;

            let mut doc = UsageDocument::read(&path)?;
            let (value, changed) = mutate(&mut doc);
            if changed {
                write_json_atomic(&path, &doc)?;
            }
            Ok(value)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("ledger task failed: {e}")))?
    }
}

#[async_trait]
impl UsageLedger for JsonUsageLedger {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn increment(&self, service: &str) -> Result<u64, CoreError> {
        let key = service.to_string();
        let new_count = self
            .transact(move |doc| {
                let count = doc.counts.entry(key).or_insert(0);
                *count += 1;
                (*count, true)
            })
            .await?;

        debug!(service, calls = new_count, "Usage incremented");
        Ok(new_count)
    }

    async fn current_count(&self, service: &str) -> Result<u64, CoreError> {
        Ok(self.load().await?.count(service))
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn reserve_below(&self, service: &str, budget: u64) -> Result<Reservation, CoreError> {
        let key = service.to_string();
        let reservation = self
            .transact(move |doc| {
                let count = doc.counts.entry(key).or_insert(0);
                if *count >= budget {
                    (Reservation::Exhausted { used: *count }, false)
                } else {
                    *count += 1;
                    (Reservation::Reserved { count: *count }, true)
                }
            })
            .await?;

        debug!(service, ?reservation, "Reservation attempted");
        Ok(reservation)
    }
}

// ============================================================================
// In-Memory Usage Ledger
// ============================================================================

/// In-memory usage ledger for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryUsageLedger {
    counts: Mutex<HashMap<String, u64>>,
    unavailable: AtomicBool,
}

impl MemoryUsageLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger with a preset count for one service.
    pub fn with_count(service: &str, count: u64) -> Self {
        let mut counts = HashMap::new();
        counts.insert(service.to_string(), count);
        Self {
            counts: Mutex::new(counts),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent operation fail with `StorageUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), CoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory ledger offline".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl UsageLedger for MemoryUsageLedger {
    async fn increment(&self, service: &str) -> Result<u64, CoreError> {
        self.check_available()?;
        let mut counts = self.counts.lock().await;
        let count = counts.entry(service.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn current_count(&self, service: &str) -> Result<u64, CoreError> {
        self.check_available()?;
        Ok(self.counts.lock().await.get(service).copied().unwrap_or(0))
    }

    async fn reserve_below(&self, service: &str, budget: u64) -> Result<Reservation, CoreError> {
        self.check_available()?;
        let mut counts = self.counts.lock().await;
        let count = counts.entry(service.to_string()).or_insert(0);
        if *count >= budget {
            return Ok(Reservation::Exhausted { used: *count });
        }
        *count += 1;
        Ok(Reservation::Reserved { count: *count })
    }
}

// ============================================================================
// Tests
// ============================================================================
