//! Fallback event recorders.
//!
//! Recording is best-effort: a failed write is logged and swallowed.

use async_trait::async_trait;
use leadsearch_core::{FallbackEvent, FallbackRecorder};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::StoreError;
use crate::persistence::append_bytes;

// ============================================================================
// JSON Lines Recorder
// ============================================================================

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonlFallbackRecorder {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlFallbackRecorder {
    /// Creates a recorder writing to `path`. The file is created lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the event file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends the event, returning any write error.
    pub async fn try_record(&self, event: &FallbackEvent) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        append_bytes(&self.path, &line).await
    }
}

#[async_trait]
impl FallbackRecorder for JsonlFallbackRecorder {
    async fn record(&self, event: FallbackEvent) {
        warn!(reason = %event.reason, context = ?event.context, "Fallback event");
        if let Err(e) = self.try_record(&event).await {
            warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to persist fallback event"
            );
        }
    }
}

// ============================================================================
// Tracing-only Recorder
// ============================================================================

/// Logs events without persisting them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFallbackRecorder;

#[async_trait]
impl FallbackRecorder for TracingFallbackRecorder {
    async fn record(&self, event: FallbackEvent) {
        warn!(reason = %event.reason, context = ?event.context, "Fallback event");
    }
}

// ============================================================================
// In-Memory Recorder
// ============================================================================

/// Keeps events in memory for inspection in tests.
#[derive(Debug, Default)]
pub struct MemoryFallbackRecorder {
    events: Mutex<Vec<FallbackEvent>>,
}

impl MemoryFallbackRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events.
    pub async fn events(&self) -> Vec<FallbackEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl FallbackRecorder for MemoryFallbackRecorder {
    async fn record(&self, event: FallbackEvent) {
        self.events.lock().await.push(event);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use leadsearch_core::FallbackReason;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_jsonl_appends_one_line_per_event() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fallback_events.jsonl");
        let recorder = JsonlFallbackRecorder::new(&path);

        recorder
            .record(FallbackEvent::new(FallbackReason::QuotaNearExhaustion).with("service", "google"))
            .await;
        recorder
            .record(FallbackEvent::new(FallbackReason::CallFailure).with("start", 11))
            .await;

        let content = std::fs::read_to_string(&path).unwrap();
        let events: Vec<FallbackEvent> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].reason, FallbackReason::QuotaNearExhaustion);
        assert_eq!(events[1].context.get("start").map(String::as_str), Some("11"));
    }

    #[tokio::test]
    async fn test_jsonl_write_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes every append fail.
        let path = dir.path().join("events");
        std::fs::create_dir(&path).unwrap();
        let recorder = JsonlFallbackRecorder::new(&path);

        let event = FallbackEvent::new(FallbackReason::Other);
        assert!(recorder.try_record(&event).await.is_err());
        // Must not panic or propagate.
        recorder.record(event).await;
    }
}
