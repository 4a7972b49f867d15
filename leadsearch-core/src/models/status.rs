//! Per-operation outcome reporting.

use serde::{Deserialize, Serialize};

/// How an operation ended.
///
/// Best-effort steps report `Degraded` instead of silently swallowing the
/// failure, so callers and tests can see the degraded path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum OperationStatus {
    /// Completed as intended.
    #[default]
    Success,
    /// Completed with reduced output.
    Degraded(String),
    /// Produced nothing usable.
    Fatal(String),
}

impl OperationStatus {
    /// Returns true for `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true for `Degraded`.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    /// Returns true for `Fatal`.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Returns the reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Degraded(r) | Self::Fatal(r) => Some(r),
        }
    }
}
