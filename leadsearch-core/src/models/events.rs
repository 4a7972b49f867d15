//! Fallback audit events.
//!
//! Events document degraded or refused operations. They are written once
//! and never read back by the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Why a fallback event was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The quota guard refused a call.
    QuotaNearExhaustion,
    /// A provider call failed (non-2xx, timeout, malformed payload).
    CallFailure,
    /// Anything else, e.g. an unreachable usage ledger.
    Other,
}

impl FallbackReason {
    /// Returns the wire name of this reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuotaNearExhaustion => "quota_near_exhaustion",
            Self::CallFailure => "call_failure",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable audit record of degraded operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackEvent {
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// Why it happened.
    pub reason: FallbackReason,
    /// Free-form context (service, query, offsets, error text).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl FallbackEvent {
    /// Creates an event stamped with the current time and empty context.
    pub fn new(reason: FallbackReason) -> Self {
        Self {
            timestamp: Utc::now(),
            reason,
            context: BTreeMap::new(),
        }
    }

    /// Adds a context entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }
}
