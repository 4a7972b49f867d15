//! Usage accounting types.

use serde::{Deserialize, Serialize};

/// Number of calls made to one provider during the current quota period.
///
/// Only the usage ledger mutates this, and only upwards; resets happen
/// outside the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Tracked provider name (e.g. `google`).
    pub service_name: String,
    /// Calls made this period.
    pub calls_this_period: u64,
}

impl UsageRecord {
    /// Creates a record with zero calls.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            calls_this_period: 0,
        }
    }
}

/// Outcome of an atomic check-and-increment against a usage ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// The counter was below the budget and has been incremented.
    Reserved {
        /// Count after the increment.
        count: u64,
    },
    /// The counter had already reached the budget; nothing was written.
    Exhausted {
        /// Count at the time of the check.
        used: u64,
    },
}
