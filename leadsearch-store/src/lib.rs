// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # LeadSearch Store
//!
//! Persistent state and configuration for the LeadSearch pipeline.
//!
//! This crate provides:
//!
//! - **Usage ledger**: per-service call counters (`api_usage.json`)
//! - **URL log**: append-only CSV of discovered URLs (`urls.csv`)
//! - **Fallback events**: append-only JSON Lines audit trail
//! - **Config**: defaults, config file, and environment overrides
//! - **Persistence**: atomic JSON replacement and append helpers
//!
//! Every store has an in-memory counterpart for tests.
//!
//! ## Usage
//!
//! ```ignore
//! use leadsearch_store::{Config, JsonUsageLedger};
//! use leadsearch_core::UsageLedger;
//!
//! let config = Config::from_environment()?;
//! config.validate()?;
//!
//! let ledger = JsonUsageLedger::open(config.usage_path(), "google").await?;
//! let calls = ledger.increment("google").await?;
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod persistence;
pub mod url_log;

pub use config::{Config, DEFAULT_PROVIDER};
pub use error::StoreError;
pub use events::{JsonlFallbackRecorder, MemoryFallbackRecorder, TracingFallbackRecorder};
pub use ledger::{JsonUsageLedger, MemoryUsageLedger};
pub use persistence::{
    append_bytes, default_config_dir, default_config_path, default_data_dir, ensure_dir,
    write_json_atomic,
};
pub use url_log::{CsvUrlLog, MemoryUrlLog, URL_LOG_HEADER};
#[cfg(test)]
mod persistence_tests;
