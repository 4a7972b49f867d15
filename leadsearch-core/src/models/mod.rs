//! Domain models for `LeadSearch`.
//!
//! ## Submodules
//!
//! - [`search`] - Search types (SearchResult, ResultSet, QualityScore, UrlRecord)
//! - [`usage`] - Usage accounting (UsageRecord, Reservation)
//! - [`events`] - Fallback audit events
//! - [`status`] - Per-operation outcome reporting

mod events;
mod search;
mod status;
mod usage;

pub use events::{FallbackEvent, FallbackReason};
pub use search::{validate_url, QualityScore, ResultSet, SearchResult, UrlRecord};
pub use status::OperationStatus;
pub use usage::{Reservation, UsageRecord};
