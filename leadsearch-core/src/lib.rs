// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `LeadSearch` Core
//!
//! Core types, models, and traits for the `LeadSearch` pipeline.
//!
//! This crate provides the foundational abstractions used across all other
//! `LeadSearch` crates, including:
//!
//! - Domain models (search results, usage records, fallback events)
//! - Error types
//! - Trait definitions for the persistent collaborators
//! - Per-operation status reporting
//!
//! ## Key Types
//!
//! ### Search Types
//! - [`SearchResult`] - A single validated result item
//! - [`ResultSet`] - Page-ordered aggregate of results
//! - [`QualityScore`] - Bounded relevance score (0-100)
//! - [`UrlRecord`] - Discovered URL with timestamp
//!
//! ### Usage & Audit
//! - [`UsageRecord`] - Calls made to a provider this period
//! - [`FallbackEvent`] - Audit record of a degraded operation
//!
//! ### Status
//! - [`OperationStatus`] - Success, degraded, or fatal outcome

pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Audit
    FallbackEvent,
    FallbackReason,
    // Status
    OperationStatus,
    // Search
    QualityScore,
    ResultSet,
    SearchResult,
    UrlRecord,
    validate_url,
    // Usage
    Reservation,
    UsageRecord,
};

// Re-export traits
pub use traits::{FallbackRecorder, UrlStore, UsageLedger};
