//! Search-related types.
//!
//! This module contains the types produced and consumed by a query run:
//! - [`SearchResult`] - One provider result item
//! - [`ResultSet`] - Results of all pages, in page order
//! - [`QualityScore`] - Relevance of a result set to its query
//! - [`UrlRecord`] - A discovered URL as written to the URL log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;

// ============================================================================
// Search Result
// ============================================================================

/// A single search result as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Absolute URL of the result. Never empty.
    pub url: String,
    /// Result title.
    pub title: String,
    /// Result snippet (provider-generated summary).
    pub snippet: String,
}

impl SearchResult {
    /// Creates a result, validating that `url` is a non-empty absolute URL.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if the URL is empty or cannot be parsed.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let url = url.into();
        validate_url(&url)?;
        Ok(Self {
            url,
            title: title.into(),
            snippet: snippet.into(),
        })
    }
}

/// Checks that a URL is non-empty and syntactically valid.
///
/// # Errors
///
/// Returns `CoreError::InvalidData` describing the problem.
pub fn validate_url(url: &str) -> Result<(), CoreError> {
    if url.trim().is_empty() {
        return Err(CoreError::InvalidData("empty result URL".to_string()));
    }
    Url::parse(url).map_err(|e| CoreError::InvalidData(format!("invalid URL {url:?}: {e}")))?;
    Ok(())
}

// ============================================================================
// Result Set
// ============================================================================

/// Ordered results of a query run.
///
/// Page 0's results come before page 1's, and so on; within a page the
/// provider's rank order is kept. Duplicate URLs across pages are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    results: Vec<SearchResult>,
}

impl ResultSet {
    /// Creates an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one page's results, preserving their order.
    pub fn extend_page(&mut self, page: impl IntoIterator<Item = SearchResult>) {
        self.results.extend(page);
    }

    /// Returns the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterates over results in order.
    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.results.iter()
    }

    /// Returns the results as a slice.
    pub fn as_slice(&self) -> &[SearchResult] {
        &self.results
    }

    /// Returns every URL in result order, duplicates included.
    pub fn urls(&self) -> Vec<String> {
        self.results.iter().map(|r| r.url.clone()).collect()
    }

    /// Joins all snippets with a single space, in result order.
    pub fn combined_snippets(&self) -> String {
        self.results
            .iter()
            .map(|r| r.snippet.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Consumes the set, returning the underlying results.
    pub fn into_inner(self) -> Vec<SearchResult> {
        self.results
    }
}

impl From<Vec<SearchResult>> for ResultSet {
    fn from(results: Vec<SearchResult>) -> Self {
        Self { results }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a SearchResult;
    type IntoIter = std::slice::Iter<'a, SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

// ============================================================================
// Quality Score
// ============================================================================

/// Aggregate relevance of a result set to its query, in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityScore(f64);

impl QualityScore {
    /// Score reported for empty input and for failed scoring.
    pub const EMPTY: QualityScore = QualityScore(0.0);

    /// Upper bound of the scale.
    pub const MAX: f64 = 100.0;

    /// Creates a score, clamping into `[0, 100]`. Non-finite values become 0.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, Self::MAX))
        } else {
            Self::EMPTY
        }
    }

    /// Creates a score from a probability in `[0, 1]`.
    pub fn from_probability(p: f64) -> Self {
        Self::new(p * Self::MAX)
    }

    /// Returns the numeric value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Returns true if the score reaches the given threshold.
    pub fn meets(self, threshold: f64) -> bool {
        self.0 >= threshold
    }
}

impl Default for QualityScore {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl std::fmt::Display for QualityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

// ============================================================================
// URL Record
// ============================================================================

/// A discovered URL as appended to durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The discovered URL.
    pub url: String,
    /// When the URL was recorded.
    pub discovered_at: DateTime<Utc>,
}

impl UrlRecord {
    /// Creates a record stamped with the current time.
    pub fn now(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            discovered_at: Utc::now(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
