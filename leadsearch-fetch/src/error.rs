//! Fetch error types.

use leadsearch_core::CoreError;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for network-facing operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Non-success status from the remote service.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// Rate limited by the provider.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after: Option<u64>,
    },

    /// Request timed out.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid response from the remote service.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl FetchError {
    /// Returns true if a later attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_transient(),
            FetchError::Status { status, .. } => *status >= 500,
            FetchError::RateLimited { .. } | FetchError::Timeout(_) => true,
            FetchError::InvalidResponse(_) | FetchError::Json(_) | FetchError::Core(_) => false,
        }
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Timeout.
    #[error("Request timed out")]
    Timeout,

    /// Could not build the client.
    #[error("Client setup failed: {0}")]
    Setup(String),
}

impl HttpError {
    /// Returns true for connection failures and timeouts.
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::Request(e) => e.is_connect() || e.is_timeout(),
            HttpError::Timeout => true,
            HttpError::InvalidUrl(_) | HttpError::Setup(_) => false,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Request(err)
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err.into())
    }
}
