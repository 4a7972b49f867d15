//! HTTP client with tracing and per-client timeout.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing
//! - A fixed timeout for every request
//! - Convenience methods for the calls the pipeline makes

use reqwest::{header, Client, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{FetchError, HttpError};

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest response body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// User agent string for LeadSearch.
const USER_AGENT: &str = concat!("LeadSearch/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and a fixed timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Setup(e.to_string()))?;

        Ok(Self {
            inner: client,
            timeout,
        })
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs a GET request with query parameters.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn get_with_query<Q: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &Q,
    ) -> Result<Response, HttpError> {
        debug!("GET request with query");

        let response = self.inner.get(url).query(query).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a POST request with JSON body.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Response, HttpError> {
        debug!("POST request with JSON");

        let response = self.inner.post(url).json(body).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a POST request with JSON body and a bearer token.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn post_json_with_bearer<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        token: &str,
    ) -> Result<Response, HttpError> {
        debug!("POST request with JSON and bearer token");

        let response = self
            .inner
            .post(url)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .json(body)
            .send()
            .await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Check if the response indicates rate limiting.
    fn is_rate_limited(&self) -> bool;

    /// Get the Retry-After header value in seconds.
    fn retry_after_secs(&self) -> Option<u64>;
}

impl ResponseExt for Response {
    fn is_rate_limited(&self) -> bool {
        self.status() == reqwest::StatusCode::TOO_MANY_REQUESTS
    }

    fn retry_after_secs(&self) -> Option<u64> {
        self.headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

/// Turns a non-success response into the matching `FetchError`.
pub(crate) async fn error_for_response(response: Response) -> FetchError {
    if response.is_rate_limited() {
        return FetchError::RateLimited {
            retry_after: response.retry_after_secs(),
        };
    }

    let status = response.status().as_u16();
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    FetchError::Status { status, body }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_keeps_timeout() {
        let client = HttpClient::with_timeout(Duration::from_secs(7)).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(7));
    }

    #[test]
    fn test_default_timeout() {
        let client = HttpClient::new().unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
