//! Downstream ingestion service client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::FetchError;
use crate::http::{error_for_response, HttpClient};

/// Acknowledgement returned by the ingestion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestAck {
    /// HTTP status of the acknowledgement.
    pub status: u16,
    /// Response body, if it was JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// Accepts batches of URLs for downstream processing.
#[async_trait]
pub trait IngestClient: Send + Sync {
    /// Submits the URLs in order.
    async fn submit(&self, urls: &[String]) -> Result<IngestAck, FetchError>;
}

#[derive(Serialize)]
struct IngestRequest<'a> {
    urls: &'a [String],
}

/// Posts `{"urls": [...]}` to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpIngestClient {
    http: HttpClient,
    endpoint: String,
}

impl HttpIngestClient {
    /// Creates a client for the given endpoint.
    pub fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// Returns the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl IngestClient for HttpIngestClient {
    #[instrument(skip(self, urls), fields(endpoint = %self.endpoint, urls = urls.len()))]
    async fn submit(&self, urls: &[String]) -> Result<IngestAck, FetchError> {
        let response = self
            .http
            .post_json(&self.endpoint, &IngestRequest { urls })
            .await?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).ok();
        debug!(status, "Ingestion acknowledged");

        Ok(IngestAck { status, body })
    }
}
