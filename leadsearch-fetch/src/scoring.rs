//! Relevance scoring with a zero-shot text classifier.
//!
//! The combined snippet text is classified against two labels: the query
//! itself and a catch-all negative label. The score is the probability
//! assigned to the query label, scaled to `0..=100`.

use std::sync::Arc;

use async_trait::async_trait;
use leadsearch_core::{OperationStatus, QualityScore};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::FetchError;
use crate::http::{error_for_response, HttpClient};

/// Negative label paired with the query.
pub const UNRELATED_LABEL: &str = "unrelated";

/// Default cap on characters sent to the classifier.
pub const DEFAULT_MAX_CHARS: usize = 4000;

// ============================================================================
// Classifier Trait
// ============================================================================

/// Probability assigned to one candidate label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    /// Candidate label.
    pub label: String,
    /// Probability in `0..=1`.
    pub score: f64,
}

/// Zero-shot classifier over candidate labels.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Classifies `text` against `labels`.
    async fn classify(&self, text: &str, labels: &[String]) -> Result<Vec<LabelScore>, FetchError>;
}

// ============================================================================
// Hosted Inference Classifier
// ============================================================================

#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotReply {
    Single(ZeroShotResponse),
    Batch(Vec<ZeroShotResponse>),
}

/// Zero-shot classification over a hosted inference endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClassifier {
    http: HttpClient,
    endpoint: String,
    token: Option<String>,
}

impl InferenceClassifier {
    /// Creates a classifier for the given endpoint.
    pub fn new(http: HttpClient, endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            token,
        }
    }

    fn parse(body: &str) -> Result<Vec<LabelScore>, FetchError> {
        let reply: ZeroShotReply = serde_json::from_str(body)
            .map_err(|e| FetchError::InvalidResponse(format!("classifier response: {e}")))?;

        let response = match reply {
            ZeroShotReply::Single(r) => r,
            ZeroShotReply::Batch(batch) => batch.into_iter().next().ok_or_else(|| {
                FetchError::InvalidResponse("classifier returned an empty batch".to_string())
            })?,
        };

        if response.labels.len() != response.scores.len() {
            return Err(FetchError::InvalidResponse(format!(
                "classifier returned {} labels and {} scores",
                response.labels.len(),
                response.scores.len()
            )));
        }

        Ok(response
            .labels
            .into_iter()
            .zip(response.scores)
            .map(|(label, score)| LabelScore { label, score })
            .collect())
    }
}

#[async_trait]
impl TextClassifier for InferenceClassifier {
    #[instrument(skip(self, text), fields(endpoint = %self.endpoint, chars = text.len()))]
    async fn classify(&self, text: &str, labels: &[String]) -> Result<Vec<LabelScore>, FetchError> {
        let request = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters {
                candidate_labels: labels,
            },
        };

        let response = match &self.token {
            Some(token) => {
                self.http
                    .post_json_with_bearer(&self.endpoint, &request, token)
                    .await?
            }
            None => self.http.post_json(&self.endpoint, &request).await?,
        };

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        let body = response.text().await?;
        Self::parse(&body)
    }
}

// ============================================================================
// Relevance Scorer
// ============================================================================

/// A score plus whether it was actually computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreOutcome {
    /// The relevance score.
    pub score: QualityScore,
    /// `Degraded` when the score is a fallback value.
    pub status: OperationStatus,
}

impl ScoreOutcome {
    fn computed(score: QualityScore) -> Self {
        Self {
            score,
            status: OperationStatus::Success,
        }
    }

    fn fallback(reason: impl Into<String>) -> Self {
        Self {
            score: QualityScore::EMPTY,
            status: OperationStatus::Degraded(reason.into()),
        }
    }
}

/// Scores combined snippet text against the query.
pub struct RelevanceScorer {
    classifier: Arc<dyn TextClassifier>,
    max_chars: usize,
}

impl RelevanceScorer {
    /// Creates a scorer with the default text cap.
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self {
            classifier,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    /// Sets the maximum number of characters sent to the classifier.
    #[must_use]
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.max(1);
        self
    }

    /// Scores `text` for relevance to `query`.
    ///
    /// Empty text scores zero without calling the classifier. Classifier
    /// failures score zero with a degraded status.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn score(&self, text: &str, query: &str) -> ScoreOutcome {
        if text.trim().is_empty() {
            debug!("No text to score");
            return ScoreOutcome::computed(QualityScore::EMPTY);
        }

        let query = query.trim();
        if query.is_empty() {
            return ScoreOutcome::fallback("scoring skipped: empty query");
        }

        let input = truncate_chars(text, self.max_chars);
        let labels = vec![query.to_string(), UNRELATED_LABEL.to_string()];

        match self.classifier.classify(input, &labels).await {
            Ok(scores) => match scores.iter().find(|s| s.label == query) {
                Some(hit) => {
                    let score = QualityScore::from_probability(hit.score);
                    debug!(score = %score, "Relevance scored");
                    ScoreOutcome::computed(score)
                }
                None => {
                    warn!("Classifier returned no score for the query label");
                    ScoreOutcome::fallback("scoring failed: query label missing from response")
                }
            },
            Err(e) => {
                warn!(error = %e, "Relevance scoring failed");
                ScoreOutcome::fallback(format!("scoring failed: {e}"))
            }
        }
    }
}

impl std::fmt::Debug for RelevanceScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelevanceScorer")
            .field("max_chars", &self.max_chars)
            .finish_non_exhaustive()
    }
}

/// Returns at most `max_chars` characters of `text`.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ============================================================================
// Tests
// ============================================================================
