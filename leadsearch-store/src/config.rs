//! Configuration management.
//!
//! Values are resolved in three layers: built-in defaults, the optional JSON
//! config file, then environment variables (after loading `.env`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::StoreError;
use crate::persistence::{default_config_path, default_data_dir};

/// Provider name used in the usage ledger.
pub const DEFAULT_PROVIDER: &str = "google";

const DEFAULT_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
const DEFAULT_INGEST_URL: &str = "http://localhost:5001/scrape";
const DEFAULT_CLASSIFIER_URL: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-mnli";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search provider API key (`GOOGLE_API_KEY`). Required.
    pub api_key: Option<String>,
    /// Programmable search engine id (`GOOGLE_CX`). Required.
    pub search_engine_id: Option<String>,
    /// Search provider endpoint.
    pub search_url: String,
    /// Downstream ingestion endpoint.
    pub ingest_url: String,
    /// Directory holding the usage ledger, URL log and fallback events.
    pub data_dir: PathBuf,
    /// Nominal monthly call quota.
    pub monthly_limit: u64,
    /// Divides the monthly limit to leave headroom.
    pub safety_factor: f64,
    /// Minimum quality score considered relevant.
    pub quality_threshold: f64,
    /// Text classification endpoint.
    pub classifier_url: String,
    /// Bearer token for the classification endpoint.
    pub classifier_token: Option<String>,
    /// Longest combined text sent to the classifier, in characters.
    pub classifier_max_chars: usize,
    /// Timeout for one search provider call.
    pub provider_timeout_secs: u64,
    /// Timeout for the ingestion request.
    pub ingest_timeout_secs: u64,
    /// Timeout for the classification request.
    pub scorer_timeout_secs: u64,
    /// Attempts per page; 1 disables retries.
    pub max_page_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            search_engine_id: None,
            search_url: DEFAULT_SEARCH_URL.to_string(),
            ingest_url: DEFAULT_INGEST_URL.to_string(),
            data_dir: default_data_dir(),
            monthly_limit: 1000,
            safety_factor: 2.0,
            quality_threshold: 70.0,
            classifier_url: DEFAULT_CLASSIFIER_URL.to_string(),
            classifier_token: None,
            classifier_max_chars: 4000,
            provider_timeout_secs: 30,
            ingest_timeout_secs: 10,
            scorer_timeout_secs: 30,
            max_page_attempts: 1,
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads `.env`, the default config file, and environment overrides.
    pub fn from_environment() -> Result<Self, StoreError> {
        Self::from_environment_with_file(&Self::default_path())
    }

    /// Like [`Config::from_environment`] with an explicit config file path.
    pub fn from_environment_with_file(path: &Path) -> Result<Self, StoreError> {
        match dotenvy::dotenv() {
            Ok(env_path) => debug!(path = %env_path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(StoreError::Config(format!("invalid .env file: {e}"))),
        }

        let mut config = Self::load_from(path)?;
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Loads configuration from a specific path, or defaults if absent.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Applies environment overrides using `lookup` to read variables.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GOOGLE_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = get("GOOGLE_CX") {
            self.search_engine_id = Some(v);
        }
        if let Some(v) = get("GOOGLE_SEARCH_URL") {
            self.search_url = v;
        }
        if let Some(v) = get("LEADSEARCH_INGEST_URL") {
            self.ingest_url = v;
        }
        if let Some(v) = get("LEADSEARCH_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("LEADSEARCH_MONTHLY_LIMIT") {
            self.monthly_limit = parse_env("LEADSEARCH_MONTHLY_LIMIT", &v)?;
        }
        if let Some(v) = get("LEADSEARCH_SAFETY_FACTOR") {
            self.safety_factor = parse_env("LEADSEARCH_SAFETY_FACTOR", &v)?;
        }
        if let Some(v) = get("LEADSEARCH_QUALITY_THRESHOLD") {
            self.quality_threshold = parse_env("LEADSEARCH_QUALITY_THRESHOLD", &v)?;
        }
        if let Some(v) = get("LEADSEARCH_CLASSIFIER_URL") {
            self.classifier_url = v;
        }
        if let Some(v) = get("LEADSEARCH_CLASSIFIER_TOKEN") {
            self.classifier_token = Some(v);
        }
        if let Some(v) = get("LEADSEARCH_PROVIDER_TIMEOUT") {
            self.provider_timeout_secs = parse_env("LEADSEARCH_PROVIDER_TIMEOUT", &v)?;
        }
        if let Some(v) = get("LEADSEARCH_INGEST_TIMEOUT") {
            self.ingest_timeout_secs = parse_env("LEADSEARCH_INGEST_TIMEOUT", &v)?;
        }
        if let Some(v) = get("LEADSEARCH_SCORER_TIMEOUT") {
            self.scorer_timeout_secs = parse_env("LEADSEARCH_SCORER_TIMEOUT", &v)?;
        }
        if let Some(v) = get("LEADSEARCH_MAX_PAGE_ATTEMPTS") {
            self.max_page_attempts = parse_env("LEADSEARCH_MAX_PAGE_ATTEMPTS", &v)?;
        }
        Ok(())
    }

    /// Checks everything that must hold before any query runs.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(StoreError::Config("GOOGLE_API_KEY is not set".to_string()));
        }
        if self
            .search_engine_id
            .as_deref()
            .is_none_or(|k| k.trim().is_empty())
        {
            return Err(StoreError::Config("GOOGLE_CX is not set".to_string()));
        }
        if self.monthly_limit == 0 {
            return Err(StoreError::Config("monthly limit must be > 0".to_string()));
        }
        if !self.safety_factor.is_finite() || self.safety_factor < 1.0 {
            return Err(StoreError::Config(format!(
                "safety factor must be >= 1.0, got {}",
                self.safety_factor
            )));
        }
        if self.max_page_attempts == 0 {
            return Err(StoreError::Config("max page attempts must be >= 1".to_string()));
        }
        for (name, value) in [
            ("search URL", &self.search_url),
            ("ingest URL", &self.ingest_url),
            ("classifier URL", &self.classifier_url),
        ] {
            Url::parse(value)
                .map_err(|e| StoreError::Config(format!("invalid {name} {value:?}: {e}")))?;
        }
        Ok(())
    }

    /// Returns a copy with secrets masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "********".to_string());
        Self {
            api_key: mask(&self.api_key),
            classifier_token: mask(&self.classifier_token),
            ..self.clone()
        }
    }

    /// Path of the usage counter document.
    pub fn usage_path(&self) -> PathBuf {
        self.data_dir.join("api_usage.json")
    }

    /// Path of the URL log.
    pub fn url_log_path(&self) -> PathBuf {
        self.data_dir.join("urls.csv")
    }

    /// Path of the fallback event log.
    pub fn fallback_log_path(&self) -> PathBuf {
        self.data_dir.join("fallback_events.jsonl")
    }

    /// Timeout for one search provider call.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Timeout for the ingestion request.
    pub fn ingest_timeout(&self) -> Duration {
        Duration::from_secs(self.ingest_timeout_secs)
    }

    /// Timeout for the classification request.
    pub fn scorer_timeout(&self) -> Duration {
        Duration::from_secs(self.scorer_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, StoreError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| StoreError::Config(format!("{key}={value:?}: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
