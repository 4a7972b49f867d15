//! Search command - run one query through the pipeline.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use leadsearch_core::FallbackRecorder;
use leadsearch_fetch::{
    GoogleSearchBackend, HttpClient, HttpIngestClient, InferenceClassifier,
    PaginatedSearchClient, QuotaConfig, QuotaGuard, RelevanceScorer, ResultSink, RetryStrategy,
    SearchOrchestrator,
};
use leadsearch_store::{
    ensure_dir, Config, CsvUrlLog, JsonUsageLedger, JsonlFallbackRecorder, StoreError,
};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::output::{JsonFormatter, SearchOutput, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    /// Search query.
    pub query: String,

    /// Number of results to collect (1-100).
    #[arg(long, short = 'n', default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub count: u32,

    /// Stop paginating after this many seconds.
    #[arg(long)]
    pub deadline_secs: Option<u64>,
}

/// Runs the search command.
pub async fn run(args: &SearchArgs, cli: &Cli) -> Result<ExitCode> {
    let query = args.query.trim();
    if query.is_empty() {
        bail!("Please enter a query");
    }

    let config = Config::from_environment()?;
    config.validate()?;

    let orchestrator = build_orchestrator(&config).await?;
    let deadline = args
        .deadline_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    info!(query, count = args.count, "Running search");
    let run = orchestrator.run(query, args.count, deadline).await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_search(&run, config.quality_threshold));
        }
        OutputFormat::Json => {
            let output = SearchOutput::from_run(&run, config.quality_threshold);
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    if run.has_results() {
        Ok(ExitCode::Success)
    } else {
        Ok(ExitCode::NoResults)
    }
}

/// Wires file-backed stores and HTTP clients into an orchestrator.
async fn build_orchestrator(config: &Config) -> Result<SearchOrchestrator> {
    ensure_dir(&config.data_dir).await?;
    debug!(data_dir = %config.data_dir.display(), "Opening stores");

    let recorder: Arc<dyn FallbackRecorder> =
        Arc::new(JsonlFallbackRecorder::new(config.fallback_log_path()));
    let ledger = JsonUsageLedger::open(config.usage_path(), GoogleSearchBackend::SERVICE).await?;
    let guard = Arc::new(QuotaGuard::new(
        Arc::new(ledger),
        recorder.clone(),
        QuotaConfig::new(config.monthly_limit, config.safety_factor)?,
    ));

    let api_key = required(config.api_key.as_deref(), "GOOGLE_API_KEY")?;
    let engine_id = required(config.search_engine_id.as_deref(), "GOOGLE_CX")?;
    let backend = GoogleSearchBackend::new(
        HttpClient::with_timeout(config.provider_timeout())?,
        &config.search_url,
        api_key,
        engine_id,
    );
    let client = PaginatedSearchClient::new(Arc::new(backend), guard, recorder);

    let url_log = CsvUrlLog::open(config.url_log_path()).await?;
    let ingest = HttpIngestClient::new(
        HttpClient::with_timeout(config.ingest_timeout())?,
        &config.ingest_url,
    );
    let sink = ResultSink::new(Arc::new(url_log), Arc::new(ingest));

    let classifier = InferenceClassifier::new(
        HttpClient::with_timeout(config.scorer_timeout())?,
        &config.classifier_url,
        config.classifier_token.clone(),
    );
    let scorer =
        RelevanceScorer::new(Arc::new(classifier)).with_max_chars(config.classifier_max_chars);

    Ok(SearchOrchestrator::new(client, sink, scorer)
        .with_retry(retry_strategy(config.max_page_attempts)))
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, StoreError> {
    value.ok_or_else(|| StoreError::Config(format!("{name} is not set")))
}

fn retry_strategy(max_attempts: u32) -> RetryStrategy {
    if max_attempts <= 1 {
        RetryStrategy::no_retry()
    } else {
        RetryStrategy::new(max_attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_attempt_means_no_retry() {
        assert_eq!(retry_strategy(1).max_attempts, 1);
        assert_eq!(retry_strategy(0).max_attempts, 1);
        assert_eq!(retry_strategy(3).max_attempts, 3);
    }

    #[test]
    fn test_missing_credential_is_config_error() {
        let err = required(None, "GOOGLE_CX").unwrap_err();
        assert!(matches!(err, StoreError::Config(msg) if msg.contains("GOOGLE_CX")));
    }
}
