//! Usage command - show quota consumption.

use std::sync::Arc;

use anyhow::Result;
use leadsearch_fetch::{GoogleSearchBackend, QuotaConfig, QuotaGuard};
use leadsearch_store::{ensure_dir, Config, JsonUsageLedger, TracingFallbackRecorder};
use tracing::debug;

use crate::output::{JsonFormatter, TextFormatter, UsageOutput};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the usage command.
pub async fn run(cli: &Cli) -> Result<ExitCode> {
    let config = Config::from_environment()?;
    let quota = QuotaConfig::new(config.monthly_limit, config.safety_factor)?;

    ensure_dir(&config.data_dir).await?;
    let ledger = JsonUsageLedger::open(config.usage_path(), GoogleSearchBackend::SERVICE).await?;
    debug!(path = %ledger.path().display(), "Reading usage ledger");

    let guard = QuotaGuard::new(Arc::new(ledger), Arc::new(TracingFallbackRecorder), quota);
    let status = guard.status(GoogleSearchBackend::SERVICE).await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!(
                "{}",
                formatter.format_usage(GoogleSearchBackend::SERVICE, &status, quota.safety_factor())
            );
        }
        OutputFormat::Json => {
            let output = UsageOutput::new(GoogleSearchBackend::SERVICE, &status, quota.safety_factor());
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    Ok(ExitCode::Success)
}
