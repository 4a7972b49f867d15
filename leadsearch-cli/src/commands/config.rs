//! Config command - inspect configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use leadsearch_store::{default_config_dir, Config};

use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the resolved configuration (secrets redacted).
    Show,

    /// Show configuration and data paths.
    Path,
}

/// Runs the config command.
pub fn run(args: &ConfigArgs, cli: &Cli) -> Result<ExitCode> {
    let config = Config::from_environment()?;

    match args.action {
        ConfigAction::Show => show_config(&config, cli)?,
        ConfigAction::Path => show_paths(&config, cli)?,
    }

    Ok(ExitCode::Success)
}

fn show_config(config: &Config, cli: &Cli) -> Result<()> {
    let config = config.redacted();

    match cli.format {
        OutputFormat::Text => {
            let unset = || "(not set)".to_string();
            println!("LeadSearch Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("API key:           {}", config.api_key.clone().unwrap_or_else(unset));
            println!(
                "Search engine ID:  {}",
                config.search_engine_id.clone().unwrap_or_else(unset)
            );
            println!("Search URL:        {}", config.search_url);
            println!("Ingest URL:        {}", config.ingest_url);
            println!("Classifier URL:    {}", config.classifier_url);
            println!();
            println!("Monthly limit:     {}", config.monthly_limit);
            println!("Safety factor:     {}", config.safety_factor);
            println!("Quality threshold: {}", config.quality_threshold);
            println!("Page attempts:     {}", config.max_page_attempts);
            println!();
            println!(
                "Timeouts:          provider {}s, ingest {}s, scorer {}s",
                config.provider_timeout_secs,
                config.ingest_timeout_secs,
                config.scorer_timeout_secs
            );

            if let Err(e) = config.validate() {
                println!();
                println!("Warning: {e}");
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&config)?);
        }
    }

    Ok(())
}

fn show_paths(config: &Config, cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let config_file = Config::default_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:      {}", config_dir.display());
            println!("Config file:     {}", config_file.display());
            println!("Data dir:        {}", config.data_dir.display());
            println!("Usage ledger:    {}", config.usage_path().display());
            println!("URL log:         {}", config.url_log_path().display());
            println!("Fallback events: {}", config.fallback_log_path().display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "config_file": config_file.display().to_string(),
                "data_dir": config.data_dir.display().to_string(),
                "usage_ledger": config.usage_path().display().to_string(),
                "url_log": config.url_log_path().display().to_string(),
                "fallback_events": config.fallback_log_path().display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}
