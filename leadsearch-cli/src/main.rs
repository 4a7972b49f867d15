// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! LeadSearch CLI - quota-governed web search from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Search for 25 results
//! leadsearch search "rust embedded consultancies" --count 25
//!
//! # Stop paginating after 20 seconds
//! leadsearch search "rust embedded consultancies" --deadline-secs 20
//!
//! # JSON output
//! leadsearch --format json --pretty search "rust jobs"
//!
//! # Show quota consumption
//! leadsearch usage
//!
//! # Show resolved configuration
//! leadsearch config show
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use leadsearch_core::CoreError;
use leadsearch_store::StoreError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{config, search, usage};

// ============================================================================
// CLI Definition
// ============================================================================

/// LeadSearch CLI - quota-governed web search.
#[derive(Parser)]
#[command(name = "leadsearch")]
#[command(about = "Quota-governed web search with URL hand-off and relevance scoring")]
#[command(long_about = r#"
LeadSearch runs paginated web searches under a monthly call quota,
logs discovered URLs, forwards them to an ingestion service, and scores
how relevant the results are to the query.

Required environment (or .env / config file):
  GOOGLE_API_KEY     Custom Search API key
  GOOGLE_CX          Programmable search engine ID

Examples:
  leadsearch search "rust consultancies" --count 25
  leadsearch usage                        # Quota consumption
  leadsearch config show                  # Resolved configuration
  leadsearch --format json search "rust"  # JSON output
"#)]
#[command(version)]
#[command(author = "LeadSearch Contributors")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run a search query.
    #[command(visible_alias = "s")]
    Search(search::SearchArgs),

    /// Show quota consumption for the search provider.
    #[command(visible_alias = "u")]
    Usage,

    /// Inspect configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Missing or invalid configuration.
    ConfigError = 2,
    /// The search finished without any results.
    NoResults = 3,
}

impl ExitCode {
    /// Picks the exit code for a failed command.
    fn for_error(err: &anyhow::Error) -> Self {
        let store_config = matches!(err.downcast_ref::<StoreError>(), Some(StoreError::Config(_)));
        let core_config = matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::InvalidConfig(_))
        );

        if store_config || core_config {
            ExitCode::ConfigError
        } else {
            ExitCode::Error
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("leadsearch=debug,info")
    } else {
        EnvFilter::new("leadsearch=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Search(args) => search::run(args, &cli).await,
        Commands::Usage => usage::run(&cli).await,
        Commands::Config(args) => config::run(args, &cli),
    };

    match result {
        Ok(ExitCode::Success) => Ok(()),
        Ok(code) => std::process::exit(code as i32),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e}");
            }
            std::process::exit(ExitCode::for_error(&e) as i32);
        }
    }
}
