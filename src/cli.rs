//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// housing-stats - house price and geography reports for Scottish areas
///
/// Loads the data zone lookup table, queries statistics.gov.scot for price
/// and dwelling data and writes a Markdown or JSON report.
///
/// Examples:
///   housing-stats --geography lookup.csv --area S12000033
///   housing-stats --geography lookup.csv --council S12000033 --concurrency 4
///   housing-stats --geography https://example.org/lookup.csv --dry-run
///   housing-stats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Data zone lookup table (local path or http(s) URL)
    ///
    /// Required for --council and --dry-run. Falls back to
    /// [geography].source in the config file.
    #[arg(short, long, value_name = "PATH|URL", env = "HOUSING_STATS_GEOGRAPHY")]
    pub geography: Option<String>,

    /// Area code for price history and dwelling types
    ///
    /// Any statistical geography code, e.g. S12000033 (Glasgow City).
    #[arg(short, long, value_name = "CODE")]
    pub area: Option<String>,

    /// Council code whose wards should be compared
    #[arg(long, value_name = "CODE")]
    pub council: Option<String>,

    /// Country code the council belongs to
    #[arg(long, value_name = "CODE")]
    pub country: Option<String>,

    /// SPARQL endpoint URL
    #[arg(long, value_name = "URL", env = "HOUSING_STATS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Maximum ward fetches in flight at once
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Per-ward fetch timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub fetch_timeout: Option<u64>,

    /// Output file path for the report
    ///
    /// Defaults to [general].output in the config file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .housing-stats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: build the hierarchy and list councils without querying
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .housing-stats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if !self.dry_run && self.area.is_none() && self.council.is_none() {
            return Err("Nothing to do: pass --area, --council or --dry-run".to_string());
        }

        if let Some(ref endpoint) = self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err("Endpoint URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.fetch_timeout == Some(0) {
            return Err("Fetch timeout must be at least 1 second".to_string());
        }

        for (flag, code) in [
            ("--area", &self.area),
            ("--council", &self.council),
            ("--country", &self.country),
        ] {
            if let Some(code) = code {
                if code.trim().is_empty() || code.contains(char::is_whitespace) {
                    return Err(format!("{} must be a single geography code", flag));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
