//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.housing-stats.toml` files.

use crate::cli::{Args, OutputFormat};
use anyhow::{Context, Result};
use housing_stats::analysis::ComparisonOptions;
use housing_stats::sparql::{SparqlConfig, DEFAULT_ENDPOINT};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = ".housing-stats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// SPARQL endpoint settings.
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Lookup table settings.
    #[serde(default)]
    pub geography: GeographyConfig,

    /// Ward comparison settings.
    #[serde(default)]
    pub comparison: ComparisonConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            format: OutputFormat::default(),
        }
    }
}

fn default_output() -> String {
    "housing_report.md".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_sparql_url")]
    pub sparql_url: String,

    /// Whole-request timeout for single area queries.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            sparql_url: default_sparql_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_sparql_url() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_request_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeographyConfig {
    /// Lookup table path or URL.
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default = "default_country")]
    pub default_country: String,
}

impl Default for GeographyConfig {
    fn default() -> Self {
        Self {
            source: None,
            default_country: default_country(),
        }
    }
}

fn default_country() -> String {
    "S92000003".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            fetch_timeout_seconds: default_fetch_timeout(),
        }
    }
}

fn default_concurrency() -> usize {
    8
}

fn default_fetch_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings when given.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(ref endpoint) = args.endpoint {
            self.endpoint.sparql_url = endpoint.clone();
        }

        if let Some(ref geography) = args.geography {
            self.geography.source = Some(geography.clone());
        }
        if let Some(ref country) = args.country {
            self.geography.default_country = country.clone();
        }

        if let Some(concurrency) = args.concurrency {
            self.comparison.concurrency = concurrency;
        }
        if let Some(timeout) = args.fetch_timeout {
            self.comparison.fetch_timeout_seconds = timeout;
        }
    }

    pub fn sparql_config(&self) -> SparqlConfig {
        SparqlConfig {
            endpoint: self.endpoint.sparql_url.clone(),
            timeout_seconds: self.endpoint.request_timeout_seconds,
        }
    }

    pub fn comparison_options(&self) -> ComparisonOptions {
        ComparisonOptions {
            concurrency: self.comparison.concurrency,
            fetch_timeout: Duration::from_secs(self.comparison.fetch_timeout_seconds),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
