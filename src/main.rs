//! housing-stats - Scottish housing statistics reports
//!
//! A CLI tool that builds the geography hierarchy from the data zone
//! lookup table, queries statistics.gov.scot and writes a dashboard report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad config, unreachable source, unknown council, etc.)

mod cli;
mod config;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use housing_stats::geography::GeographySource;
use housing_stats::progress::{NullProgress, ProgressCallback};
use housing_stats::report::{self, DashboardReport, ReportMetadata};
use housing_stats::sparql::SparqlClient;
use housing_stats::DashboardSession;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("housing-stats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_report(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .housing-stats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Set [geography].source to your lookup table to get started.");
    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the whole report workflow. Returns the exit code.
async fn run_report(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let client = SparqlClient::new(config.sparql_config())
        .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;
    let session =
        DashboardSession::with_sparql(client).with_comparison_options(config.comparison_options());

    let geography = config.geography.source.as_deref().map(GeographySource::parse);

    if let Some(ref source) = geography {
        println!("🗺️  Loading geography table: {}", source);
        let summary = session.reload_geography(source).await?;
        println!(
            "   {} councils, {} wards, {} data zones ({} rows rejected)",
            summary.councils, summary.wards, summary.data_zones, summary.rejected_rows
        );
    }

    if args.dry_run {
        return handle_dry_run(&session, geography.is_some());
    }

    let metadata = ReportMetadata {
        generated_at: Utc::now(),
        endpoint: config.endpoint.sparql_url.clone(),
        geography_source: geography.as_ref().map(|s| s.to_string()),
        area_code: args.area.clone(),
        council_code: args.council.clone(),
        duration_seconds: 0.0,
    };
    let mut report = DashboardReport::new(metadata);
    report.geography = session.last_build();

    if let Some(ref area) = args.area {
        println!("\n📈 Fetching price history for {}...", area);
        let history = session
            .price_history(area)
            .await
            .with_context(|| format!("Price feed unavailable for {}", area))?;
        println!("   {} years of data", history.summaries.len());
        report.price_history = Some(history);

        match session.dwelling_types(area).await {
            Ok(totals) => report.dwelling_types = totals,
            Err(e) => {
                warn!("Dwelling types for {} unavailable: {}", area, e);
                report
                    .warnings
                    .push(format!("Dwelling types unavailable: {}", e));
            }
        }
    }

    if let Some(ref council) = args.council {
        if geography.is_none() {
            bail!("--council needs a geography table (--geography or [geography].source)");
        }

        let country = &config.geography.default_country;
        println!("\n🏘️  Comparing wards of {}...", council);

        let progress = progress_bar(args.quiet)?;
        let callback: &dyn ProgressCallback = match progress {
            Some(ref bar) => bar,
            None => &NullProgress,
        };

        let comparison = session
            .compare_council(country, council, callback)
            .await
            .ok_or_else(|| anyhow!("Council {} not found in country {}", council, country))?;

        println!(
            "   Ranked {} of {} wards ({} failed, {} incomplete)",
            comparison.entries.len(),
            comparison.outcomes.len(),
            comparison.failed_count(),
            comparison.incomplete_count()
        );
        report.ward_comparison = Some(comparison);
    }

    report.metadata.duration_seconds = start_time.elapsed().as_secs_f64();

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = Path::new(&config.general.output);
    std::fs::write(output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    println!(
        "\n✅ Report saved to: {} ({:.1}s)",
        output_path.display(),
        report.metadata.duration_seconds
    );

    Ok(0)
}

/// Handle --dry-run: list the councils of the loaded hierarchy.
fn handle_dry_run(session: &DashboardSession, loaded: bool) -> Result<i32> {
    if !loaded {
        bail!("--dry-run needs a geography table (--geography or [geography].source)");
    }

    println!("\n🔍 Dry run: no statistics queries will be sent.\n");

    let hierarchy = session.hierarchy();
    for country in hierarchy.countries.values() {
        println!("   {} ({})", country.name, country.code);
        for council in country.councils.values() {
            println!(
                "     🏛️  {} ({}) - {} wards",
                council.name,
                council.code,
                council.wards.len()
            );
        }
    }

    println!("\n✅ Dry run complete.");
    Ok(0)
}

fn progress_bar(quiet: bool) -> Result<Option<ProgressBar>> {
    if quiet {
        return Ok(None);
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} wards")?
            .progress_chars("#>-"),
    );
    Ok(Some(pb))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
