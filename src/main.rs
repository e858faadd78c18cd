//! Planning Scraper main entry point
//!
//! This is the command-line interface for the planning application scraper.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use planning_scraper::config::{load_config_with_hash, Config};
use planning_scraper::pipeline::{run_pipeline, should_discover, DiscoveryMode};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Planning Scraper: a batch harvester for planning-application portals
///
/// Each run searches the portal for newly received applications,
/// re-extracts detail pages that are due according to their age, and
/// exports the local store as CSV and JSON snapshots.
#[derive(Parser, Debug)]
#[command(name = "planning-scraper")]
#[command(version)]
#[command(about = "A batch harvester for planning-application portals", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Never search the portal for new applications
    #[arg(long, conflicts_with = "force_discovery")]
    skip_discovery: bool,

    /// Search the portal even if the store looks up to date
    #[arg(long, conflicts_with = "skip_discovery")]
    force_discovery: bool,

    /// Re-export existing data without discovering or fetching anything
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_only: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_only"])]
    stats: bool,

    /// Validate config and show what a run would do without doing it
    #[arg(long, conflicts_with_all = ["stats", "export_only"])]
    dry_run: bool,
}

impl Cli {
    fn discovery_mode(&self) -> DiscoveryMode {
        if self.skip_discovery {
            DiscoveryMode::Skip
        } else if self.force_discovery {
            DiscoveryMode::Force
        } else {
            DiscoveryMode::Auto
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, cli.discovery_mode())?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_only {
        handle_export_only(&config)?;
    } else {
        handle_run(config, config_hash, cli.discovery_mode()).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("planning_scraper=info,warn"),
            1 => EnvFilter::new("planning_scraper=debug,info"),
            2 => EnvFilter::new("planning_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what a run would do
fn handle_dry_run(config: &Config, mode: DiscoveryMode) -> anyhow::Result<()> {
    use planning_scraper::output::{configured_exporters, load_statistics};
    use planning_scraper::storage::{open_storage, Storage};

    println!("=== Planning Scraper Dry Run ===\n");

    println!("Portal:");
    println!("  Search form: {}", config.portal.search_url);
    println!("  Date format: {}", config.portal.date_format);

    println!("\nDiscovery:");
    println!("  Days back: {}", config.discovery.days_back);
    println!("  Stale after: {} days", config.discovery.stale_after_days);
    match &config.discovery.remote_url {
        Some(url) => println!("  Browser: remote at {}", url),
        None => println!(
            "  Browser: {} ({})",
            config
                .discovery
                .chrome_executable
                .as_deref()
                .unwrap_or("auto-detected"),
            if config.discovery.headless {
                "headless"
            } else {
                "windowed"
            }
        ),
    }

    println!("\nExtraction:");
    println!("  User agent: {}", config.extraction.user_agent);
    println!(
        "  Cache: {} ({}h)",
        config.extraction.cache_path, config.extraction.cache_ttl_hours
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Export dir: {}", config.output.export_dir);
    let exporters = configured_exporters(&config.output);
    for exporter in &exporters {
        println!("  - {}", exporter.name());
    }

    println!("\n✓ Configuration is valid");

    let database = Path::new(&config.output.database_path);
    if !database.exists() {
        println!("✓ No database yet, a run would start with discovery");
        return Ok(());
    }

    let storage = open_storage(database)?;
    let now = Utc::now();
    let latest = storage.latest_received_date()?;
    if should_discover(
        mode,
        latest,
        now.date_naive(),
        config.discovery.stale_after_days,
    ) {
        println!(
            "✓ Would search the last {} days for new applications",
            config.discovery.days_back
        );
    } else {
        println!("✓ Would skip discovery");
    }

    let stats = load_statistics(&storage, now)?;
    println!(
        "✓ Would extract {} of {} stored applications",
        stats.total_due(),
        stats.total_applications
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use planning_scraper::output::{load_statistics, print_statistics};
    use planning_scraper::storage::open_storage;

    println!("Database: {}\n", config.output.database_path);

    // Open the database
    let storage = open_storage(Path::new(&config.output.database_path))?;

    // Load statistics
    let stats = load_statistics(&storage, Utc::now())?;

    // Print statistics
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-only mode: re-exports existing data
fn handle_export_only(config: &Config) -> anyhow::Result<()> {
    use planning_scraper::output::export_all;
    use planning_scraper::storage::open_storage;

    println!("=== Exporting Planning Applications ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.export_dir);
    println!();

    let storage = open_storage(Path::new(&config.output.database_path))?;

    tracing::info!("Exporting stored applications...");
    let summary = export_all(&storage, &config.output, Utc::now().date_naive())?;

    println!(
        "✓ Exported {} records to {} files",
        summary.records_written, summary.files_written
    );

    Ok(())
}

/// Handles a full batch run
async fn handle_run(config: Config, config_hash: String, mode: DiscoveryMode) -> anyhow::Result<()> {
    match mode {
        DiscoveryMode::Skip => tracing::info!("Starting run without discovery"),
        DiscoveryMode::Force => tracing::info!("Starting run with forced discovery"),
        DiscoveryMode::Auto => tracing::info!("Starting run"),
    }

    let report = run_pipeline(config, config_hash, mode)
        .await
        .context("Run failed")?;

    tracing::info!(
        "Run {} finished: {} extracted, {} records exported",
        report.run_id,
        report.extracted,
        report.exported.records_written
    );

    Ok(())
}
