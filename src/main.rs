//! page-sweep main entry point
//!
//! This is the command-line interface for the page-sweep listing sweeper.

use anyhow::{Context, Result};
use clap::Parser;
use page_sweep::checkpoint::{
    load_latest, recovery_candidates, CheckpointStore, FsSnapshotStore, Recovered, SnapshotNames,
};
use page_sweep::config::{load_config_with_hash, validate, Config};
use page_sweep::output::{
    load_latest_records, print_statistics, print_validation, validate_records, write_run_summary,
    DatasetStatistics,
};
use page_sweep::record::with_clean_names;
use page_sweep::surface::{HtmlSession, PlainTextSummarizer};
use page_sweep::traversal::{ControllerSettings, TraversalController};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Exit code for configuration and startup errors
const EXIT_STARTUP: u8 = 2;

/// page-sweep: a resumable sweeper for paginated listings
///
/// page-sweep clicks through every page of a listing, extracts each record
/// once, and writes checkpoints so an interrupted run can resume without
/// duplicating work.
#[derive(Parser, Debug)]
#[command(name = "page-sweep")]
#[command(version)]
#[command(about = "A resumable sweeper for paginated listings", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start from an empty dataset, ignoring existing snapshots
    #[arg(long)]
    fresh: bool,

    /// Override the configured first page
    #[arg(long, value_name = "PAGE")]
    start_page: Option<u32>,

    /// Override the configured last page
    #[arg(long, value_name = "PAGE")]
    end_page: Option<u32>,

    /// Validate config and show what a run would resume from, without sweeping
    #[arg(long, conflicts_with_all = ["stats", "validate", "export"])]
    dry_run: bool,

    /// Show statistics of the latest snapshot and exit
    #[arg(long, conflicts_with_all = ["dry_run", "validate", "export"])]
    stats: bool,

    /// Check the latest snapshot for records missing an ID or Name and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "export"])]
    validate: bool,

    /// Rebuild the consolidated JSON and CSV from the latest snapshot and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "validate"])]
    export: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(EXIT_STARTUP)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_sweep=info,warn"),
            1 => EnvFilter::new("page_sweep=debug,info"),
            2 => EnvFilter::new("page_sweep=trace,debug"),
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

async fn execute(cli: Cli) -> Result<ExitCode> {
    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, cli.start_page, cli.end_page)?;

    let names = SnapshotNames::new(config.checkpoint.file_prefix.clone());
    let store = FsSnapshotStore::new(&config.checkpoint.directory);

    if cli.dry_run {
        handle_dry_run(&config, &store, &names)?;
    } else if cli.stats {
        handle_stats(&store, &names)?;
    } else if cli.validate {
        handle_validate(&store, &names)?;
    } else if cli.export {
        handle_export(&config, store, names)?;
    } else {
        return handle_sweep(config, config_hash, store, names, cli.fresh).await;
    }

    Ok(ExitCode::SUCCESS)
}

/// Applies the page range flags and re-validates the result
fn apply_overrides(config: &mut Config, start_page: Option<u32>, end_page: Option<u32>) -> Result<()> {
    if let Some(start) = start_page {
        config.traversal.start_page = start;
    }
    if let Some(end) = end_page {
        config.traversal.end_page = Some(end);
    }
    validate(config).context("Invalid configuration after CLI overrides")
}

/// Handles the --dry-run mode: shows the resolved config and the recovery source
fn handle_dry_run(config: &Config, store: &FsSnapshotStore, names: &SnapshotNames) -> Result<()> {
    println!("=== page-sweep Dry Run ===\n");

    println!("Traversal:");
    println!("  Start page: {}", config.traversal.start_page);
    match config.traversal.end_page {
        Some(end) => println!("  End page: {}", end),
        None => println!("  End page: (until the pager runs out)"),
    }
    println!("  Navigation attempts: {}", config.traversal.max_nav_retries);
    println!("  Detail attempts: {}", config.traversal.max_detail_retries);
    println!("  Retry delay: {}ms", config.traversal.retry_delay_ms);
    println!("  Page delay: {}ms", config.traversal.page_delay_ms);

    println!("\nCheckpoints:");
    println!("  Directory: {}", store.root().display());
    println!("  Interval: every {} records", config.checkpoint.interval_size);
    println!("  Consolidated: {}, {}", names.consolidated(), names.tabular());

    println!("\nSurface:");
    println!("  Listing URL: {}", config.surface.listing_url);
    println!("  User agent: {}", config.surface.user_agent);
    println!("  Timeout: {}s", config.surface.timeout_secs);

    let candidates = recovery_candidates(store, names).context("Failed to list snapshots")?;
    println!("\nRecovery candidates ({}):", candidates.len());
    for candidate in &candidates {
        println!(
            "  - {} ({}, {} bytes)",
            candidate.snapshot.name, candidate.kind, candidate.snapshot.size
        );
    }

    println!("\n✓ Configuration is valid");
    match candidates.first() {
        Some(first) => println!("✓ Would resume from {}", first.snapshot.name),
        None => println!("✓ Would start with an empty dataset"),
    }

    Ok(())
}

/// Handles the --stats mode: statistics of the latest snapshot
fn handle_stats(store: &FsSnapshotStore, names: &SnapshotNames) -> Result<()> {
    match load_latest_records(store, names)? {
        Some((source, records)) => {
            let stats = DatasetStatistics::from_records(&records);
            print_statistics(&source, &stats);
        }
        None => println!("No snapshots found in {}", store.root().display()),
    }
    Ok(())
}

/// Handles the --validate mode: reports records missing an ID or Name
fn handle_validate(store: &FsSnapshotStore, names: &SnapshotNames) -> Result<()> {
    match load_latest_records(store, names)? {
        Some((source, records)) => {
            let issues = validate_records(&records);
            print_validation(&source, records.len(), &issues);
        }
        None => println!("No snapshots found in {}", store.root().display()),
    }
    Ok(())
}

/// Handles the --export mode: rewrites the consolidated dataset from the latest snapshot
fn handle_export(config: &Config, store: FsSnapshotStore, names: SnapshotNames) -> Result<()> {
    let recovered = load_latest(&store, &names).context("Failed to read snapshots")?;
    let Some(source) = recovered.source else {
        println!("No snapshots found in {}", store.root().display());
        return Ok(());
    };

    let root = store.root().to_path_buf();
    let mut checkpoints = CheckpointStore::new(store, names, config.checkpoint.interval_size);

    let records = with_clean_names(recovered.accumulator.records());
    if let Err(failures) = checkpoints.write_consolidated(&records) {
        for failure in &failures {
            tracing::error!("{}", failure);
        }
        anyhow::bail!("{} export writes failed", failures.len());
    }

    println!(
        "✓ Exported {} records from {} to {}",
        recovered.accumulator.len(),
        source,
        root.display()
    );
    Ok(())
}

/// Handles the main sweep
async fn handle_sweep(
    config: Config,
    config_hash: String,
    store: FsSnapshotStore,
    names: SnapshotNames,
    fresh: bool,
) -> Result<ExitCode> {
    let recovered = if fresh {
        tracing::info!("Starting fresh sweep (ignoring existing snapshots)");
        Recovered::empty()
    } else {
        load_latest(&store, &names).context("Failed to read snapshots")?
    };

    let surface = HtmlSession::new(&config.surface).context("Failed to set up the HTTP session")?;
    let summarizer = Box::new(PlainTextSummarizer::new(config.surface.summary_max_chars));
    let summary_path = store.path_of(&names.summary());
    let checkpoints = CheckpointStore::new(store, names, config.checkpoint.interval_size);

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current row");
            signal.cancel();
        }
    });

    let mut controller = TraversalController::new(
        surface,
        summarizer,
        checkpoints,
        ControllerSettings::from_config(&config),
        cancel,
    )
    .with_recovered(recovered);

    let report = controller
        .run(config.traversal.start_page, config.traversal.end_page)
        .await;

    if let Err(e) = write_run_summary(&report, &config_hash, &summary_path) {
        tracing::warn!("Could not write run summary to {}: {}", summary_path.display(), e);
    } else {
        tracing::info!("Run summary written to {}", summary_path.display());
    }

    if !report.persistence_failures.is_empty() {
        tracing::warn!(
            "{} snapshot writes failed during the run",
            report.persistence_failures.len()
        );
    }

    Ok(ExitCode::from(report.exit_code()))
}
