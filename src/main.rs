//! scp-harvest main entry point
//!
//! This is the command-line interface for the SCP entry harvester.

use anyhow::Context;
use clap::Parser;
use scp_harvest::config::{load_config_with_hash, validate, Config};
use scp_harvest::output::{collect_statistics, print_statistics, write_json_output, RunRange};
use scp_harvest::{EntryId, Harvester};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// scp-harvest: structured records from SCP wiki entries
///
/// Fetches entry pages for a range of identifiers, extracts their class,
/// containment procedures, description, images and tags, resolves display
/// names from the series index pages, and writes everything to one JSON file.
#[derive(Parser, Debug)]
#[command(name = "scp-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Structured record extraction for SCP wiki entries", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// First identifier of the range (overrides batch.start-id)
    #[arg(long, conflicts_with = "id")]
    start: Option<i64>,

    /// Last identifier of the range (overrides batch.end-id)
    #[arg(long, conflicts_with = "id")]
    end: Option<i64>,

    /// Extract a single identifier and print its record to stdout
    #[arg(long)]
    id: Option<i64>,

    /// Output JSON path (overrides output.json-path)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Maximum entries extracted at once (overrides batch.max-concurrent)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults"),
    }
    let (mut config, config_hash) = match load_config_with_hash(cli.config.as_deref()) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid command-line overrides")?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, cli.id);
    } else if let Some(id) = cli.id {
        handle_single(&config, id).await?;
    } else {
        handle_harvest(&config, &config_hash).await?;
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
            0 => EnvFilter::new("scp_harvest=info,warn"),
            1 => EnvFilter::new("scp_harvest=debug,info"),
            2 => EnvFilter::new("scp_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Folds command-line flags into the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(start) = cli.start {
        config.batch.start_id = start;
    }
    if let Some(end) = cli.end {
        config.batch.end_id = end;
    }
    if let Some(id) = cli.id {
        config.batch.start_id = id;
        config.batch.end_id = id;
    }
    if let Some(output) = &cli.output {
        config.output.json_path = output.to_string_lossy().into_owned();
    }
    if let Some(concurrency) = cli.concurrency {
        config.batch.max_concurrent = concurrency;
    }
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config, single: Option<i64>) {
    println!("=== scp-harvest Dry Run ===\n");

    println!("Site:");
    println!("  Entry pages: {}<id>", config.site.entry_base_url);
    println!("  Series index: {}", config.site.series_base_url);

    println!("\nFetch:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!(
        "  Timeouts: {}s request, {}s connect",
        config.fetch.timeout_secs, config.fetch.connect_timeout_secs
    );
    println!(
        "  Retries: {} (backoff {}ms)",
        config.fetch.max_retries, config.fetch.backoff_ms
    );

    println!("\nBatch:");
    println!(
        "  Range: [{}, {}]",
        config.batch.start_id, config.batch.end_id
    );
    println!("  Max concurrent: {}", config.batch.max_concurrent);
    println!("  Parser backend: {:?}", config.parser.backend);

    println!("\nExcluded Tags ({}):", config.extract.excluded_tags.len());
    println!("  {}", config.extract.excluded_tags.join(", "));

    println!("\nOutput:");
    match single {
        Some(_) => println!("  stdout"),
        None => println!("  {}", config.output.json_path),
    }

    let count = config.batch.end_id - config.batch.start_id + 1;
    println!("\n✓ Configuration is valid");
    println!("✓ Would harvest {} entries", count);
}

/// Handles the --id mode: extracts one entry and prints it
async fn handle_single(config: &Config, raw: i64) -> anyhow::Result<()> {
    let id = EntryId::new(raw)?;
    let harvester = Harvester::from_config(config)?;

    tracing::info!("Extracting {} from {}", id, harvester.entry_url(id));
    let record = harvester
        .extract_one(id)
        .await
        .with_context(|| format!("failed to extract {}", id))?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Handles the main harvest over the configured range
async fn handle_harvest(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    let harvester = Harvester::from_config(config)?;
    let range = RunRange {
        start: config.batch.start_id,
        end: config.batch.end_id,
    };

    let cancel = harvester.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing entries in flight");
            cancel.cancel();
        }
    });

    let started = Instant::now();
    let outcome = match harvester.run(range.start, range.end).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e.into());
        }
    };

    let output_path = PathBuf::from(&config.output.json_path);
    write_json_output(&outcome, range, config_hash, &output_path)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    let stats = collect_statistics(&outcome, started.elapsed());
    print_statistics(&stats);
    println!("\n✓ Results written to: {}", output_path.display());

    Ok(())
}
