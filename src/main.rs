//! Recrawl main entry point
//!
//! This is the command-line interface for the incremental document crawler.

use anyhow::Context;
use clap::Parser;
use recrawl::config::{load_config_with_hash, Config, LoggingConfig};
use recrawl::crawler::{build_work_queue, CheckpointManager, Coordinator, StopController};
use recrawl::output::{load_statistics, print_statistics};
use recrawl::storage::SqliteStorage;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Recrawl: an incremental, change-aware document crawler
///
/// Recrawl fetches documents from the configured sources, stores new and
/// changed versions with their history, and resumes from its last
/// checkpoint after an interruption.
#[derive(Parser, Debug)]
#[command(name = "recrawl")]
#[command(version = "1.0.0")]
#[command(about = "An incremental, change-aware document crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Forget the saved checkpoint and start from the first URL
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    setup_logging(cli.verbose, cli.quiet, &config.logging)?;
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber
///
/// Verbosity flags override `[logging] level`. When `[logging] file` is set
/// the same events are appended to that file without ANSI colors.
fn setup_logging(verbose: u8, quiet: bool, logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::try_new(format!("recrawl={},warn", logging.level))
                .with_context(|| format!("Invalid log level '{}'", logging.level))?,
            1 => EnvFilter::new("recrawl=debug,info"),
            _ => EnvFilter::new("recrawl=trace,debug"),
        }
    };

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(())
}

/// Sets the stop flag on Ctrl+C or SIGTERM
fn spawn_signal_listener(stop: StopController) {
    tokio::spawn(async move {
        tokio::select! {
            _ = signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, stopping after the current document");
            }
            _ = wait_for_sigterm() => {
                tracing::info!("Received SIGTERM, stopping after the current document");
            }
        }
        stop.stop();
    });
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Recrawl Dry Run ===\n");

    println!("Store:");
    println!("  Database: {}", config.db.path);
    println!("  Collection: {}", config.db.collection);
    println!("  Crawler id: {}", config.crawler.id);

    println!("\nLogic:");
    println!("  Retry attempts: {}", config.logic.retry_attempts);
    println!("  Retry backoff: {}s", config.logic.retry_backoff_seconds);
    println!("  Timeout: {}s", config.logic.timeout_seconds);
    println!("  Refresh interval: {} days", config.logic.refresh_interval_days);
    println!(
        "  Max documents per source: {}",
        config.logic.max_documents_per_source
    );
    println!(
        "  Delay between requests: {}s",
        config.logic.delay_between_requests
    );

    println!("\nPoliteness:");
    println!("  Respect robots.txt: {}", config.robots_txt.respect_robots_txt);
    println!("  User agent: {}", config.robots_txt.user_agent);

    println!("\nSources ({}):", config.sources.len());
    for (key, source) in &config.sources {
        println!(
            "  - {} [{}] \"{}\"{}",
            key,
            source.resolved_kind(key).as_str(),
            source.source_name,
            if source.enabled { "" } else { " (disabled)" }
        );
    }

    let queue = build_work_queue(config);
    println!("\nWork Queue ({} URLs):", queue.len());
    for item in &queue {
        println!("  * [{}] {}", item.source_name, item.url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.db.path);

    let storage = open_storage(config)?;
    let stats = load_statistics(&storage, &config.crawler.id)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    let mut storage = open_storage(&config)?;

    if fresh {
        tracing::info!("Starting fresh crawl (ignoring saved checkpoint)");
        CheckpointManager::new(config.crawler.id.clone())
            .clear(&mut storage)
            .context("Failed to clear checkpoint")?;
    } else {
        tracing::info!("Starting crawl (will resume from checkpoint if one exists)");
    }

    let enabled: Vec<&str> = config.enabled_sources().map(|(key, _)| key.as_str()).collect();
    tracing::info!("Enabled sources: {}", enabled.join(", "));

    let stop = StopController::new();
    spawn_signal_listener(stop.clone());

    let mut coordinator = Coordinator::new(config, storage, stop)?;
    let report = coordinator.run().await?;

    tracing::info!(
        "Crawl {} after {} of {} queued URLs (started at position {})",
        if report.stopped { "stopped" } else { "completed" },
        report.processed,
        report.queued,
        report.resumed_at
    );

    Ok(())
}

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    SqliteStorage::new(Path::new(&config.db.path), &config.db.collection)
        .with_context(|| format!("Failed to open database {}", config.db.path))
}
