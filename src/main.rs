//! Linkweave main entry point
//!
//! This is the command-line interface for the Linkweave link graph crawler.

use anyhow::Context;
use clap::Parser;
use linkweave::checkpoint::{CheckpointHandle, CheckpointManager};
use linkweave::config::{compute_config_hash, parse_config, validate, Config, ConfigOverrides};
use linkweave::crawler::{Coordinator, ResumeFrom};
use linkweave::output::{export_sqlite, print_report, print_statistics, SnapshotStatistics};
use linkweave::url::AddressScheme;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Linkweave: a resumable breadth-first link graph crawler
///
/// Linkweave starts at a seed address, assigns every discovered address a
/// stable integer id and records the directed link graph between fetched
/// pages. Progress is checkpointed so an interrupted crawl can pick up where
/// it left off.
#[derive(Parser, Debug)]
#[command(name = "linkweave")]
#[command(version)]
#[command(about = "A resumable link graph crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address the crawl starts from
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Stop once this many nodes have been fetched
    #[arg(long, value_name = "N")]
    max_nodes: Option<usize>,

    /// Number of concurrent workers
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Write a checkpoint every N newly fetched nodes
    #[arg(long, value_name = "N")]
    checkpoint_interval: Option<usize>,

    /// Directory holding checkpoint files
    #[arg(long, value_name = "DIR")]
    checkpoint_dir: Option<String>,

    /// Resume from the newest valid checkpoint, or from the given file
    #[arg(long, value_name = "CHECKPOINT", num_args = 0..=1)]
    resume: Option<Option<PathBuf>>,

    /// Write the final graph to a SQLite database
    #[arg(long, value_name = "PATH")]
    export_db: Option<PathBuf>,

    /// Print statistics for a checkpoint file and exit
    #[arg(long, value_name = "CHECKPOINT", conflicts_with = "resume")]
    inspect: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            seed_url: self.seed.clone(),
            max_nodes: self.max_nodes,
            worker_count: self.workers,
            checkpoint_interval: self.checkpoint_interval,
            checkpoint_dir: self.checkpoint_dir.clone(),
        }
    }

    fn resume_from(&self) -> ResumeFrom {
        match &self.resume {
            None => ResumeFrom::Fresh,
            Some(None) => ResumeFrom::Latest,
            Some(Some(path)) => ResumeFrom::Checkpoint(path.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(&cli)?;

    if let Some(checkpoint) = &cli.inspect {
        return handle_inspect(&config, checkpoint);
    }

    handle_crawl(&config, &cli.resume_from(), cli.export_db.as_deref()).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkweave=info,warn"),
            1 => EnvFilter::new("linkweave=debug,info"),
            2 => EnvFilter::new("linkweave=trace,debug"),
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

/// Reads the config file if one was given, then layers the flags on top
fn load_configuration(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let config = parse_config(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            let hash = compute_config_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    config.apply_overrides(&cli.overrides());
    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Handles --inspect: loads one checkpoint and prints its statistics
fn handle_inspect(config: &Config, checkpoint: &Path) -> anyhow::Result<()> {
    let directory = checkpoint
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let manager = CheckpointManager::new(directory, AddressScheme::from_scope(&config.scope))?;
    let handle = CheckpointHandle::from_path(checkpoint)?;

    let snapshot = manager
        .load(&handle)
        .with_context(|| format!("failed to load {}", checkpoint.display()))?;

    println!("Checkpoint: {} (#{})\n", checkpoint.display(), handle.sequence_number);
    print_statistics(&SnapshotStatistics::from_snapshot(&snapshot));
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    resume: &ResumeFrom,
    export_db: Option<&Path>,
) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling up to {} nodes with {} workers",
        config.crawler.max_nodes,
        config.crawler.worker_count
    );

    let mut coordinator = Coordinator::from_config(config, resume)?;
    tracing::info!(
        "Writing checkpoints to {}",
        coordinator.checkpoints().directory().display()
    );

    let shutdown = coordinator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight work");
            shutdown.shutdown();
        }
    });

    let report = match coordinator.run().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };
    print_report(&report);

    if let Some(path) = export_db {
        let summary = export_sqlite(&coordinator.session().snapshot(), path)
            .with_context(|| format!("failed to export to {}", path.display()))?;
        println!(
            "\n✓ Exported {} nodes, {} edges and {} errors to {}",
            summary.nodes,
            summary.edges,
            summary.errors,
            path.display()
        );
    }

    Ok(())
}
