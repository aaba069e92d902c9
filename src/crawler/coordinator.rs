//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop, including:
//! - Opening a fresh session or resuming one from a checkpoint
//! - Draining the frontier into a bounded pool of worker tasks
//! - Enforcing the node limit
//! - Periodic and final checkpoints
//! - Progress reporting and graceful shutdown

use crate::checkpoint::{CheckpointError, CheckpointHandle, CheckpointManager};
use crate::config::{Config, CrawlerConfig};
use crate::crawler::collaborators::Collaborators;
use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::parser::{HtmlLinkExtractor, JsonLdPayloadExtractor};
use crate::crawler::worker::{ProcessResult, Worker, WorkerPolicy};
use crate::output::{CrawlReport, StopReason};
use crate::state::CrawlSession;
use crate::url::{normalize_address, AddressScheme};
use crate::WeaveError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Where a crawl session starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeFrom {
    /// A new session seeded with the configured seed address
    Fresh,
    /// The newest valid checkpoint in the checkpoint directory, or fresh if none exist
    Latest,
    /// A specific checkpoint file
    Checkpoint(PathBuf),
}

/// Lifecycle of the crawl loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Addresses are waiting in the frontier
    Running,
    /// The frontier is empty but workers are still out
    Draining,
    /// No more work will be dispatched
    Stopped,
}

/// Requests a graceful stop of a running coordinator
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Stops dispatching new work; in-flight workers still finish
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    settings: CrawlerConfig,
    session: Arc<CrawlSession>,
    worker: Worker,
    checkpoints: CheckpointManager,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    state: OrchestratorState,
}

impl Coordinator {
    /// Creates a coordinator over an existing session
    ///
    /// # Arguments
    ///
    /// * `settings` - Crawl limits, intervals and worker policy
    /// * `session` - The session to drive
    /// * `collaborators` - Fetcher and extractors used by workers
    /// * `checkpoints` - Where periodic and final checkpoints are written
    pub fn new(
        settings: CrawlerConfig,
        session: Arc<CrawlSession>,
        collaborators: Collaborators,
        checkpoints: CheckpointManager,
    ) -> Self {
        let worker = Worker::new(
            Arc::clone(&session),
            collaborators,
            WorkerPolicy::from(&settings),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            settings,
            session,
            worker,
            checkpoints,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            state: OrchestratorState::Running,
        }
    }

    /// Creates a coordinator with the default HTTP and HTML collaborators
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    /// * `resume` - Whether to start fresh or from a checkpoint
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(WeaveError)` - The HTTP client, checkpoint directory or
    ///   requested checkpoint could not be opened
    pub fn from_config(config: &Config, resume: &ResumeFrom) -> Result<Self, WeaveError> {
        let scheme = AddressScheme::from_scope(&config.scope);
        let mut checkpoints = CheckpointManager::new(&config.checkpoint.directory, scheme)?;
        let session = open_session(config, resume, &mut checkpoints)?;

        let collaborators = Collaborators::new(
            Arc::new(HttpFetcher::from_config(&config.user_agent)?),
            Arc::new(HtmlLinkExtractor::from_scope(&config.scope)),
            Arc::new(JsonLdPayloadExtractor),
        );

        Ok(Self::new(
            config.crawler.clone(),
            Arc::new(session),
            collaborators,
            checkpoints,
        ))
    }

    pub fn session(&self) -> &Arc<CrawlSession> {
        &self.session
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    /// Handle that stops this coordinator from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            sender: Arc::clone(&self.shutdown_tx),
        }
    }

    /// Runs the crawl loop until the node limit, frontier exhaustion or shutdown
    ///
    /// A final checkpoint is always written before returning, including when
    /// a worker task panicked.
    pub async fn run(&mut self) -> Result<CrawlReport, WeaveError> {
        let session = Arc::clone(&self.session);
        let max_nodes = self.settings.max_nodes;
        let worker_count = self.settings.worker_count;

        tracing::info!(
            "Starting crawl from {} ({} nodes already fetched, {} in frontier)",
            session.seed_address(),
            session.node_count(),
            session.frontier().len()
        );

        let start_time = Instant::now();
        let mut last_report = Instant::now();
        let nodes_at_start = session.node_count();
        let mut nodes_at_checkpoint = nodes_at_start;
        let mut nodes_at_progress = nodes_at_start;
        let mut workers: JoinSet<ProcessResult> = JoinSet::new();
        let mut stopping = *self.shutdown_rx.borrow();
        let mut worker_failure = None;

        self.set_state(OrchestratorState::Running);

        loop {
            // Dispatch while there is room under both the pool and node limits
            while !stopping
                && workers.len() < worker_count
                && session.node_count() + workers.len() < max_nodes
            {
                let Some(address) = session.frontier().pop() else {
                    break;
                };
                // Claim before spawning so a snapshot always sees the address
                if !session.visited().try_claim(&address) {
                    continue;
                }
                let worker = self.worker.clone();
                workers.spawn(async move { worker.process_claimed(&address).await });
            }

            if workers.is_empty() {
                break;
            }

            if session.frontier().is_empty() {
                self.set_state(OrchestratorState::Draining);
            } else {
                self.set_state(OrchestratorState::Running);
            }

            let joined = tokio::select! {
                joined = workers.join_next() => joined,
                _ = self.shutdown_rx.changed(), if !stopping => {
                    tracing::info!(
                        "Shutdown requested, waiting for {} workers to finish",
                        workers.len()
                    );
                    stopping = true;
                    continue;
                }
            };

            match joined {
                Some(Ok(ProcessResult::Fetched { .. })) => {
                    let nodes = session.node_count();

                    if nodes - nodes_at_progress >= self.settings.progress_interval {
                        tracing::info!(
                            "Progress: {} nodes fetched, {} in frontier, {:.2}s since last report",
                            nodes,
                            session.frontier().len(),
                            last_report.elapsed().as_secs_f64()
                        );
                        nodes_at_progress = nodes;
                        last_report = Instant::now();
                    }

                    if nodes - nodes_at_checkpoint >= self.settings.checkpoint_interval {
                        self.write_checkpoint()?;
                        nodes_at_checkpoint = nodes;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!("Worker task failed: {}", e);
                    worker_failure.get_or_insert_with(|| e.to_string());
                    stopping = true;
                }
                None => {}
            }
        }

        self.set_state(OrchestratorState::Stopped);

        let stop_reason = if stopping {
            StopReason::Cancelled
        } else if session.node_count() >= max_nodes {
            StopReason::NodeLimit
        } else {
            StopReason::FrontierExhausted
        };

        let final_checkpoint = self.write_checkpoint()?;

        if let Some(message) = worker_failure {
            return Err(WeaveError::Worker(message));
        }

        let report = CrawlReport {
            nodes_fetched: session.node_count(),
            nodes_fetched_this_run: session.node_count() - nodes_at_start,
            edges: session.graph().edge_count(),
            registered_ids: session.registry().len(),
            errors: session.errors().len(),
            frontier_remaining: session.frontier().len(),
            elapsed: start_time.elapsed(),
            stop_reason,
            final_checkpoint: Some(final_checkpoint),
        };

        tracing::info!(
            "Crawl stopped ({}): {} nodes fetched, {} errors in {:?}",
            report.stop_reason,
            report.nodes_fetched,
            report.errors,
            report.elapsed
        );

        Ok(report)
    }

    fn write_checkpoint(&mut self) -> Result<CheckpointHandle, CheckpointError> {
        let snapshot = self.session.snapshot();
        self.checkpoints.save(&snapshot)
    }

    fn set_state(&mut self, state: OrchestratorState) {
        if self.state != state {
            tracing::debug!("Coordinator {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}

/// Opens the session a crawl should run against
///
/// A resumed checkpoint also moves the manager's sequence past it, so the
/// next save never reuses its number.
pub fn open_session(
    config: &Config,
    resume: &ResumeFrom,
    checkpoints: &mut CheckpointManager,
) -> Result<CrawlSession, WeaveError> {
    let (handle, snapshot) = match resume {
        ResumeFrom::Fresh => return fresh_session(config),
        ResumeFrom::Latest => match checkpoints.load_latest() {
            Ok(found) => found,
            Err(CheckpointError::NoCheckpoints(dir)) => {
                tracing::info!("No checkpoints in {}, starting fresh", dir.display());
                return fresh_session(config);
            }
            Err(e) => return Err(e.into()),
        },
        ResumeFrom::Checkpoint(path) => {
            let handle = CheckpointHandle::from_path(path.clone())?;
            let snapshot = checkpoints.load(&handle)?;
            (handle, snapshot)
        }
    };

    checkpoints.ensure_after(handle.sequence_number);

    if snapshot.seed_address != config.crawler.seed_url {
        tracing::debug!(
            "Checkpoint seed {} differs from configured seed {}; keeping the checkpoint's",
            snapshot.seed_address,
            config.crawler.seed_url
        );
    }

    tracing::info!(
        "Resuming from checkpoint {} ({} nodes, {} in frontier)",
        handle.path.display(),
        snapshot.node_count(),
        snapshot.frontier.len()
    );

    Ok(CrawlSession::from_snapshot(snapshot))
}

fn fresh_session(config: &Config) -> Result<CrawlSession, WeaveError> {
    let seed = normalize_address(&config.crawler.seed_url, None)?;
    tracing::info!("Starting fresh session at {}", seed);
    Ok(CrawlSession::fresh(seed.to_string()))
}

/// Runs a complete crawl with the default collaborators
///
/// # Example
///
/// ```no_run
/// use linkweave::config::load_config;
/// use linkweave::crawler::{run_crawl, ResumeFrom};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("linkweave.toml"))?;
/// let report = run_crawl(&config, &ResumeFrom::Latest).await?;
/// println!("{} nodes", report.nodes_fetched);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, resume: &ResumeFrom) -> Result<CrawlReport, WeaveError> {
    let mut coordinator = Coordinator::from_config(config, resume)?;
    coordinator.run().await
}
