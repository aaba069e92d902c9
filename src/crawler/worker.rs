//! Processing of a single address
//!
//! A worker fetches one address, extracts its links and payload, then
//! commits everything it learned to the session in one step. All I/O happens
//! before the commit; no lock is held across an await point.

use crate::config::CrawlerConfig;
use crate::crawler::collaborators::{Collaborators, FailureCause};
use crate::state::CrawlSession;
use crate::storage::NodeRecord;
use crate::{Address, ResourceId};
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of processing one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResult {
    /// The address was already claimed or visited
    Skipped,

    /// The address became a node
    Fetched {
        id: ResourceId,
        /// Length of the node's edge list
        edges_added: usize,
        /// Referenced addresses pushed onto the frontier
        new_addresses: usize,
    },

    /// The fetch succeeded but the content links nowhere
    Empty,

    /// Fetching or extraction failed; the failure is in the error log
    Failed { address: Address, cause: FailureCause },
}

/// Policy knobs that change what a worker commits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPolicy {
    /// Record link-less pages as nodes with an empty edge list
    pub record_dead_ends: bool,
    /// Keep only the first occurrence of each link target
    pub dedupe_edges: bool,
}

impl Default for WorkerPolicy {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

impl From<&CrawlerConfig> for WorkerPolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            record_dead_ends: config.record_dead_ends,
            dedupe_edges: config.dedupe_edges,
        }
    }
}

/// Processes addresses against a shared session
#[derive(Clone)]
pub struct Worker {
    session: Arc<CrawlSession>,
    collaborators: Collaborators,
    policy: WorkerPolicy,
}

impl Worker {
    pub fn new(session: Arc<CrawlSession>, collaborators: Collaborators, policy: WorkerPolicy) -> Self {
        Self {
            session,
            collaborators,
            policy,
        }
    }

    pub fn session(&self) -> &Arc<CrawlSession> {
        &self.session
    }

    /// Claims and processes `address`
    ///
    /// Returns [`ProcessResult::Skipped`] without fetching if another call
    /// already claimed the address.
    pub async fn process(&self, address: &str) -> ProcessResult {
        if !self.session.visited().try_claim(address) {
            return ProcessResult::Skipped;
        }
        self.process_claimed(address).await
    }

    /// Processes an address the caller has already claimed
    pub async fn process_claimed(&self, address: &str) -> ProcessResult {
        let content = match self.collaborators.fetcher.fetch(address).await {
            Ok(content) => content,
            Err(e) => return self.fail(address, e.into()),
        };

        let mut links = self.collaborators.links.extract_links(&content, address);
        if self.policy.dedupe_edges {
            let mut seen = HashSet::with_capacity(links.len());
            links.retain(|link| seen.insert(link.clone()));
        }

        if links.is_empty() && !self.policy.record_dead_ends {
            tracing::debug!("No links on {}, skipping", address);
            let _gate = self.session.begin_commit();
            self.session.visited().complete(address);
            return ProcessResult::Empty;
        }

        let payload = match self.collaborators.payload.extract_payload(&content) {
            Ok(payload) => payload,
            Err(e) => return self.fail(address, e.into()),
        };

        self.commit(address, links, payload)
    }

    /// Applies every write for a fetched node as one unit
    fn commit(&self, address: &str, links: Vec<Address>, payload: Vec<u8>) -> ProcessResult {
        let session = &self.session;
        let _gate = session.begin_commit();

        let id = session.registry().assign_or_get(address);
        let assigned = session
            .registry()
            .assign_all(links.iter().map(String::as_str));
        let targets: Vec<ResourceId> = assigned.iter().map(|a| a.id).collect();
        let edges_added = targets.len();

        session.graph().set_edges(id, targets);
        session.nodes().insert(
            id,
            NodeRecord {
                address: address.to_string(),
                payload,
            },
        );

        // Addresses registered earlier are already queued, in flight or visited
        let mut new_addresses = 0;
        for (link, assignment) in links.into_iter().zip(assigned) {
            if assignment.is_new {
                session.frontier().push(link);
                new_addresses += 1;
            }
        }

        session.visited().complete(address);

        tracing::debug!(
            "Fetched {} as node {} ({} edges, {} queued)",
            address,
            id,
            edges_added,
            new_addresses
        );

        ProcessResult::Fetched {
            id,
            edges_added,
            new_addresses,
        }
    }

    /// Records a failure against the failing address
    fn fail(&self, address: &str, cause: FailureCause) -> ProcessResult {
        tracing::warn!("Failed to process {}: {}", address, cause);

        let _gate = self.session.begin_commit();
        self.session
            .errors()
            .record(address, cause.kind(), cause.to_string());
        self.session.visited().complete(address);

        ProcessResult::Failed {
            address: address.to_string(),
            cause,
        }
    }
}
