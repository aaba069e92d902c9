//! Shared mutable state of one crawl session

use crate::checkpoint::Snapshot;
use crate::state::{ErrorLog, Frontier, IdRegistry, VisitedSet};
use crate::storage::{GraphStore, MemoryGraphStore, MemoryNodeStore, NodeStore};
use crate::Address;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// Everything a crawl mutates, shared between the coordinator and workers
///
/// Each structure guards itself. The commit gate is held shared by every
/// worker while it applies the in-memory writes for one address, and held
/// exclusively while a snapshot is taken, so snapshots never observe a
/// half-committed node.
pub struct CrawlSession {
    seed_address: Address,
    registry: IdRegistry,
    graph: Arc<dyn GraphStore>,
    nodes: Arc<dyn NodeStore>,
    frontier: Frontier,
    visited: VisitedSet,
    errors: ErrorLog,
    commit_gate: RwLock<()>,
}

impl CrawlSession {
    /// Starts a fresh session with the seed as the only frontier entry
    pub fn fresh(seed_address: impl Into<Address>) -> Self {
        Self::with_stores(
            seed_address,
            Arc::new(MemoryGraphStore::new()),
            Arc::new(MemoryNodeStore::new()),
        )
    }

    /// Starts a fresh session writing into the given stores
    pub fn with_stores(
        seed_address: impl Into<Address>,
        graph: Arc<dyn GraphStore>,
        nodes: Arc<dyn NodeStore>,
    ) -> Self {
        let seed_address = seed_address.into();
        let registry = IdRegistry::new();
        registry.assign_or_get(&seed_address);

        Self {
            frontier: Frontier::from_addresses(vec![seed_address.clone()]),
            seed_address,
            registry,
            graph,
            nodes,
            visited: VisitedSet::new(),
            errors: ErrorLog::new(),
            commit_gate: RwLock::new(()),
        }
    }

    /// Rebuilds a session from a validated snapshot
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let graph = Arc::new(MemoryGraphStore::new());
        let nodes = Arc::new(MemoryNodeStore::new());
        Self::from_snapshot_with_stores(snapshot, graph, nodes)
    }

    /// Rebuilds a session from a snapshot into the given stores
    pub fn from_snapshot_with_stores(
        snapshot: Snapshot,
        graph: Arc<dyn GraphStore>,
        nodes: Arc<dyn NodeStore>,
    ) -> Self {
        graph.restore(snapshot.graph);
        nodes.restore(snapshot.nodes);

        Self {
            seed_address: snapshot.seed_address,
            registry: IdRegistry::restore(snapshot.id_registry, snapshot.next_id),
            graph,
            nodes,
            frontier: Frontier::from_addresses(snapshot.frontier),
            visited: VisitedSet::restore(snapshot.visited),
            errors: ErrorLog::restore(snapshot.errors),
            commit_gate: RwLock::new(()),
        }
    }

    /// Captures a consistent copy of the whole session
    ///
    /// Addresses claimed by a worker that has not committed yet are put at
    /// the front of the captured frontier so a resumed crawl fetches them.
    pub fn snapshot(&self) -> Snapshot {
        let _gate = self
            .commit_gate
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let (visited, in_flight) = self.visited.snapshot();
        let mut frontier = in_flight;
        frontier.extend(self.frontier.snapshot());
        let (id_registry, next_id) = self.registry.snapshot();

        Snapshot {
            seed_address: self.seed_address.clone(),
            graph: self.graph.snapshot(),
            nodes: self.nodes.snapshot(),
            errors: self.errors.snapshot(),
            frontier,
            visited,
            id_registry,
            next_id,
        }
    }

    /// Enters the shared side of the commit gate
    pub(crate) fn begin_commit(&self) -> RwLockReadGuard<'_, ()> {
        self.commit_gate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed_address(&self) -> &str {
        &self.seed_address
    }

    pub fn registry(&self) -> &IdRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &dyn GraphStore {
        self.graph.as_ref()
    }

    pub fn nodes(&self) -> &dyn NodeStore {
        self.nodes.as_ref()
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    /// Number of fetched nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
