//! In-memory storage backends

use crate::state::lock;
use crate::storage::traits::{GraphStore, NodeStore};
use crate::storage::NodeRecord;
use crate::ResourceId;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Mutex-guarded adjacency map
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    edges: Mutex<BTreeMap<ResourceId, Vec<ResourceId>>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphStore for MemoryGraphStore {
    fn set_edges(&self, id: ResourceId, edges: Vec<ResourceId>) {
        lock(&self.edges).insert(id, edges);
    }

    fn edges(&self, id: ResourceId) -> Option<Vec<ResourceId>> {
        lock(&self.edges).get(&id).cloned()
    }

    fn contains(&self, id: ResourceId) -> bool {
        lock(&self.edges).contains_key(&id)
    }

    fn len(&self) -> usize {
        lock(&self.edges).len()
    }

    fn edge_count(&self) -> usize {
        lock(&self.edges).values().map(Vec::len).sum()
    }

    fn snapshot(&self) -> BTreeMap<ResourceId, Vec<ResourceId>> {
        lock(&self.edges).clone()
    }

    fn restore(&self, graph: BTreeMap<ResourceId, Vec<ResourceId>>) {
        *lock(&self.edges) = graph;
    }
}

/// Mutex-guarded node map
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    nodes: Mutex<BTreeMap<ResourceId, NodeRecord>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeStore for MemoryNodeStore {
    fn insert(&self, id: ResourceId, record: NodeRecord) {
        lock(&self.nodes).insert(id, record);
    }

    fn get(&self, id: ResourceId) -> Option<NodeRecord> {
        lock(&self.nodes).get(&id).cloned()
    }

    fn contains(&self, id: ResourceId) -> bool {
        lock(&self.nodes).contains_key(&id)
    }

    fn len(&self) -> usize {
        lock(&self.nodes).len()
    }

    fn snapshot(&self) -> BTreeMap<ResourceId, NodeRecord> {
        lock(&self.nodes).clone()
    }

    fn restore(&self, nodes: BTreeMap<ResourceId, NodeRecord>) {
        *lock(&self.nodes) = nodes;
    }
}
