//! Storage traits for the graph and node stores
//!
//! The crawler only talks to these traits, so a backend that flushes to disk
//! can replace the in-memory maps without touching the crawl engine.
//! Implementations provide their own interior synchronization and must be
//! shareable across worker tasks.

use crate::storage::NodeRecord;
use crate::ResourceId;
use std::collections::BTreeMap;

/// Adjacency store: fetched node id -> ordered list of linked ids
pub trait GraphStore: Send + Sync {
    /// Stores the complete edge list of a fetched node
    fn set_edges(&self, id: ResourceId, edges: Vec<ResourceId>);

    /// Returns the edge list of a node, if it has been fetched
    fn edges(&self, id: ResourceId) -> Option<Vec<ResourceId>>;

    /// Returns true if the node owns an edge list
    fn contains(&self, id: ResourceId) -> bool;

    /// Number of nodes owning an edge list
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of edges across all lists
    fn edge_count(&self) -> usize;

    /// Copies the whole adjacency map
    fn snapshot(&self) -> BTreeMap<ResourceId, Vec<ResourceId>>;

    /// Replaces the whole adjacency map
    fn restore(&self, graph: BTreeMap<ResourceId, Vec<ResourceId>>);
}

/// Node store: id -> fetched address and payload
pub trait NodeStore: Send + Sync {
    /// Stores a complete node record
    fn insert(&self, id: ResourceId, record: NodeRecord);

    /// Returns the record of a fetched node
    fn get(&self, id: ResourceId) -> Option<NodeRecord>;

    fn contains(&self, id: ResourceId) -> bool;

    /// Number of fetched nodes
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies every node record
    fn snapshot(&self) -> BTreeMap<ResourceId, NodeRecord>;

    /// Replaces every node record
    fn restore(&self, nodes: BTreeMap<ResourceId, NodeRecord>);
}
