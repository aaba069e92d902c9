//! Statistics generation from a crawl snapshot
//!
//! This module provides functionality for summarizing and displaying a
//! checkpoint, used by `--inspect`.

use crate::checkpoint::Snapshot;
use crate::state::FailureKind;
use crate::{Address, ResourceId};
use std::collections::BTreeMap;

/// How many of the most-linking nodes to keep
const TOP_NODES: usize = 10;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStatistics {
    pub seed_address: Address,

    /// Nodes fetched (present in the node store)
    pub nodes: usize,

    /// Total entries across all edge lists
    pub edges: usize,

    /// Distinct addresses that received an id
    pub registered_ids: usize,

    /// Registered addresses that were never fetched
    pub unfetched_ids: usize,

    /// Addresses waiting in the frontier
    pub frontier_pending: usize,

    /// Addresses whose processing completed
    pub visited: usize,

    /// Error counts per failure kind
    pub errors_by_kind: BTreeMap<FailureKind, usize>,

    /// Nodes with the longest edge lists, longest first
    pub top_out_degree: Vec<(ResourceId, Address, usize)>,
}

impl SnapshotStatistics {
    /// Computes statistics for a snapshot
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut errors_by_kind = BTreeMap::new();
        for record in snapshot.errors.values() {
            *errors_by_kind.entry(record.kind).or_insert(0) += 1;
        }

        let mut top_out_degree: Vec<(ResourceId, Address, usize)> = snapshot
            .graph
            .iter()
            .map(|(&id, targets)| {
                let address = snapshot
                    .nodes
                    .get(&id)
                    .map(|n| n.address.clone())
                    .unwrap_or_default();
                (id, address, targets.len())
            })
            .collect();
        // Ties broken by id so output is stable
        top_out_degree.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
        top_out_degree.truncate(TOP_NODES);

        Self {
            seed_address: snapshot.seed_address.clone(),
            nodes: snapshot.node_count(),
            edges: snapshot.edge_count(),
            registered_ids: snapshot.id_registry.len(),
            unfetched_ids: snapshot.id_registry.len().saturating_sub(snapshot.node_count()),
            frontier_pending: snapshot.frontier.len(),
            visited: snapshot.visited.len(),
            errors_by_kind,
            top_out_degree,
        }
    }

    pub fn total_errors(&self) -> usize {
        self.errors_by_kind.values().sum()
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &SnapshotStatistics) {
    println!("=== Checkpoint Statistics ===\n");

    println!("Overview:");
    println!("  Seed: {}", stats.seed_address);
    println!("  Nodes fetched: {}", stats.nodes);
    println!("  Edges: {}", stats.edges);
    println!(
        "  Registered ids: {} ({} not fetched)",
        stats.registered_ids, stats.unfetched_ids
    );
    println!("  Visited: {}", stats.visited);
    println!("  Frontier pending: {}", stats.frontier_pending);
    println!();

    if !stats.errors_by_kind.is_empty() {
        println!("Error Summary ({}):", stats.total_errors());
        for (kind, count) in &stats.errors_by_kind {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    if !stats.top_out_degree.is_empty() {
        println!("Top Nodes by Out-Degree:");
        for (id, address, degree) in &stats.top_out_degree {
            println!("  #{} {} ({} links)", id, address, degree);
        }
    }
}
