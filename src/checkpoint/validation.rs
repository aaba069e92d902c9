//! Consistency checks applied to every loaded snapshot

use crate::checkpoint::{Snapshot, ValidationError};
use crate::url::AddressScheme;
use crate::ResourceId;
use std::collections::HashMap;

/// Validates a decoded snapshot in place
///
/// Structural problems (duplicate ids, edges or nodes pointing at ids the
/// registry does not know) are fatal. Malformed frontier entries are dropped
/// with a warning; the number dropped is returned.
pub fn validate_snapshot(
    snapshot: &mut Snapshot,
    scheme: &AddressScheme,
) -> Result<usize, ValidationError> {
    let by_id = validate_registry(snapshot)?;
    validate_nodes(snapshot, &by_id)?;
    validate_graph(snapshot, &by_id)?;
    Ok(filter_frontier(snapshot, scheme))
}

/// Checks the registry is injective and the id counter is ahead of it
fn validate_registry(snapshot: &Snapshot) -> Result<HashMap<ResourceId, &str>, ValidationError> {
    let mut by_id: HashMap<ResourceId, &str> = HashMap::with_capacity(snapshot.id_registry.len());

    for (address, &id) in &snapshot.id_registry {
        if let Some(previous) = by_id.insert(id, address.as_str()) {
            return Err(ValidationError::DuplicateId {
                id,
                first: previous.to_string(),
                second: address.clone(),
            });
        }
    }

    if let Some(&max_id) = by_id.keys().max() {
        if snapshot.next_id <= max_id {
            return Err(ValidationError::NextIdBehind {
                next_id: snapshot.next_id,
                max_id,
            });
        }
    }

    Ok(by_id)
}

/// Checks every node is registered under its own address
fn validate_nodes(
    snapshot: &Snapshot,
    by_id: &HashMap<ResourceId, &str>,
) -> Result<(), ValidationError> {
    for (&id, record) in &snapshot.nodes {
        match by_id.get(&id) {
            None => return Err(ValidationError::UnregisteredNode(id)),
            Some(&address) if address != record.address => {
                return Err(ValidationError::AddressMismatch {
                    id,
                    address: record.address.clone(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Checks every edge list belongs to a fetched node and targets registered ids
fn validate_graph(
    snapshot: &Snapshot,
    by_id: &HashMap<ResourceId, &str>,
) -> Result<(), ValidationError> {
    for (&from, targets) in &snapshot.graph {
        if !by_id.contains_key(&from) {
            return Err(ValidationError::UnregisteredNode(from));
        }
        if !snapshot.nodes.contains_key(&from) {
            return Err(ValidationError::GraphWithoutNode(from));
        }
        if let Some(&to) = targets.iter().find(|to| !by_id.contains_key(to)) {
            return Err(ValidationError::DanglingEdge { from, to });
        }
    }
    Ok(())
}

/// Drops frontier entries that are not well-formed addresses
fn filter_frontier(snapshot: &mut Snapshot, scheme: &AddressScheme) -> usize {
    let before = snapshot.frontier.len();
    snapshot.frontier.retain(|address| {
        let keep = scheme.is_well_formed(address);
        if !keep {
            tracing::warn!("Dropping malformed frontier entry: {:?}", address);
        }
        keep
    });
    before - snapshot.frontier.len()
}
