//! Snapshot of the full crawl state and its on-disk envelope

use crate::state::ErrorRecord;
use crate::storage::NodeRecord;
use crate::{Address, ResourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// Version of the checkpoint file layout
pub const FORMAT_VERSION: u32 = 1;

/// Complete, self-consistent copy of a crawl session
///
/// Every field is required when deserializing; a checkpoint missing any of
/// them is rejected rather than partially recovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub seed_address: Address,
    pub graph: BTreeMap<ResourceId, Vec<ResourceId>>,
    pub nodes: BTreeMap<ResourceId, NodeRecord>,
    pub errors: BTreeMap<Address, ErrorRecord>,
    pub frontier: Vec<Address>,
    pub visited: BTreeSet<Address>,
    pub id_registry: BTreeMap<Address, ResourceId>,
    pub next_id: ResourceId,
}

impl Snapshot {
    /// Hex-encoded SHA-256 of the canonical JSON encoding
    pub fn checksum(&self) -> Result<String, serde_json::Error> {
        let encoded = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&encoded)))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.values().map(Vec::len).sum()
    }
}

/// Borrowed envelope written to disk
#[derive(Debug, Serialize)]
pub(crate) struct CheckpointFileRef<'a> {
    pub format_version: u32,
    pub sequence_number: u64,
    pub created_at: DateTime<Utc>,
    pub checksum: String,
    pub state: &'a Snapshot,
}

/// Envelope fields read before the state body is decoded
#[derive(Debug, Deserialize)]
pub(crate) struct CheckpointHeader {
    pub format_version: u32,
    pub sequence_number: u64,
}

/// Fully decoded envelope
#[derive(Debug, Deserialize)]
pub(crate) struct CheckpointFile {
    pub sequence_number: u64,
    pub created_at: DateTime<Utc>,
    pub checksum: String,
    pub state: Snapshot,
}
