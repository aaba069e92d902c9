//! Storage module for the graph and node stores
//!
//! This module holds:
//! - The `GraphStore` and `NodeStore` traits the crawler writes through
//! - In-memory implementations used by default
//! - The `NodeRecord` persisted for every fetched resource

mod memory;
mod traits;

pub use memory::{MemoryGraphStore, MemoryNodeStore};
pub use traits::{GraphStore, NodeStore};

use crate::Address;
use serde::{Deserialize, Serialize};

/// A fetched resource: its address and the extracted payload
///
/// The payload is hex-encoded when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub address: Address,
    #[serde(with = "hex")]
    pub payload: Vec<u8>,
}

impl NodeRecord {
    /// Returns the payload as text if it is valid UTF-8
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}
