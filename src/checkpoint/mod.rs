//! Checkpoint module for durable crawl snapshots
//!
//! This module handles:
//! - The `Snapshot` of a full crawl session and its versioned file envelope
//! - Writing numbered checkpoint files without ever overwriting one
//! - Loading and validating checkpoints before a session is resumed

mod manager;
mod snapshot;
mod validation;

pub use manager::CheckpointManager;
pub use snapshot::{Snapshot, FORMAT_VERSION};
pub use validation::validate_snapshot;

use crate::{Address, ResourceId};
use std::path::{Path, PathBuf};
use thiserror::Error;

const FILE_PREFIX: &str = "checkpoint-";
const FILE_SUFFIX: &str = ".json";

/// Reference to a checkpoint file on disk
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CheckpointHandle {
    pub sequence_number: u64,
    pub path: PathBuf,
}

impl CheckpointHandle {
    /// File name used for a given sequence number
    pub fn file_name(sequence_number: u64) -> String {
        format!("{}{:06}{}", FILE_PREFIX, sequence_number, FILE_SUFFIX)
    }

    /// Builds a handle from a path, reading the sequence number from its name
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a file named `checkpoint-<seq>.json`
    ///
    /// # Returns
    ///
    /// * `Ok(CheckpointHandle)` - The name carries a sequence number
    /// * `Err(CheckpointError::UnrecognizedFile)` - The name does not match
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let path = path.into();
        match parse_sequence(&path) {
            Some(sequence_number) => Ok(Self {
                sequence_number,
                path,
            }),
            None => Err(CheckpointError::UnrecognizedFile(path)),
        }
    }
}

fn parse_sequence(path: &Path) -> Option<u64> {
    path.file_name()?
        .to_str()?
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)?
        .parse()
        .ok()
}

/// A checkpoint that decoded but is not safe to resume from
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unsupported checkpoint format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Checksum mismatch: file says {expected}, state hashes to {computed}")]
    ChecksumMismatch { expected: String, computed: String },

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Malformed checkpoint: {0}")]
    Malformed(String),

    #[error("Sequence number {found} does not match file name ({expected})")]
    SequenceMismatch { expected: u64, found: u64 },

    #[error("Id {id} assigned to both {first} and {second}")]
    DuplicateId {
        id: ResourceId,
        first: Address,
        second: Address,
    },

    #[error("Next id {next_id} is not past the highest registered id {max_id}")]
    NextIdBehind {
        next_id: ResourceId,
        max_id: ResourceId,
    },

    #[error("Id {0} is not in the registry")]
    UnregisteredNode(ResourceId),

    #[error("Edge {from} -> {to} points at an unregistered id")]
    DanglingEdge { from: ResourceId, to: ResourceId },

    #[error("Node {id} has address {address} but the registry maps it elsewhere")]
    AddressMismatch { id: ResourceId, address: Address },

    #[error("Id {0} has an edge list but no node record")]
    GraphWithoutNode(ResourceId),
}

impl ValidationError {
    /// Classifies a decode failure, separating missing fields from other damage
    pub(crate) fn from_decode(err: &serde_json::Error) -> Self {
        let message = err.to_string();
        match message.strip_prefix("missing field `") {
            Some(rest) => {
                let field = rest.split('`').next().unwrap_or_default();
                Self::MissingField(field.to_string())
            }
            None => Self::Malformed(message),
        }
    }
}

/// Checkpoint-specific errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize checkpoint: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid checkpoint: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not a checkpoint file: {0}")]
    UnrecognizedFile(PathBuf),

    #[error("No checkpoints found in {0}")]
    NoCheckpoints(PathBuf),
}
