//! Numbered checkpoint files in a single directory

use crate::checkpoint::snapshot::{CheckpointFile, CheckpointFileRef, CheckpointHeader};
use crate::checkpoint::{
    validate_snapshot, CheckpointError, CheckpointHandle, Snapshot, ValidationError,
    FORMAT_VERSION,
};
use crate::url::AddressScheme;
use chrono::Utc;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes and reads checkpoints in one directory
///
/// Sequence numbers only grow. A new manager continues after the highest
/// checkpoint already in the directory, so files from earlier runs are
/// never overwritten.
#[derive(Debug)]
pub struct CheckpointManager {
    directory: PathBuf,
    scheme: AddressScheme,
    next_sequence: u64,
}

impl CheckpointManager {
    /// Opens (creating if needed) a checkpoint directory
    ///
    /// # Arguments
    ///
    /// * `directory` - Directory holding `checkpoint-<seq>.json` files
    /// * `scheme` - Address scheme frontier entries are validated against
    pub fn new(directory: impl Into<PathBuf>, scheme: AddressScheme) -> Result<Self, CheckpointError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;

        let mut manager = Self {
            directory,
            scheme,
            next_sequence: 1,
        };
        if let Some(latest) = manager.latest()? {
            manager.ensure_after(latest.sequence_number);
        }

        tracing::debug!(
            "Checkpoint directory {} (next sequence {})",
            manager.directory.display(),
            manager.next_sequence
        );
        Ok(manager)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Sequence number the next `save` will use
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Makes sure future saves are numbered after `sequence_number`
    pub fn ensure_after(&mut self, sequence_number: u64) {
        self.next_sequence = self.next_sequence.max(sequence_number + 1);
    }

    /// Writes a snapshot as the next numbered checkpoint
    ///
    /// The file is written under a temporary name, synced, then renamed into
    /// place, so a crash never leaves a truncated checkpoint behind.
    pub fn save(&mut self, snapshot: &Snapshot) -> Result<CheckpointHandle, CheckpointError> {
        let mut sequence_number = self.next_sequence;
        let mut path = self.path_for(sequence_number);
        while path.exists() {
            sequence_number += 1;
            path = self.path_for(sequence_number);
        }

        let envelope = CheckpointFileRef {
            format_version: FORMAT_VERSION,
            sequence_number,
            created_at: Utc::now(),
            checksum: snapshot.checksum()?,
            state: snapshot,
        };

        let tmp_path = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, &envelope)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;

        self.next_sequence = sequence_number + 1;

        tracing::info!(
            "Checkpoint {} written: {} nodes, {} frontier entries",
            sequence_number,
            snapshot.node_count(),
            snapshot.frontier.len()
        );

        Ok(CheckpointHandle {
            sequence_number,
            path,
        })
    }

    /// Reads and validates one checkpoint
    ///
    /// # Returns
    ///
    /// * `Ok(Snapshot)` - The checkpoint is intact and consistent
    /// * `Err(CheckpointError::Validation)` - Wrong version, bad checksum,
    ///   missing fields or inconsistent ids
    pub fn load(&self, handle: &CheckpointHandle) -> Result<Snapshot, CheckpointError> {
        let bytes = fs::read(&handle.path)?;

        let header: CheckpointHeader =
            serde_json::from_slice(&bytes).map_err(|e| ValidationError::from_decode(&e))?;
        if header.format_version != FORMAT_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: header.format_version,
                expected: FORMAT_VERSION,
            }
            .into());
        }

        let file: CheckpointFile =
            serde_json::from_slice(&bytes).map_err(|e| ValidationError::from_decode(&e))?;

        let computed = file.state.checksum()?;
        if computed != file.checksum {
            return Err(ValidationError::ChecksumMismatch {
                expected: file.checksum,
                computed,
            }
            .into());
        }

        if file.sequence_number != handle.sequence_number {
            return Err(ValidationError::SequenceMismatch {
                expected: handle.sequence_number,
                found: file.sequence_number,
            }
            .into());
        }

        let mut snapshot = file.state;
        let dropped = validate_snapshot(&mut snapshot, &self.scheme)?;
        if dropped > 0 {
            tracing::warn!(
                "Checkpoint {}: dropped {} malformed frontier entries",
                handle.sequence_number,
                dropped
            );
        }

        tracing::debug!(
            "Loaded checkpoint {} (created {})",
            handle.sequence_number,
            file.created_at.to_rfc3339()
        );
        Ok(snapshot)
    }

    /// All checkpoints in the directory, oldest first
    pub fn list(&self) -> Result<Vec<CheckpointHandle>, CheckpointError> {
        let mut handles = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Ok(handle) = CheckpointHandle::from_path(entry.path()) {
                handles.push(handle);
            }
        }
        handles.sort();
        Ok(handles)
    }

    /// The highest-numbered checkpoint, if any
    pub fn latest(&self) -> Result<Option<CheckpointHandle>, CheckpointError> {
        Ok(self.list()?.pop())
    }

    /// Loads the newest checkpoint that passes validation
    ///
    /// Invalid checkpoints are skipped with a warning. If none is valid, the
    /// error from the newest one is returned.
    pub fn load_latest(&self) -> Result<(CheckpointHandle, Snapshot), CheckpointError> {
        let handles = self.list()?;
        let mut newest_error = None;

        for handle in handles.into_iter().rev() {
            match self.load(&handle) {
                Ok(snapshot) => return Ok((handle, snapshot)),
                Err(e) => {
                    tracing::warn!(
                        "Skipping checkpoint {}: {}",
                        handle.path.display(),
                        e
                    );
                    newest_error.get_or_insert(e);
                }
            }
        }

        Err(newest_error.unwrap_or_else(|| CheckpointError::NoCheckpoints(self.directory.clone())))
    }

    fn path_for(&self, sequence_number: u64) -> PathBuf {
        self.directory
            .join(CheckpointHandle::file_name(sequence_number))
    }
}
