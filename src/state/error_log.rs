//! Error log keyed by the failing address

use crate::state::lock;
use crate::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

/// Which stage of processing failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The fetcher could not retrieve the resource
    Fetch,
    /// The payload could not be extracted from the content
    Extract,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Extract => "extract",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded processing failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: FailureKind,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

/// Mapping from a failing address to the failure encountered
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Mutex<BTreeMap<Address, ErrorRecord>>,
}

impl ErrorLog {
    /// Creates an empty error log
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the log from a checkpoint
    pub fn restore(entries: BTreeMap<Address, ErrorRecord>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Records a failure for `address`
    ///
    /// Entries for other addresses are never touched.
    pub fn record(&self, address: &str, kind: FailureKind, message: impl Into<String>) {
        let record = ErrorRecord {
            kind,
            message: message.into(),
            recorded_at: Utc::now(),
        };
        lock(&self.entries).insert(address.to_string(), record);
    }

    /// Returns the failure recorded for `address`
    pub fn get(&self, address: &str) -> Option<ErrorRecord> {
        lock(&self.entries).get(address).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Copies all entries
    pub fn snapshot(&self) -> BTreeMap<Address, ErrorRecord> {
        lock(&self.entries).clone()
    }
}
