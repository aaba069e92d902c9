//! Capabilities the crawl engine depends on
//!
//! The engine never talks to the network or parses content itself. It asks a
//! [`Fetcher`] for content, a [`LinkExtractor`] for outbound addresses and a
//! [`PayloadExtractor`] for the data stored with each node.

use crate::state::FailureKind;
use crate::Address;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure to retrieve a resource
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request to {address} timed out")]
    Timeout { address: Address },

    #[error("Request to {address} returned status {status}")]
    Status { address: Address, status: u16 },

    #[error("Request to {address} failed: {message}")]
    Network { address: Address, message: String },
}

/// Failure to extract a payload from fetched content
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("No structured data block found")]
    MissingBlock,

    #[error("Malformed content: {0}")]
    Malformed(String),
}

/// Retrieves the content behind an address
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, address: &str) -> Result<String, FetchError>;
}

/// Extracts outbound addresses from content
///
/// Returned addresses are absolute and canonical, in document order.
/// Extraction never fails; unusable links are left out.
pub trait LinkExtractor: Send + Sync {
    fn extract_links(&self, content: &str, base: &str) -> Vec<Address>;
}

/// Extracts the payload stored with a fetched node
pub trait PayloadExtractor: Send + Sync {
    fn extract_payload(&self, content: &str) -> Result<Vec<u8>, ExtractError>;
}

/// Shared handles to the three collaborators
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub links: Arc<dyn LinkExtractor>,
    pub payload: Arc<dyn PayloadExtractor>,
}

impl Collaborators {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        links: Arc<dyn LinkExtractor>,
        payload: Arc<dyn PayloadExtractor>,
    ) -> Self {
        Self {
            fetcher,
            links,
            payload,
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Why processing an address failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FailureCause {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl FailureCause {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Fetch(_) => FailureKind::Fetch,
            Self::Extract(_) => FailureKind::Extract,
        }
    }
}
