//! URL handling module for Linkweave
//!
//! This module provides address normalization and the well-formedness check
//! used when validating frontier entries restored from a checkpoint.

mod normalize;

use crate::config::ScopeConfig;
use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use normalize::normalize_address;

/// The set of URL schemes an address may use
///
/// An address is well-formed when it parses as an absolute URL, uses one of
/// the allowed schemes and has a non-empty host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressScheme {
    allowed_schemes: Vec<String>,
}

impl AddressScheme {
    /// Creates a scheme accepting the given URL schemes
    pub fn new<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_schemes: schemes
                .into_iter()
                .map(|s| s.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// The default `http`/`https` scheme
    pub fn http() -> Self {
        Self::new(["http", "https"])
    }

    /// Builds the scheme from the `[scope]` configuration section
    pub fn from_scope(scope: &ScopeConfig) -> Self {
        Self::new(scope.allowed_schemes.iter().cloned())
    }

    /// Parses and checks an address
    pub fn check(&self, address: &str) -> UrlResult<Url> {
        let url = Url::parse(address).map_err(|e| UrlError::Parse(e.to_string()))?;

        if !self.allows(url.scheme()) {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(UrlError::MissingHost);
        }

        Ok(url)
    }

    /// Returns true if the address is well-formed under this scheme
    pub fn is_well_formed(&self, address: &str) -> bool {
        self.check(address).is_ok()
    }

    /// Returns true if the given URL scheme is allowed
    pub fn allows(&self, scheme: &str) -> bool {
        self.allowed_schemes.iter().any(|s| s == scheme)
    }
}

impl Default for AddressScheme {
    fn default() -> Self {
        Self::http()
    }
}
