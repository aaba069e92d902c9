//! Visited set with atomic claim-before-fetch

use crate::state::lock;
use crate::Address;
use std::collections::{BTreeSet, HashSet};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct VisitedInner {
    completed: HashSet<Address>,
    in_flight: HashSet<Address>,
}

/// Tracks which addresses have been claimed for processing
///
/// An address moves from unseen to in-flight through [`try_claim`], which
/// tests membership and claims in one critical section, and from in-flight
/// to completed through [`complete`]. Only completed addresses are written
/// to checkpoints; in-flight ones are re-queued there.
///
/// [`try_claim`]: VisitedSet::try_claim
/// [`complete`]: VisitedSet::complete
#[derive(Debug, Default)]
pub struct VisitedSet {
    inner: Mutex<VisitedInner>,
}

impl VisitedSet {
    /// Creates an empty visited set
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the completed addresses from a checkpoint
    pub fn restore<I>(completed: I) -> Self
    where
        I: IntoIterator<Item = Address>,
    {
        Self {
            inner: Mutex::new(VisitedInner {
                completed: completed.into_iter().collect(),
                in_flight: HashSet::new(),
            }),
        }
    }

    /// Claims `address` for processing
    ///
    /// Returns false if the address is already in flight or completed.
    pub fn try_claim(&self, address: &str) -> bool {
        let mut inner = lock(&self.inner);
        if inner.completed.contains(address) || inner.in_flight.contains(address) {
            return false;
        }
        inner.in_flight.insert(address.to_string());
        true
    }

    /// Marks a claimed address as completed (successfully or not)
    pub fn complete(&self, address: &str) {
        let mut inner = lock(&self.inner);
        inner.in_flight.remove(address);
        inner.completed.insert(address.to_string());
    }

    /// Returns true if the address is claimed or completed
    pub fn contains(&self, address: &str) -> bool {
        let inner = lock(&self.inner);
        inner.completed.contains(address) || inner.in_flight.contains(address)
    }

    /// Returns true if processing of the address has completed
    pub fn is_completed(&self, address: &str) -> bool {
        lock(&self.inner).completed.contains(address)
    }

    /// Number of completed addresses
    pub fn completed_len(&self) -> usize {
        lock(&self.inner).completed.len()
    }

    /// Number of claimed but not completed addresses
    pub fn in_flight_len(&self) -> usize {
        lock(&self.inner).in_flight.len()
    }

    /// Returns the completed set and the sorted in-flight addresses
    pub fn snapshot(&self) -> (BTreeSet<Address>, Vec<Address>) {
        let inner = lock(&self.inner);
        let completed = inner.completed.iter().cloned().collect();
        let mut in_flight: Vec<Address> = inner.in_flight.iter().cloned().collect();
        in_flight.sort();
        (completed, in_flight)
    }
}
