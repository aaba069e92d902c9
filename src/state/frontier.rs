//! FIFO work queue of addresses awaiting processing

use crate::state::lock;
use crate::Address;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Ordered queue of addresses waiting to be fetched
///
/// An address may be queued more than once; the visited set decides whether
/// it is actually fetched.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: Mutex<VecDeque<Address>>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier holding the given addresses in order
    pub fn from_addresses(addresses: Vec<Address>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::from(addresses)),
        }
    }

    /// Appends an address to the tail
    pub fn push(&self, address: Address) {
        lock(&self.queue).push_back(address);
    }

    /// Appends several addresses to the tail, keeping their order
    pub fn push_many<I>(&self, addresses: I)
    where
        I: IntoIterator<Item = Address>,
    {
        lock(&self.queue).extend(addresses);
    }

    /// Removes and returns the head, or `None` when empty
    pub fn pop(&self) -> Option<Address> {
        lock(&self.queue).pop_front()
    }

    /// Returns the number of queued addresses
    pub fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        lock(&self.queue).is_empty()
    }

    /// Copies the queue in order
    pub fn snapshot(&self) -> Vec<Address> {
        lock(&self.queue).iter().cloned().collect()
    }
}
