//! Identifier registry assigning stable ids to addresses

use crate::state::lock;
use crate::{Address, ResourceId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct RegistryInner {
    ids: HashMap<Address, ResourceId>,
    next_id: ResourceId,
}

impl RegistryInner {
    fn assign(&mut self, address: &str) -> Assignment {
        if let Some(&id) = self.ids.get(address) {
            return Assignment { id, is_new: false };
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(address.to_string(), id);
        Assignment { id, is_new: true }
    }
}

/// An id handed out by [`IdRegistry::assign_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub id: ResourceId,
    /// True if this call allocated the id
    pub is_new: bool,
}

/// Assigns a monotonic integer id to every distinct address
///
/// Ids are handed out in first-seen order starting at 0. The lookup and the
/// allocation happen under one lock, so two workers racing on the same
/// unseen address always receive the same id.
#[derive(Debug, Default)]
pub struct IdRegistry {
    inner: Mutex<RegistryInner>,
}

impl IdRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a registry from a checkpointed mapping
    pub fn restore(ids: BTreeMap<Address, ResourceId>, next_id: ResourceId) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                ids: ids.into_iter().collect(),
                next_id,
            }),
        }
    }

    /// Returns the id of `address`, allocating the next one if unseen
    pub fn assign_or_get(&self, address: &str) -> ResourceId {
        lock(&self.inner).assign(address).id
    }

    /// Assigns ids to a batch of addresses under a single lock
    ///
    /// Unseen addresses in the batch receive consecutive ids in iteration order.
    /// An address repeated within the batch is new only at its first position.
    pub fn assign_all<'a, I>(&self, addresses: I) -> Vec<Assignment>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut inner = lock(&self.inner);
        addresses
            .into_iter()
            .map(|address| inner.assign(address))
            .collect()
    }

    /// Returns the id of `address` without allocating
    pub fn get(&self, address: &str) -> Option<ResourceId> {
        lock(&self.inner).ids.get(address).copied()
    }

    /// Number of registered addresses
    pub fn len(&self) -> usize {
        lock(&self.inner).ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The id the next unseen address will receive
    pub fn next_id(&self) -> ResourceId {
        lock(&self.inner).next_id
    }

    /// Copies the mapping and the id counter
    pub fn snapshot(&self) -> (BTreeMap<Address, ResourceId>, ResourceId) {
        let inner = lock(&self.inner);
        let ids = inner
            .ids
            .iter()
            .map(|(address, id)| (address.clone(), *id))
            .collect();
        (ids, inner.next_id)
    }
}
