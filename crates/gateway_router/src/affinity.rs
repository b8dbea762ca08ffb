//! Session affinity table.
//!
//! Maps each authenticated account to the node it is pinned to for every
//! service type. Writes (login, logout) are rare and hold the write lock only
//! for a single map insert or remove; relays read on every message.
//!
//! Each account's allocations live behind an `Arc` and are never mutated in
//! place. [`AffinityTable::assign`] builds a complete new map and swaps it in,
//! so a reader sees either the whole old allocation set or the whole new one.

use crate::node::{NodeId, ServiceType};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Per-account allocation set: service type to pinned node.
pub type AllocationMap = HashMap<ServiceType, NodeId>;

/// Outcome of an affinity lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffinityLookup {
    /// The account has no entry at all
    UnknownAccount,
    /// The account has an entry but no node for this service type
    Unassigned,
    /// The account is pinned to this node for the service type
    Assigned(NodeId),
}

impl AffinityLookup {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            AffinityLookup::Assigned(node) => Some(*node),
            _ => None,
        }
    }
}

/// Concurrent account to allocation-set mapping.
#[derive(Debug, Default)]
pub struct AffinityTable {
    entries: RwLock<HashMap<String, Arc<AllocationMap>>>,
}

impl AffinityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the account's entire allocation set.
    ///
    /// Prior allocations are discarded, not merged. Returns the replaced set,
    /// if any.
    pub async fn assign(
        &self,
        account: &str,
        allocations: AllocationMap,
    ) -> Option<Arc<AllocationMap>> {
        let allocations = Arc::new(allocations);
        let count = allocations.len();
        let previous = {
            let mut entries = self.entries.write().await;
            entries.insert(account.to_string(), allocations)
        };
        debug!(account, allocations = count, "affinity assigned");
        previous
    }

    /// Looks up the node an account is pinned to for a service type.
    pub async fn lookup(&self, account: &str, service_type: ServiceType) -> AffinityLookup {
        let entries = self.entries.read().await;
        match entries.get(account) {
            None => AffinityLookup::UnknownAccount,
            Some(allocations) => match allocations.get(&service_type) {
                Some(node) => AffinityLookup::Assigned(*node),
                None => AffinityLookup::Unassigned,
            },
        }
    }

    /// Returns the account's complete allocation set as of this instant.
    pub async fn snapshot(&self, account: &str) -> Option<Arc<AllocationMap>> {
        let entries = self.entries.read().await;
        entries.get(account).cloned()
    }

    /// Drops the account's entry. Removing an absent account is a no-op.
    ///
    /// Returns `true` if an entry was present.
    pub async fn remove(&self, account: &str) -> bool {
        let removed = {
            let mut entries = self.entries.write().await;
            entries.remove(account).is_some()
        };
        if removed {
            debug!(account, "affinity removed");
        }
        removed
    }

    pub async fn contains(&self, account: &str) -> bool {
        self.entries.read().await.contains_key(account)
    }

    /// Number of accounts with an entry.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
