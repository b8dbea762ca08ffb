//! In-memory implementations of the external capabilities.
//!
//! These back the crate's own tests and are usable by embedders that want a
//! gateway without real infrastructure (local development, integration
//! harnesses). They keep everything in process and record what they were
//! asked to deliver.

use crate::auth::{TokenRecord, TokenStore};
use crate::client::{ClientTransport, RoleDirectory};
use crate::error::StoreError;
use crate::node::{NodeId, NodeRegistry, ServiceType};
use crate::relay::RelayEnvelope;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct NodeState {
    live: bool,
    fail_sends: bool,
}

/// Node registry backed by a `DashMap`.
///
/// `any_live_node` rotates through the live nodes of a service type in
/// identifier order.
#[derive(Debug, Default)]
pub struct InMemoryNodeRegistry {
    nodes: DashMap<NodeId, NodeState>,
    cursor: AtomicUsize,
    send_attempts: AtomicUsize,
    sent: Mutex<Vec<(NodeId, u64, RelayEnvelope)>>,
}

impl InMemoryNodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, or brings a known node back up.
    pub fn register(&self, node: NodeId) {
        self.nodes
            .entry(node)
            .and_modify(|state| state.live = true)
            .or_insert(NodeState {
                live: true,
                fail_sends: false,
            });
        debug!(%node, "node registered");
    }

    pub fn deregister(&self, node: &NodeId) {
        self.nodes.remove(node);
    }

    /// Keeps the node known but reports it as not live.
    pub fn mark_down(&self, node: &NodeId) {
        if let Some(mut state) = self.nodes.get_mut(node) {
            state.live = false;
        }
    }

    /// Makes every send to the node report failure.
    pub fn set_send_failure(&self, node: &NodeId, fail: bool) {
        if let Some(mut state) = self.nodes.get_mut(node) {
            state.fail_sends = fail;
        }
    }

    /// Envelopes delivered so far, in delivery order.
    pub async fn sent_messages(&self) -> Vec<(NodeId, u64, RelayEnvelope)> {
        self.sent.lock().await.clone()
    }

    /// Number of `send` calls, successful or not.
    pub fn send_attempts(&self) -> usize {
        self.send_attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl NodeRegistry for InMemoryNodeRegistry {
    fn is_live(&self, node: &NodeId) -> bool {
        self.nodes.get(node).map(|state| state.live).unwrap_or(false)
    }

    fn any_live_node(&self, service_type: ServiceType) -> Option<NodeId> {
        let mut live: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|entry| entry.key().service_type() == service_type && entry.value().live)
            .map(|entry| *entry.key())
            .collect();
        if live.is_empty() {
            return None;
        }
        live.sort();
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % live.len();
        Some(live[index])
    }

    async fn send(&self, node: &NodeId, cmd: u64, envelope: &RelayEnvelope) -> bool {
        self.send_attempts.fetch_add(1, Ordering::Relaxed);
        let deliverable = self
            .nodes
            .get(node)
            .map(|state| state.live && !state.fail_sends)
            .unwrap_or(false);
        if deliverable {
            self.sent.lock().await.push((*node, cmd, envelope.clone()));
        }
        deliverable
    }
}

/// Token store backed by a `DashMap`.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    records: DashMap<String, TokenRecord>,
    unavailable: AtomicBool,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, account: impl Into<String>, record: TokenRecord) {
        self.records.insert(account.into(), record);
    }

    pub fn remove(&self, account: &str) {
        self.records.remove(account);
    }

    /// Makes every load fail as if the backing store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self, account: &str) -> Result<TokenRecord, StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("in-memory store disabled".to_string()));
        }
        self.records
            .get(account)
            .map(|record| record.value().clone())
            .ok_or_else(|| StoreError::NotFound(account.to_string()))
    }
}

/// Client transport that records every frame it is given.
///
/// Single sends succeed only for connected accounts. Broadcasts are
/// recorded with `None` as the account.
#[derive(Debug, Default)]
pub struct RecordingClientTransport {
    connected: RwLock<HashSet<String>>,
    sent: Mutex<Vec<(Option<String>, u64, Vec<u8>)>>,
    fail_broadcast: AtomicBool,
}

impl RecordingClientTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connect(&self, account: impl Into<String>) {
        self.connected.write().await.insert(account.into());
    }

    pub async fn disconnect(&self, account: &str) {
        self.connected.write().await.remove(account);
    }

    pub fn set_broadcast_failure(&self, fail: bool) {
        self.fail_broadcast.store(fail, Ordering::Relaxed);
    }

    pub async fn sent(&self) -> Vec<(Option<String>, u64, Vec<u8>)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ClientTransport for RecordingClientTransport {
    async fn send_to_client(&self, account: &str, cmd: u64, data: Vec<u8>) -> bool {
        if !self.connected.read().await.contains(account) {
            return false;
        }
        self.sent.lock().await.push((Some(account.to_string()), cmd, data));
        true
    }

    async fn broadcast_to_clients(&self, cmd: u64, data: Vec<u8>) -> bool {
        if self.fail_broadcast.load(Ordering::Relaxed) {
            return false;
        }
        self.sent.lock().await.push((None, cmd, data));
        true
    }
}

/// Role directory backed by a `DashMap`.
#[derive(Debug, Default)]
pub struct InMemoryRoleDirectory {
    roles: DashMap<String, String>,
}

impl InMemoryRoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, role_name: impl Into<String>, account: impl Into<String>) {
        self.roles.insert(role_name.into(), account.into());
    }

    pub fn remove(&self, role_name: &str) {
        self.roles.remove(role_name);
    }
}

#[async_trait]
impl RoleDirectory for InMemoryRoleDirectory {
    async fn account_for_role(&self, role_name: &str) -> Option<String> {
        self.roles.get(role_name).map(|account| account.value().clone())
    }
}
