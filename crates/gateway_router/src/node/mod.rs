//! Backend node identity and the node registry boundary.
//!
//! The gateway never tracks node health itself. Liveness, selection among
//! equally eligible nodes, and delivery are all owned by whatever implements
//! [`NodeRegistry`]; this module only fixes the shape of that capability and
//! the identifiers that flow through it.

pub mod resolver;

pub use resolver::{NodeResolver, Route, StaleAffinityPolicy};

use crate::relay::RelayEnvelope;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend category, e.g. login, world or chat.
///
/// Which values are routable is decided by [`crate::namespace::ServiceTypeBounds`].
pub type ServiceType = u32;

/// Concrete address of one backend process.
///
/// A node identifier pairs the service type with an instance discriminator
/// and is immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    service_type: ServiceType,
    instance: u32,
}

impl NodeId {
    /// Creates a node identifier from its parts.
    pub const fn new(service_type: ServiceType, instance: u32) -> Self {
        Self {
            service_type,
            instance,
        }
    }

    /// Converts a raw allocation descriptor from a token record into a node
    /// identifier.
    ///
    /// Allocation records store the server id that was handed out for a
    /// service type; that server id is the instance discriminator.
    pub const fn from_allocation(service_type: ServiceType, server_id: u32) -> Self {
        Self::new(service_type, server_id)
    }

    pub const fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub const fn instance(&self) -> u32 {
        self.instance
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.service_type, self.instance)
    }
}

/// Registry of live backend nodes.
///
/// Implementations are shared across every connection task and must be safe
/// for concurrent use. The lookup methods are expected to be fast in-memory
/// operations; `send` may suspend on the node's outbound queue.
#[async_trait]
pub trait NodeRegistry: Send + Sync + fmt::Debug {
    /// Whether the given node is currently live.
    fn is_live(&self, node: &NodeId) -> bool;

    /// Any one currently live node of the service type, if there is one.
    ///
    /// No ordering is promised among equally eligible nodes.
    fn any_live_node(&self, service_type: ServiceType) -> Option<NodeId>;

    /// Delivers a relay envelope to a node under the given internal command.
    ///
    /// Returns `false` if the node is unreachable or its queue is full.
    async fn send(&self, node: &NodeId, cmd: u64, envelope: &RelayEnvelope) -> bool;
}
