//! Node target resolution.
//!
//! Sticky routing first: if the account is pinned to a node for the service
//! type and the registry still reports that node live, traffic stays on it.
//! Otherwise any live node of the service type is used.

use super::{NodeId, NodeRegistry, ServiceType};
use crate::affinity::{AffinityLookup, AffinityTable};
use crate::error::RouteMiss;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// What to do when an account's sticky node is no longer live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleAffinityPolicy {
    /// Treat it as a routing miss; the backend session state lives on the
    /// dead node and must not be silently abandoned.
    #[default]
    Reject,
    /// Fall back to any live node of the same service type.
    Fallback,
}

/// A resolved relay target and how it was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The account's pinned node
    Sticky(NodeId),
    /// A node picked by the registry because no usable pin existed
    Fallback {
        node: NodeId,
        /// `false` when the account had no affinity entry at all
        known_account: bool,
    },
}

impl Route {
    pub fn node(&self) -> NodeId {
        match self {
            Route::Sticky(node) => *node,
            Route::Fallback { node, .. } => *node,
        }
    }
}

/// Resolves `(account, service_type)` to a live node.
#[derive(Debug, Clone)]
pub struct NodeResolver {
    registry: Arc<dyn NodeRegistry>,
    affinity: Arc<AffinityTable>,
    stale_policy: StaleAffinityPolicy,
}

impl NodeResolver {
    pub fn new(
        registry: Arc<dyn NodeRegistry>,
        affinity: Arc<AffinityTable>,
        stale_policy: StaleAffinityPolicy,
    ) -> Self {
        Self {
            registry,
            affinity,
            stale_policy,
        }
    }

    pub async fn resolve(
        &self,
        account: &str,
        service_type: ServiceType,
    ) -> Result<Route, RouteMiss> {
        let known_account = match self.affinity.lookup(account, service_type).await {
            AffinityLookup::Assigned(node) => {
                if self.registry.is_live(&node) {
                    trace!(account, %node, "sticky route");
                    return Ok(Route::Sticky(node));
                }
                if self.stale_policy == StaleAffinityPolicy::Reject {
                    return Err(RouteMiss::StaleAffinity(node));
                }
                trace!(account, %node, "sticky node down, falling back");
                true
            }
            AffinityLookup::Unassigned => true,
            AffinityLookup::UnknownAccount => false,
        };

        let miss = if known_account {
            RouteMiss::NoLiveNode
        } else {
            RouteMiss::UnknownAccount
        };
        self.registry
            .any_live_node(service_type)
            .map(|node| Route::Fallback {
                node,
                known_account,
            })
            .ok_or(miss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::AllocationMap;
    use crate::memory::InMemoryNodeRegistry;

    async fn setup(
        policy: StaleAffinityPolicy,
    ) -> (Arc<InMemoryNodeRegistry>, Arc<AffinityTable>, NodeResolver) {
        let registry = Arc::new(InMemoryNodeRegistry::new());
        let affinity = Arc::new(AffinityTable::new());
        let resolver = NodeResolver::new(registry.clone(), affinity.clone(), policy);
        (registry, affinity, resolver)
    }

    fn pin(service_type: ServiceType, instance: u32) -> AllocationMap {
        AllocationMap::from([(service_type, NodeId::new(service_type, instance))])
    }

    #[tokio::test]
    async fn test_sticky_node_wins_when_live() {
        let (registry, affinity, resolver) = setup(StaleAffinityPolicy::Reject).await;
        registry.register(NodeId::new(2, 1));
        registry.register(NodeId::new(2, 2));
        affinity.assign("alice", pin(2, 2)).await;

        for _ in 0..10 {
            assert_eq!(
                resolver.resolve("alice", 2).await,
                Ok(Route::Sticky(NodeId::new(2, 2)))
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_account_falls_back_to_any_live_node() {
        let (registry, _affinity, resolver) = setup(StaleAffinityPolicy::Reject).await;
        registry.register(NodeId::new(3, 1));

        let route = resolver.resolve("alice", 3).await.unwrap();
        assert_eq!(
            route,
            Route::Fallback {
                node: NodeId::new(3, 1),
                known_account: false
            }
        );
    }

    #[tokio::test]
    async fn test_unassigned_type_falls_back() {
        let (registry, affinity, resolver) = setup(StaleAffinityPolicy::Reject).await;
        registry.register(NodeId::new(4, 1));
        affinity.assign("alice", pin(2, 1)).await;

        let route = resolver.resolve("alice", 4).await.unwrap();
        assert_eq!(
            route,
            Route::Fallback {
                node: NodeId::new(4, 1),
                known_account: true
            }
        );
    }

    #[tokio::test]
    async fn test_no_live_node_is_a_miss() {
        let (registry, affinity, resolver) = setup(StaleAffinityPolicy::Reject).await;
        registry.register(NodeId::new(2, 1));
        affinity.assign("alice", pin(2, 1)).await;

        assert_eq!(resolver.resolve("alice", 3).await, Err(RouteMiss::NoLiveNode));
    }

    #[tokio::test]
    async fn test_unknown_account_miss_is_distinct() {
        let (registry, _affinity, resolver) = setup(StaleAffinityPolicy::Reject).await;
        registry.register(NodeId::new(2, 1));

        assert_eq!(
            resolver.resolve("stranger", 3).await,
            Err(RouteMiss::UnknownAccount)
        );
    }

    #[tokio::test]
    async fn test_stale_sticky_node_rejected_by_default() {
        let (registry, affinity, resolver) = setup(StaleAffinityPolicy::default()).await;
        registry.register(NodeId::new(2, 1));
        registry.register(NodeId::new(2, 2));
        registry.mark_down(&NodeId::new(2, 1));
        affinity.assign("alice", pin(2, 1)).await;

        assert_eq!(
            resolver.resolve("alice", 2).await,
            Err(RouteMiss::StaleAffinity(NodeId::new(2, 1)))
        );
    }

    #[tokio::test]
    async fn test_stale_sticky_node_falls_back_when_configured() {
        let (registry, affinity, resolver) = setup(StaleAffinityPolicy::Fallback).await;
        registry.register(NodeId::new(2, 1));
        registry.register(NodeId::new(2, 2));
        registry.mark_down(&NodeId::new(2, 1));
        affinity.assign("alice", pin(2, 1)).await;

        assert_eq!(
            resolver.resolve("alice", 2).await,
            Ok(Route::Fallback {
                node: NodeId::new(2, 2),
                known_account: true
            })
        );
    }
}
