//! Relay dispatcher, the per-message hot path.
//!
//! For each inbound client message:
//!
//! 1. Decode the wire command into `(service_type, local_cmd)`
//! 2. Reject service types outside the routable range (message not claimed)
//! 3. Resolve the target node, sticky first
//! 4. Wrap account, local command and payload in a [`RelayEnvelope`]
//! 5. Send it to the node under the reserved relay command
//!
//! Failures after step 2 are logged and the message is dropped; the
//! connection is never affected and nothing is retried.

use super::RelayEnvelope;
use crate::error::{RouteMiss, RouterError};
use crate::namespace::{CommandNamespace, ServiceTypeBounds};
use crate::node::{NodeId, NodeRegistry, NodeResolver, Route};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, trace, warn};

/// Counters for relay outcomes since the dispatcher was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub relayed: u64,
    pub protocol_errors: u64,
    pub routing_misses: u64,
    pub send_failures: u64,
    /// Messages from accounts with no affinity entry, relayed or not
    pub unknown_accounts: u64,
}

#[derive(Debug, Default)]
struct RelayCounters {
    relayed: AtomicU64,
    protocol_errors: AtomicU64,
    routing_misses: AtomicU64,
    send_failures: AtomicU64,
    unknown_accounts: AtomicU64,
}

/// Decodes, resolves and forwards client messages.
#[derive(Debug)]
pub struct RelayDispatcher {
    namespace: CommandNamespace,
    bounds: ServiceTypeBounds,
    relay_cmd: u64,
    resolver: NodeResolver,
    registry: Arc<dyn NodeRegistry>,
    counters: RelayCounters,
}

impl RelayDispatcher {
    pub fn new(
        namespace: CommandNamespace,
        bounds: ServiceTypeBounds,
        relay_cmd: u64,
        resolver: NodeResolver,
        registry: Arc<dyn NodeRegistry>,
    ) -> Self {
        Self {
            namespace,
            bounds,
            relay_cmd,
            resolver,
            registry,
            counters: RelayCounters::default(),
        }
    }

    /// Entry point invoked by the connection layer for every inbound message.
    ///
    /// Returns whether the dispatcher claimed the message. A message is
    /// claimed once its service type validates, even if it is later dropped
    /// for lack of a node or a failed send, so that no other handler
    /// processes it twice.
    pub async fn on_recv_from_client(&self, account: &str, cmd: u32, data: &[u8]) -> bool {
        match self.dispatch(account, cmd, data).await {
            Ok(_) => true,
            Err(e) => {
                self.report_dropped(account, cmd, &e);
                e.is_claimed()
            }
        }
    }

    fn report_dropped(&self, account: &str, cmd: u32, e: &RouterError) {
        let (service_type, _) = self.namespace.decode(cmd);
        match e {
            RouterError::RelaySendFailed { node, .. }
            | RouterError::RoutingMiss {
                reason: RouteMiss::StaleAffinity(node),
                ..
            } => {
                error!(account, cmd, service_type, %node, error = %e, "Client message dropped");
            }
            _ => error!(account, cmd, service_type, error = %e, "Client message dropped"),
        }
    }

    /// Relays one message and reports the node it was delivered to.
    ///
    /// An account with no affinity entry is reported as
    /// [`RouterError::UnknownAccount`] in the logs but still relayed to any
    /// live node of the service type.
    pub async fn dispatch(
        &self,
        account: &str,
        cmd: u32,
        data: &[u8],
    ) -> Result<NodeId, RouterError> {
        let (service_type, local_cmd) = self.namespace.decode(cmd);
        if !self.bounds.is_routable(service_type) {
            self.counters.protocol_errors.fetch_add(1, Ordering::Relaxed);
            return Err(RouterError::InvalidServiceType {
                account: account.to_string(),
                cmd,
                service_type,
            });
        }

        let route = match self.resolver.resolve(account, service_type).await {
            Ok(route) => route,
            Err(reason) => {
                if reason == RouteMiss::UnknownAccount {
                    self.counters.unknown_accounts.fetch_add(1, Ordering::Relaxed);
                }
                self.counters.routing_misses.fetch_add(1, Ordering::Relaxed);
                return Err(RouterError::RoutingMiss {
                    account: account.to_string(),
                    cmd,
                    service_type,
                    reason,
                });
            }
        };

        if let Route::Fallback {
            known_account: false,
            node,
        } = route
        {
            self.counters.unknown_accounts.fetch_add(1, Ordering::Relaxed);
            let e = RouterError::UnknownAccount {
                account: account.to_string(),
                cmd,
                service_type,
                node,
            };
            warn!(account, cmd, service_type, %node, error = %e, "Relaying for unknown account");
        }

        let node = route.node();
        let envelope = RelayEnvelope::new(account, local_cmd, data);
        if !self.registry.send(&node, self.relay_cmd, &envelope).await {
            self.counters.send_failures.fetch_add(1, Ordering::Relaxed);
            return Err(RouterError::RelaySendFailed {
                account: account.to_string(),
                cmd,
                node,
            });
        }

        self.counters.relayed.fetch_add(1, Ordering::Relaxed);
        trace!(account, cmd, local_cmd, %node, "relayed client message");
        Ok(node)
    }

    pub fn namespace(&self) -> CommandNamespace {
        self.namespace
    }

    pub fn bounds(&self) -> ServiceTypeBounds {
        self.bounds
    }

    pub fn relay_cmd(&self) -> u64 {
        self.relay_cmd
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            relayed: self.counters.relayed.load(Ordering::Relaxed),
            protocol_errors: self.counters.protocol_errors.load(Ordering::Relaxed),
            routing_misses: self.counters.routing_misses.load(Ordering::Relaxed),
            send_failures: self.counters.send_failures.load(Ordering::Relaxed),
            unknown_accounts: self.counters.unknown_accounts.load(Ordering::Relaxed),
        }
    }
}
