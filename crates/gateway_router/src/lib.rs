//! # Gateway Router - Routing Core for a Game Gateway
//!
//! Sits between game clients and a fleet of backend service nodes
//! partitioned by service type (login, world, chat, ...). For every inbound
//! client message the router decides which service type and which node
//! instance handles it, keeps accounts pinned to the nodes they were
//! allocated, and relays the message verbatim.
//!
//! ## Architecture Overview
//!
//! * **Command Namespace** ([`namespace`]) - splits a flat `u32` wire command
//!   into `(service_type, local_cmd)` with a cluster-wide offset
//! * **Session Affinity Table** ([`affinity`]) - account to per-service-type
//!   node pins, swapped atomically on login and dropped on logout
//! * **Node Target Resolver** ([`node`]) - sticky node first, any live node of
//!   the service type otherwise
//! * **Authentication Bootstrap** ([`auth`]) - verifies tokens against the
//!   token store and seeds affinity from the stored allocations
//! * **Relay Dispatcher** ([`relay`]) - the per-message hot path
//! * **Client Send Facade** ([`client`]) - single, broadcast and role-addressed
//!   pushes through an injected codec and transport
//!
//! ### Message Flow
//!
//! 1. The connection layer calls [`Gateway::on_recv_from_client`]
//! 2. The wire command is decoded and its service type validated
//! 3. The target node is resolved through the affinity table and registry
//! 4. A [`RelayEnvelope`] is sent to the node under the reserved relay command
//!
//! ## Collaborators
//!
//! The node registry, token store, client transport and codec are external.
//! They are injected through [`GatewayBuilder`] as trait objects; [`memory`]
//! provides in-process implementations.
//!
//! ## Error Handling
//!
//! Per-message failures are logged and never affect the connection. Only
//! configuration errors are fatal, and [`GatewayBuilder::build`] reports them
//! before the gateway exists.
//!
//! ```rust
//! # use std::sync::Arc;
//! # use gateway_router::memory::{InMemoryNodeRegistry, InMemoryTokenStore, RecordingClientTransport};
//! # use gateway_router::{Gateway, NodeId, RouterConfig};
//! # #[tokio::main]
//! # async fn main() -> Result<(), gateway_router::RouterError> {
//! let registry = Arc::new(InMemoryNodeRegistry::new());
//! registry.register(NodeId::new(2, 1));
//!
//! let gateway = Gateway::builder(RouterConfig::new(1000))
//!     .node_registry(registry.clone())
//!     .token_store(Arc::new(InMemoryTokenStore::new()))
//!     .client_transport(Arc::new(RecordingClientTransport::new()))
//!     .build()?;
//!
//! // 2001 = service type 2, local command 1
//! assert!(gateway.on_recv_from_client("alice", 2001, b"payload").await);
//! # Ok(())
//! # }
//! ```

pub use affinity::{AffinityLookup, AffinityTable, AllocationMap};
pub use auth::{Allocation, TokenRecord, TokenStore, VerifyOutcome};
pub use client::{ClientCodec, ClientTransport, EncodedFrame, PassthroughCodec, RoleDirectory};
pub use config::{LoggingSettings, NamespaceSettings, RouterConfig, RoutingSettings};
pub use error::{CodecError, RouteMiss, RouterError, StoreError};
pub use gateway::{Gateway, GatewayBuilder};
pub use namespace::{CommandNamespace, ServiceTypeBounds};
pub use node::{NodeId, NodeRegistry, Route, ServiceType, StaleAffinityPolicy};
pub use relay::{RelayEnvelope, RelayStats};

pub mod affinity;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod memory;
pub mod namespace;
pub mod node;
pub mod relay;

mod tests;
