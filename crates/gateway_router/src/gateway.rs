//! The gateway routing core and its builder.
//!
//! [`Gateway`] is the surface the connection layer talks to. Every
//! collaborator (node registry, token store, client transport and codec,
//! role directory) is injected once through [`GatewayBuilder`] and is
//! immutable afterwards.

use crate::affinity::AffinityTable;
use crate::auth::{AuthBootstrap, TokenStore, VerifyOutcome};
use crate::client::{
    ClientCodec, ClientSendFacade, ClientTransport, PassthroughCodec, RoleDirectory,
};
use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::node::{NodeRegistry, NodeResolver};
use crate::relay::{RelayDispatcher, RelayStats};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Builder for [`Gateway`].
///
/// A node registry, a token store and a client transport are required. The
/// client codec defaults to [`PassthroughCodec`]; the role directory is
/// optional.
#[derive(Debug)]
pub struct GatewayBuilder {
    config: RouterConfig,
    registry: Option<Arc<dyn NodeRegistry>>,
    token_store: Option<Arc<dyn TokenStore>>,
    transport: Option<Arc<dyn ClientTransport>>,
    codec: Arc<dyn ClientCodec>,
    roles: Option<Arc<dyn RoleDirectory>>,
}

impl GatewayBuilder {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            registry: None,
            token_store: None,
            transport: None,
            codec: Arc::new(PassthroughCodec),
            roles: None,
        }
    }

    pub fn node_registry(mut self, registry: Arc<dyn NodeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    pub fn client_transport(mut self, transport: Arc<dyn ClientTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn client_codec(mut self, codec: Arc<dyn ClientCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn role_directory(mut self, roles: Arc<dyn RoleDirectory>) -> Self {
        self.roles = Some(roles);
        self
    }

    /// Validates the configuration and assembles the gateway.
    pub fn build(self) -> Result<Gateway, RouterError> {
        self.config.validate()?;

        let registry = self
            .registry
            .ok_or_else(|| RouterError::Config("a node registry is required".to_string()))?;
        let token_store = self
            .token_store
            .ok_or_else(|| RouterError::Config("a token store is required".to_string()))?;
        let transport = self
            .transport
            .ok_or_else(|| RouterError::Config("a client transport is required".to_string()))?;

        let affinity = Arc::new(AffinityTable::new());
        let resolver = NodeResolver::new(
            registry.clone(),
            affinity.clone(),
            self.config.routing.stale_affinity,
        );
        let dispatcher = RelayDispatcher::new(
            self.config.command_namespace()?,
            self.config.service_type_bounds()?,
            self.config.routing.relay_cmd,
            resolver,
            registry,
        );
        let auth = AuthBootstrap::new(token_store, affinity.clone());
        let clients = ClientSendFacade::new(self.codec, transport, self.roles);

        info!(
            "🚀 Gateway router ready: offset {}, routable service types {}..{}, relay cmd {}",
            self.config.namespace.msg_cmd_offset,
            self.config.namespace.gateway_service_type + 1,
            self.config.namespace.node_type_size,
            self.config.routing.relay_cmd
        );

        Ok(Gateway {
            config: self.config,
            affinity,
            dispatcher,
            auth,
            clients,
        })
    }
}

/// Gateway routing core.
///
/// Safe to share across connection tasks behind an `Arc`.
#[derive(Debug)]
pub struct Gateway {
    config: RouterConfig,
    affinity: Arc<AffinityTable>,
    dispatcher: RelayDispatcher,
    auth: AuthBootstrap,
    clients: ClientSendFacade,
}

impl Gateway {
    pub fn builder(config: RouterConfig) -> GatewayBuilder {
        GatewayBuilder::new(config)
    }

    /// Relays an inbound client message. Returns whether it was claimed.
    pub async fn on_recv_from_client(&self, account: &str, cmd: u32, data: &[u8]) -> bool {
        self.dispatcher.on_recv_from_client(account, cmd, data).await
    }

    /// Unframes an inbound client frame with the registered codec and relays
    /// the body.
    ///
    /// A frame the codec rejects is logged and left unclaimed.
    pub async fn on_recv_frame(&self, account: &str, cmd: u32, frame: &[u8]) -> bool {
        match self.clients.decode_frame(u64::from(cmd), frame) {
            Ok(body) => self.on_recv_from_client(account, cmd, &body).await,
            Err(e) => {
                error!(account, cmd, "Failed to decode client frame: {e}");
                false
            }
        }
    }

    /// Verifies a client token and seeds affinity on success.
    pub async fn verify_token(&self, account: &str, presented_token: &str) -> VerifyOutcome {
        self.auth.verify(account, presented_token).await
    }

    /// Drops the account's affinity state when its connection closes.
    pub async fn on_logout(&self, account: &str) {
        self.auth.logout(account).await;
    }

    pub async fn send_to_client<M>(
        &self,
        account: &str,
        cmd: u64,
        message: &M,
    ) -> Result<(), RouterError>
    where
        M: Serialize + ?Sized,
    {
        self.clients.send_to_one(account, cmd, message).await
    }

    pub async fn send_to_role<M>(
        &self,
        role_name: &str,
        cmd: u64,
        message: &M,
    ) -> Result<(), RouterError>
    where
        M: Serialize + ?Sized,
    {
        self.clients.send_to_role(role_name, cmd, message).await
    }

    pub async fn broadcast_to_clients<M>(&self, cmd: u64, message: &M) -> Result<(), RouterError>
    where
        M: Serialize + ?Sized,
    {
        self.clients.broadcast_to_all(cmd, message).await
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn affinity(&self) -> &Arc<AffinityTable> {
        &self.affinity
    }

    pub fn dispatcher(&self) -> &RelayDispatcher {
        &self.dispatcher
    }

    pub fn stats(&self) -> RelayStats {
        self.dispatcher.stats()
    }
}
