//! Send facade for backend-originated pushes to clients.

use super::{ClientCodec, ClientTransport, RoleDirectory};
use crate::error::RouterError;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// Encodes messages with the registered codec and hands them to the
/// registered transport. Pure pass-through: no retry, no queuing.
#[derive(Debug, Clone)]
pub struct ClientSendFacade {
    codec: Arc<dyn ClientCodec>,
    transport: Arc<dyn ClientTransport>,
    roles: Option<Arc<dyn RoleDirectory>>,
}

impl ClientSendFacade {
    pub fn new(
        codec: Arc<dyn ClientCodec>,
        transport: Arc<dyn ClientTransport>,
        roles: Option<Arc<dyn RoleDirectory>>,
    ) -> Self {
        Self {
            codec,
            transport,
            roles,
        }
    }

    /// Sends a message to one account.
    pub async fn send_to_one<M>(
        &self,
        account: &str,
        cmd: u64,
        message: &M,
    ) -> Result<(), RouterError>
    where
        M: Serialize + ?Sized,
    {
        let data = self.encode(cmd, message)?;
        if self.transport.send_to_client(account, cmd, data).await {
            debug!(account, cmd, "sent message to client");
            Ok(())
        } else {
            let e = RouterError::ClientSend {
                account: account.to_string(),
                cmd,
            };
            error!(account, cmd, error = %e, "Client send failed");
            Err(e)
        }
    }

    /// Sends a message to every connected client.
    ///
    /// Partial delivery is the transport's concern; only its aggregate
    /// failure signal is reported here.
    pub async fn broadcast_to_all<M>(&self, cmd: u64, message: &M) -> Result<(), RouterError>
    where
        M: Serialize + ?Sized,
    {
        let data = self.encode(cmd, message)?;
        if self.transport.broadcast_to_clients(cmd, data).await {
            debug!(cmd, "📡 broadcast message to clients");
            Ok(())
        } else {
            let e = RouterError::Broadcast { cmd };
            error!(cmd, error = %e, "Client broadcast failed");
            Err(e)
        }
    }

    /// Sends a message to the account that owns a role name.
    ///
    /// Fails with [`RouterError::UnknownRole`] when no role directory was
    /// registered or the directory does not know the role.
    pub async fn send_to_role<M>(
        &self,
        role_name: &str,
        cmd: u64,
        message: &M,
    ) -> Result<(), RouterError>
    where
        M: Serialize + ?Sized,
    {
        let account = match &self.roles {
            Some(roles) => roles.account_for_role(role_name).await,
            None => None,
        };
        match account {
            Some(account) => self.send_to_one(&account, cmd, message).await,
            None => Err(RouterError::UnknownRole(role_name.to_string())),
        }
    }

    /// Unframes an inbound client frame with the registered codec.
    pub fn decode_frame(&self, cmd: u64, frame: &[u8]) -> Result<Vec<u8>, RouterError> {
        Ok(self.codec.decode(cmd, frame)?)
    }

    fn encode<M>(&self, cmd: u64, message: &M) -> Result<Vec<u8>, RouterError>
    where
        M: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(message)?;
        Ok(self.codec.encode(cmd, &payload)?.into_bytes())
    }
}
