//! Client-facing send capabilities.
//!
//! The gateway does not own the client wire format or the connections. Both
//! are injected once at construction as strategy objects:
//!
//! * [`ClientCodec`] - frames outgoing bodies and unframes incoming ones
//! * [`ClientTransport`] - delivers frames to one account or to everyone
//! * [`RoleDirectory`] - optional role name to account lookup
//!
//! [`ClientSendFacade`] composes them for backend-originated pushes.

pub mod facade;

pub use facade::ClientSendFacade;

use crate::error::CodecError;
use async_trait::async_trait;
use std::fmt;

/// An encoded client frame: the body plus the codec's trailer byte.
///
/// The meaning of `flag` (compression, encryption, ...) belongs to the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub body: Vec<u8>,
    pub flag: u8,
}

impl EncodedFrame {
    /// Flattens the frame for transmission, trailer byte last.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut data = self.body;
        data.push(self.flag);
        data
    }
}

/// Client wire codec.
pub trait ClientCodec: Send + Sync + fmt::Debug {
    /// Encodes a serialized message body for the given command.
    fn encode(&self, cmd: u64, payload: &[u8]) -> Result<EncodedFrame, CodecError>;

    /// Recovers the message body from an inbound frame, trailer included.
    fn decode(&self, cmd: u64, frame: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// Codec that leaves bodies untouched and uses a zero trailer byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCodec;

impl ClientCodec for PassthroughCodec {
    fn encode(&self, _cmd: u64, payload: &[u8]) -> Result<EncodedFrame, CodecError> {
        Ok(EncodedFrame {
            body: payload.to_vec(),
            flag: 0,
        })
    }

    fn decode(&self, cmd: u64, frame: &[u8]) -> Result<Vec<u8>, CodecError> {
        match frame.split_last() {
            Some((_flag, body)) => Ok(body.to_vec()),
            None => Err(CodecError::EmptyFrame(cmd)),
        }
    }
}

/// Delivery of encoded frames to connected clients.
#[async_trait]
pub trait ClientTransport: Send + Sync + fmt::Debug {
    /// Sends to a single account; `false` if it is unknown or disconnected.
    async fn send_to_client(&self, account: &str, cmd: u64, data: Vec<u8>) -> bool;

    /// Sends to every connected client; `false` signals an aggregate failure.
    async fn broadcast_to_clients(&self, cmd: u64, data: Vec<u8>) -> bool;
}

/// Lookup from an in-game role name to the owning account.
///
/// The backing store is whatever the deployment provides; the gateway makes
/// no assumption about it.
#[async_trait]
pub trait RoleDirectory: Send + Sync + fmt::Debug {
    async fn account_for_role(&self, role_name: &str) -> Option<String>;
}
