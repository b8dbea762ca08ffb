//! Error types and handling for the routing core.
//!
//! Per-message failures (protocol errors, routing misses, relay send
//! failures) are reported through [`RouterError`] and never terminate a
//! connection. Only configuration errors are fatal, and they surface from
//! [`crate::GatewayBuilder::build`] before anything is running.

use crate::node::{NodeId, ServiceType};

/// Enumeration of possible routing core errors.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Invalid construction-time configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The wire command decoded to a service type outside the routable range
    #[error("Wrong message number. cmd: {cmd}, account: {account}, service type: {service_type}")]
    InvalidServiceType {
        account: String,
        cmd: u32,
        service_type: ServiceType,
    },

    /// The account has no affinity entry; the message went to `node`, picked
    /// by the registry
    #[error("No server information corresponding to the account was found. cmd: {cmd}, account: {account}, service type: {service_type}, fallback node: {node}")]
    UnknownAccount {
        account: String,
        cmd: u32,
        service_type: ServiceType,
        node: NodeId,
    },

    /// No sticky node and no live node of the required service type
    #[error("Target node not found. cmd: {cmd}, account: {account}, service type: {service_type}: {reason}")]
    RoutingMiss {
        account: String,
        cmd: u32,
        service_type: ServiceType,
        reason: RouteMiss,
    },

    /// A `(service_type, local_cmd)` pair has no wire command in the namespace
    #[error("Command out of range: service type {service_type}, local cmd {local_cmd}, offset {offset}")]
    CommandOutOfRange {
        service_type: ServiceType,
        local_cmd: u32,
        offset: u32,
    },

    /// The registry failed to deliver the relay envelope to a resolved node
    #[error("Sending a message to node {node} failed. cmd: {cmd}, account: {account}")]
    RelaySendFailed {
        account: String,
        cmd: u32,
        node: NodeId,
    },

    /// The token store could not produce a record
    #[error("Token store error for account {account}: {source}")]
    TokenStore {
        account: String,
        #[source]
        source: StoreError,
    },

    /// Delivering a message to a single client failed
    #[error("Sending message failed, account: {account}, cmd: {cmd}")]
    ClientSend { account: String, cmd: u64 },

    /// Broadcasting a message to clients failed
    #[error("Broadcast message failed, cmd: {cmd}")]
    Broadcast { cmd: u64 },

    /// No account is known for the requested role name
    #[error("No account found for role: {0}")]
    UnknownRole(String),

    /// The client codec rejected a frame
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Serializing an outgoing client message failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Installing the tracing subscriber failed
    #[error("Logging error: {0}")]
    Logging(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl RouterError {
    /// Whether the relay dispatcher took responsibility for the message that
    /// produced this error.
    ///
    /// Only a message that fails namespace validation is left unclaimed, so
    /// that other handlers may still process it.
    pub fn is_claimed(&self) -> bool {
        !matches!(self, RouterError::InvalidServiceType { .. })
    }
}

/// Why the node target resolver produced no node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteMiss {
    /// The registry reports no live node of the service type
    #[error("no live node of this service type")]
    NoLiveNode,

    /// The account has no affinity entry and the registry reports no live
    /// node of the service type
    #[error("unknown account and no live node of this service type")]
    UnknownAccount,

    /// The account is pinned to a node that is no longer live
    #[error("sticky node {0} is no longer live")]
    StaleAffinity(NodeId),
}

/// Errors a token store may report while loading a record.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the account
    #[error("no token record for account {0}")]
    NotFound(String),

    /// The backing store could not be reached
    #[error("token store unavailable: {0}")]
    Unavailable(String),

    /// A record exists but could not be decoded
    #[error("corrupt token record: {0}")]
    Corrupt(String),
}

/// Errors a client codec may report.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CodecError {
    /// The frame is too short to carry the trailer byte
    #[error("frame for cmd {0} is empty")]
    EmptyFrame(u64),

    /// Encoding failed inside the codec
    #[error("encode failed for cmd {cmd}: {reason}")]
    Encode { cmd: u64, reason: String },

    /// Decoding failed inside the codec
    #[error("decode failed for cmd {cmd}: {reason}")]
    Decode { cmd: u64, reason: String },
}
