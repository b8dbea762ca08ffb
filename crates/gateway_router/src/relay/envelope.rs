//! Relay envelope carried from the gateway to a backend node.

use serde::{Deserialize, Serialize};

/// A client message wrapped for delivery to a backend node.
///
/// `cmd` is the local command, i.e. the wire command with the service type
/// removed. `data` is the client's payload exactly as received; the gateway
/// never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEnvelope {
    pub account: String,
    pub cmd: u32,
    pub data: Vec<u8>,
}

impl RelayEnvelope {
    pub fn new(account: impl Into<String>, cmd: u32, data: &[u8]) -> Self {
        Self {
            account: account.into(),
            cmd,
            data: data.to_vec(),
        }
    }
}
