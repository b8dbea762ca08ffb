//! Authentication bootstrap and the token store boundary.
//!
//! The token store is the only persistent state the gateway consults. A
//! successful verification seeds the session affinity table from the
//! allocation list embedded in the account's token record.

pub mod bootstrap;

pub use bootstrap::AuthBootstrap;

use crate::error::StoreError;
use crate::node::ServiceType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One raw allocation descriptor: the server handed out for a service type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub service_type: ServiceType,
    pub server_id: u32,
}

/// The fields of a persisted token record the router consumes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Credential the client must present
    pub credential: String,
    /// Backend allocations made when the token was issued
    #[serde(default)]
    pub allocations: Vec<Allocation>,
}

/// Persistent token storage.
///
/// `load` may block on external I/O; the gateway never holds the affinity
/// lock while awaiting it.
#[async_trait]
pub trait TokenStore: Send + Sync + fmt::Debug {
    async fn load(&self, account: &str) -> Result<TokenRecord, StoreError>;
}

/// Result of a token verification.
///
/// The numeric codes are part of the client-facing contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerifyOutcome {
    Success,
    CredentialMismatch,
    StoreFailure,
}

impl VerifyOutcome {
    pub fn code(&self) -> u32 {
        match self {
            VerifyOutcome::Success => 0,
            VerifyOutcome::CredentialMismatch => 1,
            VerifyOutcome::StoreFailure => 2,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, VerifyOutcome::Success)
    }
}
