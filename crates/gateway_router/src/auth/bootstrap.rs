//! Token verification and affinity seeding.

use super::{TokenStore, VerifyOutcome};
use crate::affinity::{AffinityTable, AllocationMap};
use crate::error::RouterError;
use crate::node::NodeId;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Validates client credentials and owns the login/logout side of the
/// affinity table.
#[derive(Debug, Clone)]
pub struct AuthBootstrap {
    store: Arc<dyn TokenStore>,
    affinity: Arc<AffinityTable>,
}

impl AuthBootstrap {
    pub fn new(store: Arc<dyn TokenStore>, affinity: Arc<AffinityTable>) -> Self {
        Self { store, affinity }
    }

    /// Verifies a presented token against the account's stored record.
    ///
    /// On an exact match the account's allocation set is replaced with the
    /// record's allocations. On any failure the affinity table is untouched,
    /// including a prior entry for the same account.
    pub async fn verify(&self, account: &str, presented_token: &str) -> VerifyOutcome {
        // Loaded before touching the table: the store may block on I/O.
        let record = match self.store.load(account).await {
            Ok(record) => record,
            Err(source) => {
                let e = RouterError::TokenStore {
                    account: account.to_string(),
                    source,
                };
                error!(account, error = %e, "Token verification aborted");
                return VerifyOutcome::StoreFailure;
            }
        };

        if presented_token != record.credential {
            warn!(account, "Token verification failed");
            return VerifyOutcome::CredentialMismatch;
        }

        let allocations: AllocationMap = record
            .allocations
            .iter()
            .map(|a| (a.service_type, NodeId::from_allocation(a.service_type, a.server_id)))
            .collect();
        let count = allocations.len();
        self.affinity.assign(account, allocations).await;

        info!("🔐 Account {} verified with {} allocated node(s)", account, count);
        VerifyOutcome::Success
    }

    /// Drops the account's affinity entry when its connection goes away.
    ///
    /// Unconditional and idempotent; the account need not have verified.
    pub async fn logout(&self, account: &str) {
        self.affinity.remove(account).await;
    }
}
