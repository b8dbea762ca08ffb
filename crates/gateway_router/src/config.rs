//! Router configuration types, loading and validation.
//!
//! Configuration is read from TOML. The command namespace offset has no
//! default: a file that omits it fails to parse, and a zero offset fails
//! validation, so a misconfigured gateway never starts.
//!
//! ```toml
//! [namespace]
//! msg_cmd_offset = 1000
//! gateway_service_type = 0
//! node_type_size = 8
//!
//! [routing]
//! relay_cmd = 4294967296
//! stale_affinity = "reject"
//!
//! [logging]
//! level = "info"
//! json_format = false
//! ```

use crate::error::RouterError;
use crate::namespace::{CommandNamespace, ServiceTypeBounds};
use crate::node::{ServiceType, StaleAffinityPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

fn default_gateway_service_type() -> ServiceType {
    0
}

fn default_node_type_size() -> ServiceType {
    8
}

/// Default relay command: the first value past the `u32` client command
/// space, so it can never collide with a client command.
fn default_relay_cmd() -> u64 {
    u64::from(u32::MAX) + 1
}

/// Complete router configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Command namespace settings shared with every backend
    pub namespace: NamespaceSettings,
    /// Relay and resolution settings
    #[serde(default)]
    pub routing: RoutingSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Command namespace settings.
///
/// These values are a cluster-wide protocol contract and must be identical on
/// the gateway and on every backend node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSettings {
    /// Multiplier separating the service type from the local command
    pub msg_cmd_offset: u32,
    /// The gateway's own service type; it and everything below it is not routable
    #[serde(default = "default_gateway_service_type")]
    pub gateway_service_type: ServiceType,
    /// Exclusive upper bound on routable service types
    #[serde(default = "default_node_type_size")]
    pub node_type_size: ServiceType,
}

/// Relay and resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingSettings {
    /// Internal command carrying relay envelopes to backend nodes
    #[serde(default = "default_relay_cmd")]
    pub relay_cmd: u64,
    /// Behaviour when an account's sticky node is no longer live
    #[serde(default)]
    pub stale_affinity: StaleAffinityPolicy,
}

/// Logging configuration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            relay_cmd: default_relay_cmd(),
            stale_affinity: StaleAffinityPolicy::default(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl NamespaceSettings {
    pub fn new(msg_cmd_offset: u32) -> Self {
        Self {
            msg_cmd_offset,
            gateway_service_type: default_gateway_service_type(),
            node_type_size: default_node_type_size(),
        }
    }
}

impl RouterConfig {
    /// Creates a configuration with the given namespace offset and defaults
    /// for everything else.
    pub fn new(msg_cmd_offset: u32) -> Self {
        Self {
            namespace: NamespaceSettings::new(msg_cmd_offset),
            routing: RoutingSettings::default(),
            logging: LoggingSettings::default(),
        }
    }

    /// Loads configuration from a TOML file.
    ///
    /// Unlike a server config there is no sensible default to write out when
    /// the file is missing, so a missing file is an error.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self, RouterError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded router configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RouterError> {
        Ok(toml::from_str(content)?)
    }

    pub fn command_namespace(&self) -> Result<CommandNamespace, RouterError> {
        CommandNamespace::new(self.namespace.msg_cmd_offset)
    }

    pub fn service_type_bounds(&self) -> Result<ServiceTypeBounds, RouterError> {
        ServiceTypeBounds::new(
            self.namespace.gateway_service_type,
            self.namespace.node_type_size,
        )
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), RouterError> {
        let namespace = self.command_namespace()?;
        let bounds = self.service_type_bounds()?;

        // The highest routable service type must still encode into a u32.
        let client_space = u64::from(bounds.size()) * u64::from(namespace.offset());
        if client_space > u64::from(u32::MAX) + 1 {
            return Err(RouterError::Config(format!(
                "namespace.node_type_size ({}) * namespace.msg_cmd_offset ({}) exceeds the u32 command space",
                bounds.size(),
                namespace.offset()
            )));
        }

        if self.routing.relay_cmd < client_space {
            return Err(RouterError::Config(format!(
                "routing.relay_cmd ({}) lies inside the client command space (< {client_space})",
                self.routing.relay_cmd
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(RouterError::Config(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            )));
        }

        Ok(())
    }
}
