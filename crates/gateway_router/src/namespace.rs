//! Command namespace encoding.
//!
//! A single flat `u32` wire command addresses both the backend service type
//! and the operation within that service:
//!
//! ```text
//! wire_cmd = service_type * offset + local_cmd      (local_cmd < offset)
//! ```
//!
//! The offset is a cluster-wide protocol constant. Every service must agree
//! on it; a gateway configured with a different offset than its backends
//! is a deployment error and is not detectable at runtime.

use crate::error::RouterError;
use crate::node::ServiceType;

/// Pure arithmetic codec for the command namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandNamespace {
    offset: u32,
}

impl CommandNamespace {
    /// Creates a codec for the given offset.
    ///
    /// An offset of zero cannot partition anything and is rejected.
    pub fn new(offset: u32) -> Result<Self, RouterError> {
        if offset == 0 {
            return Err(RouterError::Config(
                "namespace.msg_cmd_offset must be greater than 0".to_string(),
            ));
        }
        Ok(Self { offset })
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Splits a wire command into `(service_type, local_cmd)`.
    ///
    /// Never fails; whether the service type is routable is checked
    /// separately with [`ServiceTypeBounds`].
    pub fn decode(&self, cmd: u32) -> (ServiceType, u32) {
        (cmd / self.offset, cmd % self.offset)
    }

    /// Joins a service type and local command into a wire command.
    ///
    /// Returns `None` when `local_cmd >= offset` (the result would decode to a
    /// different pair) or when the result does not fit in a `u32`.
    pub fn encode(&self, service_type: ServiceType, local_cmd: u32) -> Option<u32> {
        if local_cmd >= self.offset {
            return None;
        }
        service_type
            .checked_mul(self.offset)?
            .checked_add(local_cmd)
    }

    /// Like [`CommandNamespace::encode`], reporting the rejected pair.
    pub fn try_encode(
        &self,
        service_type: ServiceType,
        local_cmd: u32,
    ) -> Result<u32, RouterError> {
        self.encode(service_type, local_cmd)
            .ok_or(RouterError::CommandOutOfRange {
                service_type,
                local_cmd,
                offset: self.offset,
            })
    }
}

/// The range of service types the gateway relays to.
///
/// A service type is routable when it is strictly greater than the gateway's
/// own reserved type and strictly less than `node_type_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTypeBounds {
    gateway: ServiceType,
    size: ServiceType,
}

impl ServiceTypeBounds {
    pub fn new(gateway: ServiceType, size: ServiceType) -> Result<Self, RouterError> {
        if size <= gateway.saturating_add(1) {
            return Err(RouterError::Config(format!(
                "namespace.node_type_size ({size}) leaves no routable service type above the gateway type ({gateway})"
            )));
        }
        Ok(Self { gateway, size })
    }

    pub fn gateway(&self) -> ServiceType {
        self.gateway
    }

    pub fn size(&self) -> ServiceType {
        self.size
    }

    pub fn is_routable(&self, service_type: ServiceType) -> bool {
        service_type > self.gateway && service_type < self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_splits_on_offset() {
        let ns = CommandNamespace::new(1000).unwrap();
        assert_eq!(ns.decode(2001), (2, 1));
        assert_eq!(ns.decode(999), (0, 999));
        assert_eq!(ns.decode(3000), (3, 0));
    }

    #[test]
    fn test_encode_inverts_decode() {
        let ns = CommandNamespace::new(1000).unwrap();
        for (service_type, local_cmd) in [(1, 0), (2, 1), (7, 999), (42, 500)] {
            let cmd = ns.encode(service_type, local_cmd).unwrap();
            assert_eq!(ns.decode(cmd), (service_type, local_cmd));
        }
    }

    #[test]
    fn test_encode_rejects_local_cmd_at_offset() {
        let ns = CommandNamespace::new(1000).unwrap();
        assert_eq!(ns.encode(2, 1000), None);
    }

    #[test]
    fn test_try_encode_reports_rejected_pair() {
        let ns = CommandNamespace::new(1000).unwrap();
        assert_eq!(ns.try_encode(3, 7).unwrap(), 3007);
        assert!(matches!(
            ns.try_encode(2, 1000),
            Err(RouterError::CommandOutOfRange {
                service_type: 2,
                local_cmd: 1000,
                offset: 1000
            })
        ));
    }

    #[test]
    fn test_encode_rejects_overflow() {
        let ns = CommandNamespace::new(1000).unwrap();
        assert_eq!(ns.encode(u32::MAX / 1000 + 1, 0), None);
    }

    #[test]
    fn test_zero_offset_is_a_config_error() {
        assert!(matches!(
            CommandNamespace::new(0),
            Err(RouterError::Config(_))
        ));
    }

    #[test]
    fn test_bounds_exclude_gateway_and_size() {
        let bounds = ServiceTypeBounds::new(0, 5).unwrap();
        assert!(!bounds.is_routable(0));
        assert!(bounds.is_routable(1));
        assert!(bounds.is_routable(4));
        assert!(!bounds.is_routable(5));
        assert!(!bounds.is_routable(100));
    }

    #[test]
    fn test_bounds_need_a_routable_type() {
        assert!(ServiceTypeBounds::new(3, 4).is_err());
        assert!(ServiceTypeBounds::new(3, 5).is_ok());
    }
}
