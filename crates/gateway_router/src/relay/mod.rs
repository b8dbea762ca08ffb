//! Relay of client messages to backend nodes.
//!
//! Every inbound client message is decoded against the command namespace,
//! resolved to a node and forwarded inside a [`RelayEnvelope`] under the
//! reserved internal relay command.

pub mod dispatcher;
pub mod envelope;

pub use dispatcher::{RelayDispatcher, RelayStats};
pub use envelope::RelayEnvelope;
