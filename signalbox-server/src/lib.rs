//! Room/peer registry, routing and WebSocket gateway for the signalbox relay.

pub mod config;
pub mod registry;
pub mod server;
pub mod signaling;

pub use config::{ConfigError, ServerConfig};
pub use registry::*;
pub use server::{router, serve, start_registry, start_registry_with};
pub use signaling::*;
