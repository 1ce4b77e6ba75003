//! Shared model and wire protocol for the signalbox relay.

pub mod model;
pub mod protocol;

pub use model::*;
pub use protocol::{Command, ProtocolError};
