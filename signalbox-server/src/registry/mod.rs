mod error;
mod registry;
mod registry_actor;
mod registry_command;
mod routing;

pub use error::*;
pub use registry::*;
pub use registry_actor::*;
pub use registry_command::*;
pub use routing::Delivery;
