pub mod registry_helpers;
pub mod ws_client;

pub use mock_signaling::*;
pub use registry_helpers::*;
pub use ws_client::*;
