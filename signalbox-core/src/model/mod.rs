mod connection;
mod peer;
mod room;

pub use connection::ConnectionId;
pub use peer::{PeerDescriptor, PeerId};
pub use room::{RoomDescriptor, RoomId};
