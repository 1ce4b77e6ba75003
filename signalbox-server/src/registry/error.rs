use signalbox_core::{ConnectionId, PeerId, ProtocolError, RoomId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("unknown peer {0}")]
    UnknownPeer(PeerId),

    #[error("unknown room {0}")]
    UnknownRoom(RoomId),

    #[error("peer {peer} is not a member of room {room}")]
    NotInRoom { peer: PeerId, room: RoomId },

    #[error("no peer announced on connection {0}")]
    UnknownConnection(ConnectionId),

    #[error("close requires an originating connection")]
    ConnectionRequired,
}
