use bytes::Bytes;
use signalbox_core::ConnectionId;
use tokio::sync::oneshot;

use crate::registry::RegistrySnapshot;

/// Items on the registry's inbound queue, produced by connection pumps.
#[derive(Debug)]
pub enum RegistryCommand {
    /// A complete message read from a connection.
    Inbound { connection: ConnectionId, data: Bytes },

    /// The connection is gone; handled as `/close`.
    Disconnect { connection: ConnectionId },

    /// Answered after every previously queued command has been processed.
    Snapshot {
        reply: oneshot::Sender<RegistrySnapshot>,
    },
}
