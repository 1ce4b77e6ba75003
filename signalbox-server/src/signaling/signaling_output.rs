use async_trait::async_trait;
use signalbox_core::ConnectionId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),

    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    #[error("outbound queue of connection {0} is full")]
    Full(ConnectionId),
}

/// Outbound side of the connection gateway, as seen by the registry actor.
///
/// Implementations hand the message to the connection's writer; they must
/// not apply outer framing twice.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Send one protocol message to a connection.
    async fn send(&self, connection: &ConnectionId, message: &str) -> Result<(), DeliveryError>;
}
