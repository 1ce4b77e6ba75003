use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use signalbox_core::ConnectionId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::registry::{RegistryCommand, RegistrySnapshot};
use crate::signaling::framing::wrap_frame;
use crate::signaling::{DeliveryError, SignalingOutput};

/// Writers of every live connection, keyed by connection id.
#[derive(Clone, Default)]
pub struct Connections {
    inner: Arc<DashMap<ConnectionId, mpsc::Sender<Message>>>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, connection: ConnectionId, tx: mpsc::Sender<Message>) {
        self.inner.insert(connection, tx);
    }

    pub fn remove(&self, connection: &ConnectionId) {
        self.inner.remove(connection);
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl SignalingOutput for Connections {
    async fn send(&self, connection: &ConnectionId, message: &str) -> Result<(), DeliveryError> {
        let tx = self
            .inner
            .get(connection)
            .map(|entry| entry.value().clone())
            .ok_or(DeliveryError::UnknownConnection(*connection))?;

        // A slow reader must not hold up the registry; its message is dropped.
        tx.try_send(Message::Text(wrap_frame(message).into()))
            .map_err(|err| match err {
                TrySendError::Full(_) => DeliveryError::Full(*connection),
                TrySendError::Closed(_) => DeliveryError::Closed(*connection),
            })
    }
}

/// Shared state of the WebSocket gateway, handed to axum handlers.
#[derive(Clone)]
pub struct SignalingService {
    connections: Connections,
    pub(crate) command_tx: mpsc::Sender<RegistryCommand>,
    socket_timeout: Duration,
}

impl SignalingService {
    pub fn new(
        command_tx: mpsc::Sender<RegistryCommand>,
        connections: Connections,
        socket_timeout: Duration,
    ) -> Self {
        Self {
            connections,
            command_tx,
            socket_timeout,
        }
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    pub fn socket_timeout(&self) -> Duration {
        self.socket_timeout
    }

    pub fn add_connection(&self, connection: ConnectionId, tx: mpsc::Sender<Message>) {
        self.connections.add(connection, tx);
    }

    pub fn remove_connection(&self, connection: &ConnectionId) {
        self.connections.remove(connection);
    }

    /// Current membership, observed after everything queued so far.
    ///
    /// Returns `None` once the registry has stopped.
    pub async fn snapshot(&self) -> Option<RegistrySnapshot> {
        let (reply, rx) = oneshot::channel();

        if self
            .command_tx
            .send(RegistryCommand::Snapshot { reply })
            .await
            .is_err()
        {
            warn!("Registry is not running, no snapshot available");
            return None;
        }

        rx.await.ok()
    }
}
