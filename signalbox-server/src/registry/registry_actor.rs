use signalbox_core::ConnectionId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::registry::{Delivery, Registry, RegistryCommand, RegistryError};
use crate::signaling::SignalingOutput;

/// Capacity of the inbound command queue shared by every connection pump.
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Single consumer of the inbound queue and sole owner of the [`Registry`].
pub struct RegistryActor {
    registry: Registry,
    command_rx: mpsc::Receiver<RegistryCommand>,
    output: Arc<dyn SignalingOutput>,
    write_timeout: Duration,
}

impl RegistryActor {
    pub fn new(
        command_rx: mpsc::Receiver<RegistryCommand>,
        output: Arc<dyn SignalingOutput>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            registry: Registry::new(),
            command_rx,
            output,
            write_timeout,
        }
    }

    /// Runs until every sender of the queue is dropped.
    pub async fn run(mut self) {
        info!("Registry event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!(
            "Command channel closed. Registry shutting down with {} peer(s) in {} room(s)",
            self.registry.peer_count(),
            self.registry.room_count()
        );
    }

    async fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Inbound { connection, data } => {
                match self.registry.process(Some(connection), &data) {
                    Ok(deliveries) => self.deliver(deliveries).await,
                    Err(e) => warn!("Dropped message from {}: {}", connection, e),
                }
            }

            RegistryCommand::Disconnect { connection } => self.disconnect(connection).await,

            RegistryCommand::Snapshot { reply } => {
                let _ = reply.send(self.registry.snapshot());
            }
        }
    }

    async fn disconnect(&mut self, connection: ConnectionId) {
        match self.registry.process(Some(connection), b"/close") {
            Ok(deliveries) => {
                info!("Connection {} closed", connection);
                self.deliver(deliveries).await;
            }
            // Connections that never announced anything.
            Err(RegistryError::UnknownConnection(_)) => {
                debug!("Connection {} closed without announced peers", connection);
            }
            Err(e) => warn!("Failed to clean up connection {}: {}", connection, e),
        }
    }

    /// Attempts every delivery; a failed or slow recipient is skipped.
    async fn deliver(&self, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            let send = self.output.send(&delivery.connection, &delivery.message);

            match tokio::time::timeout(self.write_timeout, send).await {
                Ok(Ok(())) => debug!("Delivered to {} on {}", delivery.peer, delivery.connection),
                Ok(Err(e)) => warn!("Delivery to {} failed: {}", delivery.peer, e),
                Err(_) => warn!(
                    "Delivery to {} timed out after {:?}",
                    delivery.peer, self.write_timeout
                ),
            }
        }
    }
}
