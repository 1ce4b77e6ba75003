use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ServerConfig;
use crate::registry::{COMMAND_QUEUE_CAPACITY, RegistryActor, RegistryCommand};
use crate::signaling::{Connections, SignalingService, ws_handler};

/// Spawn the registry actor and return the gateway state that feeds it.
pub fn start_registry(config: &ServerConfig) -> (SignalingService, JoinHandle<()>) {
    start_registry_with(config.socket_timeout, config.write_timeout)
}

pub fn start_registry_with(
    socket_timeout: Duration,
    write_timeout: Duration,
) -> (SignalingService, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::channel::<RegistryCommand>(COMMAND_QUEUE_CAPACITY);
    let connections = Connections::new();

    let actor = RegistryActor::new(command_rx, Arc::new(connections.clone()), write_timeout);
    let handle = tokio::spawn(actor.run());

    let service = SignalingService::new(command_tx, connections, socket_timeout);
    (service, handle)
}

pub fn router(service: SignalingService) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .with_state(service)
}

/// Serve the WebSocket gateway on an already bound listener.
pub async fn serve(listener: TcpListener, service: SignalingService) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Signaling server listening on ws://{}", addr);
    }
    axum::serve(listener, router(service)).await
}
