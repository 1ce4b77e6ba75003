use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use bytes::Bytes;
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use signalbox_core::ConnectionId;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::SignalingService;
use crate::registry::RegistryCommand;
use crate::signaling::framing::unwrap_frame;

/// Messages buffered per connection before the registry's writes start to
/// wait on it.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let connection = ConnectionId::new();
    info!("New WebSocket connection: {}", connection);

    let (mut sender, receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE_CAPACITY);

    service.add_connection(connection, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let mut recv_task = tokio::spawn(pump(connection, receiver, service.clone()));

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_connection(&connection);

    if service
        .command_tx
        .send(RegistryCommand::Disconnect { connection })
        .await
        .is_err()
    {
        warn!("Registry stopped before disconnect of {}", connection);
    }

    info!("WebSocket disconnected: {}", connection);
}

/// Forward every complete message from the socket to the registry until the
/// peer goes away or stays silent longer than the socket timeout.
async fn pump(
    connection: ConnectionId,
    mut receiver: SplitStream<WebSocket>,
    service: SignalingService,
) {
    loop {
        let next = match tokio::time::timeout(service.socket_timeout(), receiver.next()).await {
            Ok(next) => next,
            Err(_) => {
                info!(
                    "Connection {} idle for {:?}, closing",
                    connection,
                    service.socket_timeout()
                );
                break;
            }
        };

        let data = match next {
            Some(Ok(Message::Text(text))) => Bytes::from(unwrap_frame(text.as_str()).into_owned()),
            Some(Ok(Message::Binary(data))) => data,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                debug!("Read error on {}: {}", connection, e);
                break;
            }
        };

        if let Err(e) = service
            .command_tx
            .send(RegistryCommand::Inbound { connection, data })
            .await
        {
            error!("Registry died: {}", e);
            break;
        }
    }
}
