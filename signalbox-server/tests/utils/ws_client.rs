use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use signalbox_server::{SignalingService, start_registry_with, unwrap_frame, wrap_frame};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single websocket read in tests (ms).
pub const WS_TIMEOUT_MS: u64 = 3000;

/// Bind an ephemeral port and serve the gateway on it.
pub async fn start_test_server(socket_timeout: Duration) -> Result<(SocketAddr, SignalingService)> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind test listener")?;
    let addr = listener.local_addr()?;

    let (service, _registry) = start_registry_with(socket_timeout, Duration::from_secs(1));

    let server_service = service.clone();
    tokio::spawn(async move {
        if let Err(e) = signalbox_server::serve(listener, server_service).await {
            tracing::error!("[TestServer] serve failed: {}", e);
        }
    });

    Ok((addr, service))
}

/// Wait until `room` has exactly `count` members.
pub async fn wait_for_members(service: &SignalingService, room: &str, count: usize) -> Result<()> {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(WS_TIMEOUT_MS);

    loop {
        let snapshot = service.snapshot().await.context("Registry stopped")?;
        if snapshot.members_of(room).len() == count {
            return Ok(());
        }
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!(
                "Timeout waiting for {} member(s) in {}, have {:?}",
                count,
                room,
                snapshot.members_of(room)
            );
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// WebSocket client speaking the quoted wire format.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (stream, _) = connect_async(format!("ws://{addr}/"))
            .await
            .context("Failed to connect websocket")?;
        Ok(Self { stream })
    }

    pub async fn send(&mut self, message: &str) -> Result<()> {
        self.stream
            .send(Message::Text(wrap_frame(message).into()))
            .await
            .context("Failed to send websocket message")
    }

    pub async fn send_binary(&mut self, data: &[u8]) -> Result<()> {
        self.stream
            .send(Message::Binary(data.to_vec().into()))
            .await
            .context("Failed to send binary websocket message")
    }

    /// Next protocol message, with the outer quoting removed.
    pub async fn recv(&mut self) -> Result<String> {
        let timeout = Duration::from_millis(WS_TIMEOUT_MS);

        loop {
            let next = tokio::time::timeout(timeout, self.stream.next())
                .await
                .context("Timeout waiting for websocket message")?;

            match next {
                Some(Ok(Message::Text(text))) => return Ok(unwrap_frame(text.as_str()).into_owned()),
                Some(Ok(Message::Close(_))) | None => anyhow::bail!("Websocket closed"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e).context("Websocket read failed"),
            }
        }
    }

    /// Resolves once the server closes the connection.
    pub async fn wait_closed(&mut self, timeout: Duration) -> Result<()> {
        loop {
            let next = tokio::time::timeout(timeout, self.stream.next())
                .await
                .context("Timeout waiting for websocket close")?;

            match next {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return Ok(()),
                Some(Ok(_)) => continue,
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream
            .close(None)
            .await
            .context("Failed to close websocket")
    }
}
