use anyhow::{Context, Result};
use bytes::Bytes;
use signalbox_core::ConnectionId;
use signalbox_server::{RegistryCommand, RegistrySnapshot};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use super::mock_signaling::SentMessage;

/// Timeout for waiting on a single delivery (ms).
pub const DELIVERY_TIMEOUT_MS: u64 = 2000;

/// How long a test waits before concluding nothing was delivered (ms).
pub const SILENCE_WINDOW_MS: u64 = 200;

pub fn announce_msg(peer: &str, room: &str) -> String {
    format!(r#"/announce|{{"id":"{peer}"}}|{{"room":"{room}"}}"#)
}

pub fn leave_msg(peer: &str, room: &str) -> String {
    format!(r#"/leave|{{"id":"{peer}"}}|{{"room":"{room}"}}"#)
}

/// Enqueue a message as if the connection pump had read it.
pub async fn send_text(
    cmd_tx: &mpsc::Sender<RegistryCommand>,
    connection: ConnectionId,
    text: &str,
) -> Result<()> {
    cmd_tx
        .send(RegistryCommand::Inbound {
            connection,
            data: Bytes::from(text.to_owned()),
        })
        .await
        .context("Registry command channel closed")
}

pub async fn disconnect(cmd_tx: &mpsc::Sender<RegistryCommand>, connection: ConnectionId) -> Result<()> {
    cmd_tx
        .send(RegistryCommand::Disconnect { connection })
        .await
        .context("Registry command channel closed")
}

/// Membership after every previously enqueued command has been handled.
pub async fn snapshot(cmd_tx: &mpsc::Sender<RegistryCommand>) -> Result<RegistrySnapshot> {
    let (reply, rx) = oneshot::channel();
    cmd_tx
        .send(RegistryCommand::Snapshot { reply })
        .await
        .context("Registry command channel closed")?;
    rx.await.context("Registry dropped the snapshot request")
}

pub async fn wait_for_message(
    rx: &mut mpsc::UnboundedReceiver<SentMessage>,
    timeout_ms: u64,
) -> Result<SentMessage> {
    match tokio::time::timeout(Duration::from_millis(timeout_ms), rx.recv()).await {
        Ok(Some(msg)) => Ok(msg),
        Ok(None) => anyhow::bail!("Delivery channel closed"),
        Err(_) => anyhow::bail!("Timeout waiting for delivery"),
    }
}

/// Drain everything already delivered without waiting.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<SentMessage>) -> Vec<SentMessage> {
    let mut drained = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        drained.push(msg);
    }
    drained
}
