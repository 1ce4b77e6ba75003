//! Signalbox relay binary.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: listen on :3000, close connections idle for 300s
//! signalbox
//!
//! # JSON config file with ListenAddress / SocketTimeout / WriteTimeout keys
//! signalbox --config config.json
//!
//! # Flags win over SIGNALBOX_* environment variables and the config file
//! signalbox --listen 127.0.0.1:8080 --socket-timeout 60
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use signalbox_server::ServerConfig;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// WebSocket signaling relay
#[derive(Parser, Debug)]
#[command(name = "signalbox")]
#[command(about = "Room-based WebSocket signaling relay")]
#[command(version)]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (e.g. ":3000" or "127.0.0.1:3000")
    #[arg(short, long)]
    listen: Option<String>,

    /// Seconds a connection may stay silent before it is closed
    #[arg(long)]
    socket_timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn resolve_config(args: &Args) -> ServerConfig {
    let file_config = match &args.config {
        Some(path) => ServerConfig::load(path).unwrap_or_else(|e| {
            warn!("{}; using defaults", e);
            ServerConfig::default()
        }),
        None => ServerConfig::default(),
    };

    let mut config = file_config.with_env();

    if let Some(listen) = &args.listen {
        config.listen_address = listen.clone();
    }
    if let Some(secs) = args.socket_timeout.filter(|secs| *secs > 0) {
        config.socket_timeout = Duration::from_secs(secs);
    }

    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = resolve_config(&args);
    info!(
        "Signalbox starting (socket timeout {:?}, write timeout {:?})",
        config.socket_timeout, config.write_timeout
    );

    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to listen on {bind_address}"))?;

    let (service, _registry) = signalbox_server::start_registry(&config);

    signalbox_server::serve(listener, service)
        .await
        .context("server error")?;

    Ok(())
}
