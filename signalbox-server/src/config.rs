use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_LISTEN_ADDRESS: &str = ":3000";
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

pub const LISTEN_ADDRESS_ENV: &str = "SIGNALBOX_LISTEN_ADDRESS";
pub const SOCKET_TIMEOUT_ENV: &str = "SIGNALBOX_SOCKET_TIMEOUT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Go-style addresses such as `:3000` are accepted.
    pub listen_address: String,
    /// A connection that sends nothing for this long is closed.
    pub socket_timeout: Duration,
    /// Upper bound on a single outbound write from the registry.
    pub write_timeout: Duration,
}

/// On-disk shape; timeouts are in seconds.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConfigFile {
    listen_address: Option<String>,
    socket_timeout: Option<u64>,
    write_timeout: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Load from a JSON file. Missing keys, empty strings and zero timeouts
    /// fall back to the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let file: ConfigFile = serde_json::from_str(contents)?;
        let defaults = Self::default();

        Ok(Self {
            listen_address: file
                .listen_address
                .filter(|address| !address.is_empty())
                .unwrap_or(defaults.listen_address),
            socket_timeout: seconds_or(file.socket_timeout, defaults.socket_timeout),
            write_timeout: seconds_or(file.write_timeout, defaults.write_timeout),
        })
    }

    /// Apply `SIGNALBOX_*` environment overrides.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(address) = lookup(LISTEN_ADDRESS_ENV).filter(|a| !a.is_empty()) {
            self.listen_address = address;
        }

        if let Some(raw) = lookup(SOCKET_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.socket_timeout = Duration::from_secs(secs),
                _ => warn!("Ignoring invalid {}={:?}", SOCKET_TIMEOUT_ENV, raw),
            }
        }

        self
    }

    /// Address suitable for binding a TCP listener.
    pub fn bind_address(&self) -> String {
        if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        }
    }
}

fn seconds_or(value: Option<u64>, default: Duration) -> Duration {
    match value {
        Some(secs) if secs > 0 => Duration::from_secs(secs),
        _ => default,
    }
}
