use thiserror::Error;

/// Reasons a wire message cannot be turned into a [`Command`](super::Command).
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("message is not utf-8 encoded: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("{keyword} expects at least {expected} fields, got {actual}")]
    MissingFields {
        keyword: String,
        expected: usize,
        actual: usize,
    },

    #[error("malformed {field} object in {keyword}: {source}")]
    Json {
        keyword: String,
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
