use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identity a client chooses for itself when it announces.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for PeerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `{"id": ...}` object carried by `/announce` and `/leave`.
/// Any other keys the client sends are ignored.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct PeerDescriptor {
    pub id: PeerId,
}

impl PeerDescriptor {
    pub fn new(id: impl Into<PeerId>) -> Self {
        Self { id: id.into() }
    }
}
