use crate::model::{PeerDescriptor, PeerId, RoomDescriptor};

pub const ANNOUNCE: &str = "/announce";
pub const LEAVE: &str = "/leave";
pub const TO: &str = "/to";
pub const CLOSE: &str = "/close";

/// A decoded wire message.
///
/// The set is closed: every `/`-prefixed keyword that is not one of the four
/// reserved ones becomes [`Command::Custom`], and anything else is
/// [`Command::Ignore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/announce|{"id":..}|{"room":..}`
    Announce {
        peer: PeerDescriptor,
        room: RoomDescriptor,
    },

    /// `/leave|{"id":..}|{"room":..}`
    Leave {
        peer: PeerDescriptor,
        room: RoomDescriptor,
    },

    /// `/to|<destination>|<payload...>`; payload fields are opaque.
    To {
        destination: PeerId,
        payload: Vec<String>,
    },

    /// `/close`. The acting peer comes from the connection, not the message.
    Close,

    /// `/<keyword>|<sender>|<payload...>`
    Custom {
        keyword: String,
        sender: PeerId,
        /// Every field after the keyword, the sender field included, verbatim.
        body: Vec<String>,
    },

    /// Text that does not start with `/`.
    Ignore,
}

impl Command {
    /// The leading keyword, `None` for [`Command::Ignore`].
    pub fn keyword(&self) -> Option<&str> {
        match self {
            Command::Announce { .. } => Some(ANNOUNCE),
            Command::Leave { .. } => Some(LEAVE),
            Command::To { .. } => Some(TO),
            Command::Close => Some(CLOSE),
            Command::Custom { keyword, .. } => Some(keyword.as_str()),
            Command::Ignore => None,
        }
    }

    pub fn encode(&self) -> String {
        super::codec::encode(self)
    }
}
