use serde_json::json;

use super::command::{ANNOUNCE, CLOSE, Command, LEAVE, TO};
use super::error::ProtocolError;
use crate::model::{PeerDescriptor, PeerId, RoomDescriptor};

pub const FIELD_SEPARATOR: &str = "|";

/// Decode a raw message as it came off the connection.
pub fn decode(raw: &[u8]) -> Result<Command, ProtocolError> {
    let text = std::str::from_utf8(raw)?;
    decode_str(text)
}

/// Decode a message that is already known to be valid UTF-8.
pub fn decode_str(text: &str) -> Result<Command, ProtocolError> {
    let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();
    let Some((&keyword, rest)) = fields.split_first() else {
        return Ok(Command::Ignore);
    };

    if !keyword.starts_with('/') {
        return Ok(Command::Ignore);
    }

    match keyword {
        ANNOUNCE => {
            let (peer, room) = peer_and_room(keyword, rest)?;
            Ok(Command::Announce { peer, room })
        }
        LEAVE => {
            let (peer, room) = peer_and_room(keyword, rest)?;
            Ok(Command::Leave { peer, room })
        }
        TO => {
            let [destination, payload @ ..] = rest else {
                return Err(missing_fields(keyword, 3, fields.len()));
            };
            if payload.is_empty() {
                return Err(missing_fields(keyword, 3, fields.len()));
            }
            Ok(Command::To {
                destination: PeerId::from(*destination),
                payload: payload.iter().map(|f| (*f).to_owned()).collect(),
            })
        }
        CLOSE => Ok(Command::Close),
        _ => {
            let Some(sender) = rest.first() else {
                return Err(missing_fields(keyword, 2, fields.len()));
            };
            Ok(Command::Custom {
                keyword: keyword.to_owned(),
                sender: sender_identity(sender),
                body: rest.iter().map(|f| (*f).to_owned()).collect(),
            })
        }
    }
}

/// Serialize a command back into wire text.
///
/// Outer framing (the JSON string quoting used on the socket) is left to the
/// transport.
pub fn encode(command: &Command) -> String {
    match command {
        Command::Announce { peer, room } => {
            [ANNOUNCE, peer_json(peer).as_str(), room_json(room).as_str()].join(FIELD_SEPARATOR)
        }
        Command::Leave { peer, room } => {
            [LEAVE, peer_json(peer).as_str(), room_json(room).as_str()].join(FIELD_SEPARATOR)
        }
        Command::To {
            destination,
            payload,
        } => std::iter::once(TO)
            .chain(std::iter::once(destination.as_str()))
            .chain(payload.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(FIELD_SEPARATOR),
        Command::Close => CLOSE.to_owned(),
        Command::Custom { keyword, body, .. } => std::iter::once(keyword.as_str())
            .chain(body.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(FIELD_SEPARATOR),
        Command::Ignore => String::new(),
    }
}

fn peer_and_room(
    keyword: &str,
    rest: &[&str],
) -> Result<(PeerDescriptor, RoomDescriptor), ProtocolError> {
    let [peer, room, ..] = rest else {
        return Err(missing_fields(keyword, 3, rest.len() + 1));
    };

    let peer = serde_json::from_str(peer).map_err(|source| ProtocolError::Json {
        keyword: keyword.to_owned(),
        field: "peer",
        source,
    })?;
    let room = serde_json::from_str(room).map_err(|source| ProtocolError::Json {
        keyword: keyword.to_owned(),
        field: "room",
        source,
    })?;

    Ok((peer, room))
}

/// Clients send the sender either bare (`a3`) or as a peer object
/// (`{"id":"a3"}`).
fn sender_identity(field: &str) -> PeerId {
    match serde_json::from_str::<PeerDescriptor>(field) {
        Ok(descriptor) => descriptor.id,
        Err(_) => PeerId::from(field),
    }
}

fn missing_fields(keyword: &str, expected: usize, actual: usize) -> ProtocolError {
    ProtocolError::MissingFields {
        keyword: keyword.to_owned(),
        expected,
        actual,
    }
}

fn peer_json(peer: &PeerDescriptor) -> String {
    json!({ "id": peer.id.as_str() }).to_string()
}

fn room_json(room: &RoomDescriptor) -> String {
    json!({ "room": room.room.as_str() }).to_string()
}
