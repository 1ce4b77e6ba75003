use signalbox_core::{ConnectionId, PeerId, RoomId};
use std::collections::BTreeSet;
use tracing::debug;

use crate::registry::Registry;

/// One outbound write produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub peer: PeerId,
    pub connection: ConnectionId,
    pub message: String,
}

/// Peers without a connection are never targets.
pub(crate) fn delivery_for(registry: &Registry, peer: &PeerId, message: &str) -> Option<Delivery> {
    registry.connection_of(peer.as_str()).map(|connection| Delivery {
        peer: peer.clone(),
        connection,
        message: message.to_owned(),
    })
}

/// Every member of `room` other than `except`.
pub(crate) fn broadcast_to_room(
    registry: &Registry,
    room: &RoomId,
    except: Option<&PeerId>,
    message: &str,
) -> Vec<Delivery> {
    let deliveries: Vec<Delivery> = registry
        .members_of(room.as_str())
        .iter()
        .filter(|member| Some(*member) != except)
        .filter_map(|member| delivery_for(registry, member, message))
        .collect();

    debug!("Broadcast to room {}: {} recipient(s)", room, deliveries.len());
    deliveries
}

/// Only the destination receives the message; an unknown destination is a
/// silent miss.
pub(crate) fn route_to(registry: &Registry, destination: &PeerId, message: &str) -> Vec<Delivery> {
    if !registry.contains_peer(destination.as_str()) {
        debug!("Dropping message for unknown peer {}", destination);
        return Vec::new();
    }

    delivery_for(registry, destination, message)
        .into_iter()
        .collect()
}

/// Union of the members of every room `sender` occupies, minus the sender.
pub(crate) fn route_custom(registry: &Registry, sender: &PeerId, message: &str) -> Vec<Delivery> {
    if !registry.contains_peer(sender.as_str()) {
        debug!("Dropping custom message from unknown peer {}", sender);
        return Vec::new();
    }

    let recipients: BTreeSet<PeerId> = registry
        .rooms_of(sender.as_str())
        .iter()
        .flat_map(|room| registry.members_of(room.as_str()))
        .filter(|peer| peer != sender)
        .collect();

    recipients
        .iter()
        .filter_map(|peer| delivery_for(registry, peer, message))
        .collect()
}
