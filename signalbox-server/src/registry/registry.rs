use serde::Serialize;
use signalbox_core::protocol::decode;
use signalbox_core::{Command, ConnectionId, PeerDescriptor, PeerId, RoomDescriptor, RoomId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

use crate::registry::RegistryError;
use crate::registry::routing::{self, Delivery};

#[derive(Debug, Clone)]
struct Peer {
    id: PeerId,
    connection: Option<ConnectionId>,
}

/// Membership state of every peer and room.
///
/// `room_members` and `peer_rooms` mirror each other. A peer or room is only
/// present while it has at least one membership, so both are created and
/// destroyed as side effects of [`Registry::apply`].
#[derive(Debug, Default)]
pub struct Registry {
    peers: HashMap<PeerId, Peer>,
    room_members: HashMap<RoomId, HashSet<PeerId>>,
    peer_rooms: HashMap<PeerId, HashSet<RoomId>>,
    connection_peers: HashMap<ConnectionId, HashSet<PeerId>>,
}

/// Ordered copy of the membership indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    pub rooms: BTreeMap<RoomId, BTreeSet<PeerId>>,
    pub peers: BTreeMap<PeerId, BTreeSet<RoomId>>,
}

impl RegistrySnapshot {
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn members_of(&self, room: &str) -> Vec<PeerId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw message and apply it.
    pub fn process(
        &mut self,
        origin: Option<ConnectionId>,
        raw: &[u8],
    ) -> Result<Vec<Delivery>, RegistryError> {
        let command = decode(raw)?;
        // `decode` has already rejected invalid UTF-8, so this never allocates.
        let text = String::from_utf8_lossy(raw);
        self.apply(origin, &command, &text)
    }

    /// Apply a decoded command and return the writes it causes.
    ///
    /// `raw` is the text the command was decoded from; broadcasts forward it
    /// unchanged.
    pub fn apply(
        &mut self,
        origin: Option<ConnectionId>,
        command: &Command,
        raw: &str,
    ) -> Result<Vec<Delivery>, RegistryError> {
        if let Some(keyword) = command.keyword() {
            debug!("Applying {} from {:?}", keyword, origin);
        }

        match command {
            Command::Announce { peer, room } => Ok(self.announce(origin, &peer.id, &room.room, raw)),
            Command::Leave { peer, room } => self.leave(&peer.id, &room.room, raw),
            Command::To { destination, .. } => Ok(routing::route_to(self, destination, raw)),
            Command::Custom { sender, .. } => Ok(routing::route_custom(self, sender, raw)),
            Command::Close => {
                let connection = origin.ok_or(RegistryError::ConnectionRequired)?;
                self.close(connection)
            }
            Command::Ignore => Ok(Vec::new()),
        }
    }

    fn announce(
        &mut self,
        origin: Option<ConnectionId>,
        peer: &PeerId,
        room: &RoomId,
        raw: &str,
    ) -> Vec<Delivery> {
        if !self.peers.contains_key(peer) {
            self.peers.insert(
                peer.clone(),
                Peer {
                    id: peer.clone(),
                    connection: origin,
                },
            );
            if let Some(connection) = origin {
                self.connection_peers
                    .entry(connection)
                    .or_default()
                    .insert(peer.clone());
            }
            info!("Peer {} created", peer);
        }

        let members = self.room_members.entry(room.clone()).or_insert_with(|| {
            info!("Room {} created", room);
            HashSet::new()
        });

        if !members.insert(peer.clone()) {
            debug!("Peer {} already in room {}", peer, room);
            return Vec::new();
        }

        self.peer_rooms
            .entry(peer.clone())
            .or_default()
            .insert(room.clone());

        routing::broadcast_to_room(self, room, Some(peer), raw)
    }

    fn leave(
        &mut self,
        peer: &PeerId,
        room: &RoomId,
        raw: &str,
    ) -> Result<Vec<Delivery>, RegistryError> {
        if !self.peers.contains_key(peer) {
            return Err(RegistryError::UnknownPeer(peer.clone()));
        }
        let Some(members) = self.room_members.get(room) else {
            return Err(RegistryError::UnknownRoom(room.clone()));
        };
        if !members.contains(peer) {
            return Err(RegistryError::NotInRoom {
                peer: peer.clone(),
                room: room.clone(),
            });
        }

        self.unlink(peer, room);

        Ok(routing::broadcast_to_room(self, room, None, raw))
    }

    /// Tear down every peer announced on `connection`.
    fn close(&mut self, connection: ConnectionId) -> Result<Vec<Delivery>, RegistryError> {
        let Some(peers) = self.connection_peers.get(&connection) else {
            return Err(RegistryError::UnknownConnection(connection));
        };

        let mut peers: Vec<PeerId> = peers.iter().cloned().collect();
        peers.sort();

        let mut deliveries = Vec::new();
        for peer in peers {
            for room in self.rooms_of(peer.as_str()) {
                self.unlink(&peer, &room);

                let notice = Command::Leave {
                    peer: PeerDescriptor { id: peer.clone() },
                    room: RoomDescriptor { room: room.clone() },
                }
                .encode();

                deliveries.extend(
                    routing::broadcast_to_room(self, &room, None, &notice)
                        .into_iter()
                        .filter(|delivery| delivery.connection != connection),
                );
            }
        }

        Ok(deliveries)
    }

    fn unlink(&mut self, peer: &PeerId, room: &RoomId) {
        if let Some(members) = self.room_members.get_mut(room) {
            members.remove(peer);
            if members.is_empty() {
                self.room_members.remove(room);
                info!("Room {} destroyed", room);
            }
        }

        let now_roomless = match self.peer_rooms.get_mut(peer) {
            Some(rooms) => {
                rooms.remove(room);
                rooms.is_empty()
            }
            None => true,
        };

        if now_roomless {
            self.remove_peer(peer);
        }
    }

    fn remove_peer(&mut self, peer: &PeerId) {
        self.peer_rooms.remove(peer);

        let Some(removed) = self.peers.remove(peer) else {
            return;
        };

        if let Some(connection) = removed.connection
            && let Some(peers) = self.connection_peers.get_mut(&connection)
        {
            peers.remove(&removed.id);
            if peers.is_empty() {
                self.connection_peers.remove(&connection);
            }
        }

        info!("Peer {} destroyed", removed.id);
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn room_count(&self) -> usize {
        self.room_members.len()
    }

    pub fn contains_peer(&self, peer: &str) -> bool {
        self.peers.contains_key(peer)
    }

    pub fn contains_room(&self, room: &str) -> bool {
        self.room_members.contains_key(room)
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty() && self.room_members.is_empty()
    }

    /// Members of `room`, sorted.
    pub fn members_of(&self, room: &str) -> Vec<PeerId> {
        let mut members: Vec<PeerId> = self
            .room_members
            .get(room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    /// Rooms `peer` occupies, sorted.
    pub fn rooms_of(&self, peer: &str) -> Vec<RoomId> {
        let mut rooms: Vec<RoomId> = self
            .peer_rooms
            .get(peer)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    pub fn connection_of(&self, peer: &str) -> Option<ConnectionId> {
        self.peers.get(peer).and_then(|p| p.connection)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            rooms: self
                .room_members
                .iter()
                .map(|(room, members)| (room.clone(), members.iter().cloned().collect()))
                .collect(),
            peers: self
                .peer_rooms
                .iter()
                .map(|(peer, rooms)| (peer.clone(), rooms.iter().cloned().collect()))
                .collect(),
        }
    }

    /// Checks that both membership indices mirror each other and that no
    /// empty peer, room or connection entry is left behind.
    pub fn is_consistent(&self) -> bool {
        let rooms_mirrored = self.room_members.iter().all(|(room, members)| {
            !members.is_empty()
                && members.iter().all(|peer| {
                    self.peer_rooms
                        .get(peer)
                        .is_some_and(|rooms| rooms.contains(room))
                })
        });

        let peers_mirrored = self.peer_rooms.iter().all(|(peer, rooms)| {
            !rooms.is_empty()
                && self.peers.contains_key(peer)
                && rooms.iter().all(|room| {
                    self.room_members
                        .get(room)
                        .is_some_and(|members| members.contains(peer))
                })
        });

        let connections_tracked = self.connection_peers.iter().all(|(connection, peers)| {
            !peers.is_empty()
                && peers
                    .iter()
                    .all(|peer| self.connection_of(peer.as_str()) == Some(*connection))
        });

        rooms_mirrored
            && peers_mirrored
            && connections_tracked
            && self.peers.len() == self.peer_rooms.len()
    }
}
