//! Player directory and room table
//!
//! Both tables live behind one lock so a player's `room` field and the
//! room's member list can never disagree. Peer outboxes are kept separately;
//! a send to a dead peer is ignored and the entry is reaped when the
//! connection's disconnect runs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::game::GameKind;
use crate::landmarks::HandLabel;
use crate::ws::protocol::{HandsState, ServerMsg};

/// Outbound message channel for one connected peer
pub type PeerSender = mpsc::UnboundedSender<ServerMsg>;

/// A connected peer
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub room: Option<String>,
    pub score: i64,
    pub hands: HandsState,
    pub connected_at: DateTime<Utc>,
}

/// A multiplayer room. Created lazily on first join, retained (inert) at
/// zero members until process restart.
#[derive(Debug, Clone)]
pub struct Room {
    pub game: GameKind,
    pub members: Vec<Uuid>,
    /// Shared game state blob, opaque to the relay
    pub state: serde_json::Value,
}

impl Room {
    fn new(game: GameKind) -> Self {
        Self {
            game,
            members: Vec::new(),
            state: serde_json::json!({ "scores": {}, "turn": 0 }),
        }
    }
}

#[derive(Default)]
struct LobbyTables {
    players: HashMap<Uuid, Player>,
    rooms: HashMap<String, Room>,
}

/// Room/player directory plus broadcast routing
pub struct Lobby {
    tables: RwLock<LobbyTables>,
    peers: DashMap<Uuid, PeerSender>,
}

impl Lobby {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(LobbyTables::default()),
            peers: DashMap::new(),
        }
    }

    pub fn player_count(&self) -> usize {
        self.tables.read().players.len()
    }

    pub fn room_count(&self) -> usize {
        self.tables.read().rooms.len()
    }

    /// Register a new connection. Assigns an id and ordinal, and delivers
    /// the identity message through the peer's own outbox.
    pub fn connect(&self, sender: PeerSender) -> Uuid {
        let id = Uuid::new_v4();
        self.peers.insert(id, sender);

        let player_num = {
            let mut tables = self.tables.write();
            let num = tables.players.len() + 1;
            tables.players.insert(
                id,
                Player {
                    id,
                    name: format!("Player {}", num),
                    room: None,
                    score: 0,
                    hands: HandsState::default(),
                    connected_at: Utc::now(),
                },
            );
            num
        };

        self.send_to(id, ServerMsg::PlayerId { id, player_num });
        info!(player_id = %id, player_num, "Player connected");
        id
    }

    /// Remove a departing peer from the directory and its room, and notify
    /// the remaining room members.
    pub fn disconnect(&self, id: Uuid) {
        self.peers.remove(&id);

        let (room_code, members, connected_at) = {
            let mut tables = self.tables.write();
            let Some(player) = tables.players.remove(&id) else {
                return;
            };
            let room_code = player.room.clone();
            let members = room_code
                .as_deref()
                .and_then(|code| tables.rooms.get_mut(code))
                .map(|room| {
                    room.members.retain(|m| *m != id);
                    room.members.clone()
                })
                .unwrap_or_default();
            (room_code, members, player.connected_at)
        };

        for member in &members {
            self.send_to(*member, ServerMsg::PlayerLeft { id });
        }

        let session_secs = (Utc::now() - connected_at).num_seconds();
        info!(player_id = %id, room = ?room_code, session_secs, "Player disconnected");
    }

    /// Join a room, creating it when absent (the first joiner declares the
    /// game kind). Replies to the joiner with its ordinal and the member
    /// list; notifies existing members, never the joiner itself.
    pub fn join_room(&self, id: Uuid, room_code: &str, game: GameKind) {
        let (player_num, members) = {
            let mut tables = self.tables.write();
            if !tables.players.contains_key(&id) {
                return;
            }

            let room = tables
                .rooms
                .entry(room_code.to_string())
                .or_insert_with(|| Room::new(game));

            // Duplicate join is a no-op
            if !room.members.contains(&id) {
                room.members.push(id);
            }
            let members = room.members.clone();

            if let Some(player) = tables.players.get_mut(&id) {
                player.room = Some(room_code.to_string());
            }
            (members.len(), members)
        };

        info!(player_id = %id, room = room_code, player_count = members.len(), "Player joined room");

        self.send_to(
            id,
            ServerMsg::RoomJoined {
                room: room_code.to_string(),
                player_num,
                players: members.clone(),
            },
        );
        for member in members.iter().filter(|m| **m != id) {
            self.send_to(*member, ServerMsg::PlayerJoined { id, player_num });
        }
    }

    /// Leave a room. Leaving a room never joined is a no-op.
    pub fn leave_room(&self, id: Uuid, room_code: &str) {
        let members = {
            let mut tables = self.tables.write();
            let Some(room) = tables.rooms.get_mut(room_code) else {
                return;
            };
            let was_member = room.members.contains(&id);
            room.members.retain(|m| *m != id);
            let members = room.members.clone();

            if let Some(player) = tables.players.get_mut(&id) {
                if player.room.as_deref() == Some(room_code) {
                    player.room = None;
                }
            }

            if !was_member {
                return;
            }
            members
        };

        for member in &members {
            self.send_to(*member, ServerMsg::PlayerLeft { id });
        }
    }

    /// Record a peer's hand positions and relay them to its roommates
    pub fn update_hands(&self, id: Uuid, hands: HandsState) {
        let roommates = {
            let mut tables = self.tables.write();
            let Some(player) = tables.players.get_mut(&id) else {
                return;
            };
            player.hands = hands;
            self.roommates_of(&tables, id)
        };

        self.relay(
            &roommates,
            ServerMsg::OpponentHands {
                id: Some(id),
                hands,
            },
        );
    }

    /// Record a peer's score and relay it to its roommates
    pub fn update_score(&self, id: Uuid, score: i64) {
        let roommates = {
            let mut tables = self.tables.write();
            let Some(player) = tables.players.get_mut(&id) else {
                return;
            };
            player.score = score;
            self.roommates_of(&tables, id)
        };

        self.relay(&roommates, ServerMsg::ScoreUpdate { id, score });
    }

    /// A punch landed: notify the puncher's roommates
    pub fn punch_hit(&self, id: Uuid, hand: HandLabel, power: f32) {
        let roommates = {
            let tables = self.tables.read();
            self.roommates_of(&tables, id)
        };
        self.relay(
            &roommates,
            ServerMsg::GotPunched {
                by: id,
                hand,
                power,
            },
        );
    }

    /// Relay a ball state verbatim to the sender's roommates
    pub fn ball_update(&self, id: Uuid, position: serde_json::Value, velocity: serde_json::Value) {
        let roommates = {
            let tables = self.tables.read();
            self.roommates_of(&tables, id)
        };
        self.relay(
            &roommates,
            ServerMsg::OpponentBall {
                id,
                position,
                velocity,
            },
        );
    }

    /// Broadcast to every connected peer, regardless of room. Used by the
    /// channel REST surface's legacy global notifications.
    pub fn broadcast_all(&self, msg: ServerMsg) {
        for entry in self.peers.iter() {
            let _ = entry.value().send(msg.clone());
        }
    }

    /// Current room members excluding the given peer; empty when roomless
    fn roommates_of(&self, tables: &LobbyTables, id: Uuid) -> Vec<Uuid> {
        tables
            .players
            .get(&id)
            .and_then(|p| p.room.as_deref())
            .and_then(|code| tables.rooms.get(code))
            .map(|room| {
                room.members
                    .iter()
                    .copied()
                    .filter(|m| *m != id)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn relay(&self, targets: &[Uuid], msg: ServerMsg) {
        for target in targets {
            self.send_to(*target, msg.clone());
        }
    }

    fn send_to(&self, id: Uuid, msg: ServerMsg) {
        if let Some(sender) = self.peers.get(&id) {
            if sender.send(msg).is_err() {
                debug!(player_id = %id, "Dropping message for closed peer");
            }
        }
    }
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn connect(lobby: &Lobby) -> (Uuid, UnboundedReceiver<ServerMsg>) {
        let (tx, mut rx) = unbounded_channel();
        let id = lobby.connect(tx);
        // Consume the identity message
        assert!(matches!(rx.try_recv(), Ok(ServerMsg::PlayerId { .. })));
        (id, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerMsg>) -> Vec<ServerMsg> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn first_join_creates_room_and_declares_game() {
        let lobby = Lobby::new();
        let (a, mut rx_a) = connect(&lobby);

        lobby.join_room(a, "ABCD", GameKind::Boxing);
        assert_eq!(lobby.room_count(), 1);

        let msgs = drain(&mut rx_a);
        assert!(matches!(
            &msgs[..],
            [ServerMsg::RoomJoined { room, player_num: 1, players }]
                if room == "ABCD" && players.len() == 1
        ));
    }

    #[test]
    fn second_joiner_notifies_first_but_not_itself() {
        let lobby = Lobby::new();
        let (a, mut rx_a) = connect(&lobby);
        let (b, mut rx_b) = connect(&lobby);

        lobby.join_room(a, "ABCD", GameKind::Boxing);
        drain(&mut rx_a);

        lobby.join_room(b, "ABCD", GameKind::Boxing);

        // First peer hears about the arrival
        let to_a = drain(&mut rx_a);
        assert!(matches!(
            &to_a[..],
            [ServerMsg::PlayerJoined { id, player_num: 2 }] if *id == b
        ));

        // The joiner gets only its RoomJoined reply, no self-notification
        let to_b = drain(&mut rx_b);
        assert!(matches!(
            &to_b[..],
            [ServerMsg::RoomJoined { player_num: 2, players, .. }] if players.len() == 2
        ));
    }

    #[test]
    fn room_relay_excludes_sender_and_other_rooms() {
        let lobby = Lobby::new();
        let (a, mut rx_a) = connect(&lobby);
        let (b, mut rx_b) = connect(&lobby);
        let (c, mut rx_c) = connect(&lobby);

        lobby.join_room(a, "ROOM1", GameKind::Boxing);
        lobby.join_room(b, "ROOM1", GameKind::Boxing);
        lobby.join_room(c, "ROOM2", GameKind::Minigolf);
        drain(&mut rx_a);
        drain(&mut rx_b);
        drain(&mut rx_c);

        lobby.update_hands(a, HandsState::default());

        assert!(drain(&mut rx_a).is_empty(), "sender must not hear itself");
        assert!(matches!(
            &drain(&mut rx_b)[..],
            [ServerMsg::OpponentHands { id: Some(from), .. }] if *from == a
        ));
        assert!(
            drain(&mut rx_c).is_empty(),
            "peers outside the room must not hear room events"
        );
    }

    #[test]
    fn global_broadcast_crosses_rooms() {
        let lobby = Lobby::new();
        let (a, mut rx_a) = connect(&lobby);
        let (b, mut rx_b) = connect(&lobby);
        lobby.join_room(a, "ROOM1", GameKind::Basketball);
        lobby.join_room(b, "ROOM2", GameKind::Minigolf);
        drain(&mut rx_a);
        drain(&mut rx_b);

        lobby.broadcast_all(ServerMsg::OpponentHands {
            id: None,
            hands: HandsState::default(),
        });

        assert_eq!(drain(&mut rx_a).len(), 1);
        assert_eq!(drain(&mut rx_b).len(), 1);
    }

    #[test]
    fn disconnect_cleans_both_tables_and_notifies() {
        let lobby = Lobby::new();
        let (a, mut rx_a) = connect(&lobby);
        let (b, _rx_b) = connect(&lobby);
        lobby.join_room(a, "ABCD", GameKind::Boxing);
        lobby.join_room(b, "ABCD", GameKind::Boxing);
        drain(&mut rx_a);

        lobby.disconnect(b);

        assert_eq!(lobby.player_count(), 1);
        assert!(matches!(
            &drain(&mut rx_a)[..],
            [ServerMsg::PlayerLeft { id }] if *id == b
        ));

        // The emptied-out room is retained
        lobby.disconnect(a);
        assert_eq!(lobby.player_count(), 0);
        assert_eq!(lobby.room_count(), 1);
    }

    #[test]
    fn leave_without_join_is_a_no_op() {
        let lobby = Lobby::new();
        let (a, mut rx_a) = connect(&lobby);
        lobby.leave_room(a, "NEVER");
        assert!(drain(&mut rx_a).is_empty());
    }

    #[test]
    fn duplicate_join_does_not_double_membership() {
        let lobby = Lobby::new();
        let (a, mut rx_a) = connect(&lobby);

        lobby.join_room(a, "ABCD", GameKind::Minigolf);
        lobby.join_room(a, "ABCD", GameKind::Minigolf);
        drain(&mut rx_a);

        lobby.leave_room(a, "ABCD");
        // A single leave fully removes the player
        lobby.update_score(a, 5);
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(lobby.room_count(), 1);
    }

    #[test]
    fn second_joiner_keeps_first_joiners_game_kind() {
        let lobby = Lobby::new();
        let (a, _rx_a) = connect(&lobby);
        let (b, _rx_b) = connect(&lobby);

        lobby.join_room(a, "ABCD", GameKind::Boxing);
        lobby.join_room(b, "ABCD", GameKind::Basketball);

        let tables = lobby.tables.read();
        assert_eq!(tables.rooms.get("ABCD").unwrap().game, GameKind::Boxing);
        assert_eq!(tables.rooms.get("ABCD").unwrap().members.len(), 2);
    }
}
