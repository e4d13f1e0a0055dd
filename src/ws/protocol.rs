//! Wire message definitions for the relay
//!
//! Shared by the WebSocket surface, the channel REST surface, and the
//! controller's dispatcher.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::GameKind;
use crate::landmarks::HandLabel;

/// Joystick channel value (single current value, last-write-wins)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JoystickState {
    pub x: f32,
    pub y: f32,
    /// Switch/button state
    pub sw: i32,
}

/// A normalized 2-D screen-space point
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HandPoint {
    pub x: f32,
    pub y: f32,
}

/// Both hand cursor positions
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HandsState {
    pub left: HandPoint,
    pub right: HandPoint,
}

impl Default for HandsState {
    fn default() -> Self {
        // Rest positions: hands at screen thirds
        Self {
            left: HandPoint { x: 0.3, y: 0.5 },
            right: HandPoint { x: 0.7, y: 0.5 },
        }
    }
}

/// Aim target position
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AimState {
    pub x: f32,
    pub y: f32,
}

impl Default for AimState {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

/// An emitted flick gesture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlickEvent {
    /// Horizontal launch velocity
    pub vx: f32,
    /// Upward launch velocity (positive = up)
    pub vy: f32,
    pub magnitude: f32,
    /// Absent for two-phase directional flicks derived from a frozen aim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<HandLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// An emitted punch gesture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PunchEvent {
    pub hand: HandLabel,
    /// Intensity scaled off the trigger threshold, clamped at 3x
    pub power: f32,
    pub velocity_z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// Controller session status as seen by the games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayStatus {
    Waiting,
    Countdown,
    Playing,
    Paused,
}

/// Session status notification (auto start/pause)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub status: PlayStatus,
    pub message: String,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            status: PlayStatus::Waiting,
            message: "Show high-five to start".to_string(),
        }
    }
}

/// Messages sent from a peer to the relay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Join (lazily creating) a room; the first joiner declares the game
    JoinRoom { room: String, game: GameKind },

    /// Leave a room (no-op when not a member)
    LeaveRoom { room: String },

    /// Real-time hand cursor positions, relayed to roommates
    UpdateHands { hands: HandsState },

    /// Score update, relayed to roommates
    UpdateScore { score: i64 },

    /// A punch landed on the opponent
    PunchHit { hand: HandLabel, power: f32 },

    /// Ball state for turn-based games; payload is relayed verbatim
    BallUpdate {
        position: serde_json::Value,
        velocity: serde_json::Value,
    },

    /// Ping for latency measurement
    Ping { t: u64 },
}

/// Messages sent from the relay to peers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Identity assignment on connect
    PlayerId { id: Uuid, player_num: usize },

    /// Reply to the joiner with its ordinal and the current member list
    RoomJoined {
        room: String,
        player_num: usize,
        players: Vec<Uuid>,
    },

    /// A new peer joined the caller's room
    PlayerJoined { id: Uuid, player_num: usize },

    /// A peer left the caller's room
    PlayerLeft { id: Uuid },

    /// Hand positions: room relays carry the sender id, the legacy global
    /// path does not
    OpponentHands {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<Uuid>,
        hands: HandsState,
    },

    /// Global rebroadcast of a flick channel write
    OpponentFlick(FlickEvent),

    /// Global rebroadcast of a punch channel write
    OpponentPunch(PunchEvent),

    /// Session status change (auto start/pause)
    GameStateChange(SessionStatus),

    /// Roommate score change
    ScoreUpdate { id: Uuid, score: i64 },

    /// A roommate's punch landed on the receiver
    GotPunched {
        by: Uuid,
        hand: HandLabel,
        power: f32,
    },

    /// Roommate ball state
    OpponentBall {
        id: Uuid,
        position: serde_json::Value,
        velocity: serde_json::Value,
    },

    /// Pong response
    Pong { t: u64 },
}
