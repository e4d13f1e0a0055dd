//! Game kinds and the gesture gating table

use serde::{Deserialize, Serialize};

/// Games the relay knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Basketball,
    Boxing,
    Minigolf,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basketball => "basketball",
            Self::Boxing => "boxing",
            Self::Minigolf => "minigolf",
        }
    }
}

/// How the controller maps hands to the active game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Left hand aims, right hand flicks
    TwoHand,
    /// Right hand aims, fist locks the target, flick commits
    TwoPhase,
    /// Both hands are cursors
    Cursor,
}

/// Gesture kinds enabled for a game, resolved once per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameControls {
    pub flick: bool,
    pub punch: bool,
    pub aim: bool,
    pub hands: bool,
    pub scheme: Scheme,
}

impl GameControls {
    /// No game active: every classifier is gated off
    pub const NONE: GameControls = GameControls {
        flick: false,
        punch: false,
        aim: false,
        hands: false,
        scheme: Scheme::Cursor,
    };
}

impl GameKind {
    /// Static control table per game kind
    pub const fn controls(self) -> GameControls {
        match self {
            Self::Basketball => GameControls {
                flick: true,
                punch: false,
                aim: true,
                hands: true,
                scheme: Scheme::TwoHand,
            },
            Self::Boxing => GameControls {
                flick: false,
                punch: true,
                aim: false,
                hands: true,
                scheme: Scheme::Cursor,
            },
            Self::Minigolf => GameControls {
                flick: true,
                punch: false,
                aim: true,
                hands: true,
                scheme: Scheme::TwoPhase,
            },
        }
    }
}

/// Controls for an optional active game
pub fn controls_for(game: Option<GameKind>) -> GameControls {
    match game {
        Some(kind) => kind.controls(),
        None => GameControls::NONE,
    }
}
