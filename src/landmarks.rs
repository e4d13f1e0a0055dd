//! Hand-landmark input boundary
//!
//! The landmark detector is an external process. It pipes one JSON record per
//! captured frame into the controller's stdin: zero or more hands, each a
//! labeled 21-point landmark set with normalized x/y in [0, 1] and a signed
//! depth proxy for z.

use serde::{Deserialize, Serialize};

/// Hand label as reported by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandLabel {
    Left,
    Right,
}

impl HandLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

/// A single 3-D landmark point
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One detected hand in a frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandFrame {
    pub label: HandLabel,
    pub landmarks: Vec<Landmark>,
}

impl HandFrame {
    /// The index fingertip is the hand's tracking point for position,
    /// velocity, and cursors.
    pub fn tracking_point(&self) -> Option<Landmark> {
        self.landmarks.get(index::INDEX_FINGER_TIP).copied()
    }
}

/// One frame from the detector: possibly empty hand set plus an optional
/// capture timestamp in seconds (monotonic clock substituted when absent)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameInput {
    #[serde(default)]
    pub t: Option<f64>,
    #[serde(default)]
    pub hands: Vec<HandFrame>,
    /// Optional base64 JPEG of the annotated frame, passed through to the
    /// relay's preview channel untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
}

/// Landmark indices for the 21-point hand model
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;

    /// Full landmark count reported per hand
    pub const LANDMARK_COUNT: usize = 21;
}
