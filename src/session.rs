//! Controller session lifecycle
//!
//! Gesture control is unreliable: occlusion and lighting produce frequent
//! false negatives. The machine biases toward graceful continuation: a
//! paused session resumes through Countdown on renewed visibility and never
//! demands a fresh high-five.

use crate::ws::protocol::{PlayStatus, SessionStatus};

/// Countdown duration before play starts
pub const COUNTDOWN_SECS: f64 = 5.0;

/// Hands-absent grace period while playing before a forced countdown
pub const HANDS_TIMEOUT_SECS: f64 = 10.0;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for an unambiguous start gesture
    WaitingForStart,
    /// Counting down; requires continuous hand visibility
    Countdown,
    /// Live gesture control
    Playing,
}

/// Transition notifications surfaced to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// High-five seen; countdown begins
    CountdownStarted,
    /// Countdown elapsed under continuous visibility; play begins
    Started,
    /// Hands lost past the timeout; back to Countdown, histories must be
    /// cleared by the caller
    Paused,
    /// Hands reappeared within the grace period; no phase change
    HandsRegained,
}

impl SessionEvent {
    /// Status notification for the games, when the event carries one
    pub fn status(&self) -> Option<SessionStatus> {
        match self {
            Self::Started => Some(SessionStatus {
                status: PlayStatus::Playing,
                message: "Game started - flick away!".to_string(),
            }),
            Self::Paused => Some(SessionStatus {
                status: PlayStatus::Paused,
                message: "Hands lost - show hands to resume".to_string(),
            }),
            Self::CountdownStarted | Self::HandsRegained => None,
        }
    }
}

/// Per-controller session state machine
#[derive(Debug, Clone)]
pub struct SessionMachine {
    phase: SessionPhase,
    /// Most recent countdown (re)start
    countdown_start: f64,
    /// When hands disappeared during play, if they are currently gone
    hands_gone_at: Option<f64>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::WaitingForStart,
            countdown_start: 0.0,
            hands_gone_at: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Advance the machine one frame.
    ///
    /// `hands_visible` is whether the detector reported any hand this frame;
    /// `saw_high_five` is whether any reported hand classified as an open
    /// palm.
    pub fn update(
        &mut self,
        hands_visible: bool,
        saw_high_five: bool,
        now: f64,
    ) -> Option<SessionEvent> {
        match self.phase {
            SessionPhase::WaitingForStart => {
                if saw_high_five {
                    self.phase = SessionPhase::Countdown;
                    self.countdown_start = now;
                    return Some(SessionEvent::CountdownStarted);
                }
                None
            }

            SessionPhase::Countdown => {
                if !hands_visible {
                    // Completion requires an unbroken run of visible frames
                    self.countdown_start = now;
                    return None;
                }
                if now - self.countdown_start >= COUNTDOWN_SECS {
                    self.phase = SessionPhase::Playing;
                    self.hands_gone_at = None;
                    return Some(SessionEvent::Started);
                }
                None
            }

            SessionPhase::Playing => {
                if hands_visible {
                    if self.hands_gone_at.take().is_some() {
                        return Some(SessionEvent::HandsRegained);
                    }
                    return None;
                }

                match self.hands_gone_at {
                    None => {
                        self.hands_gone_at = Some(now);
                        None
                    }
                    Some(gone_at) if now - gone_at > HANDS_TIMEOUT_SECS => {
                        self.phase = SessionPhase::Countdown;
                        self.countdown_start = now;
                        self.hands_gone_at = None;
                        Some(SessionEvent::Paused)
                    }
                    Some(_) => None,
                }
            }
        }
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}
