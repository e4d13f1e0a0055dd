//! Process-wide channel state store
//!
//! One instance per server process. Each named channel holds a single
//! current value with last-write-wins semantics; the flick and punch
//! channels are one-shot mailboxes whose read drains the stored value.
//! All fields share one mutex domain, so a reader can never observe a torn
//! value.

use parking_lot::Mutex;

use crate::game::GameKind;
use crate::ws::protocol::{
    AimState, FlickEvent, HandsState, JoystickState, PunchEvent, SessionStatus,
};

#[derive(Debug, Default)]
struct ChannelValues {
    joystick: JoystickState,
    flick: Option<FlickEvent>,
    punch: Option<PunchEvent>,
    aim: AimState,
    hands: HandsState,
    active_game: Option<GameKind>,
    session_status: Option<SessionStatus>,
}

/// Last-known-value store for the request/response surface
#[derive(Debug, Default)]
pub struct ChannelStore {
    inner: Mutex<ChannelValues>,
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_joystick(&self, value: JoystickState) {
        self.inner.lock().joystick = value;
    }

    pub fn joystick(&self) -> JoystickState {
        self.inner.lock().joystick
    }

    pub fn put_flick(&self, event: FlickEvent) {
        self.inner.lock().flick = Some(event);
    }

    /// Read-and-clear: the stored flick is consumed by the first reader
    pub fn take_flick(&self) -> Option<FlickEvent> {
        self.inner.lock().flick.take()
    }

    pub fn put_punch(&self, event: PunchEvent) {
        self.inner.lock().punch = Some(event);
    }

    /// Read-and-clear: the stored punch is consumed by the first reader
    pub fn take_punch(&self) -> Option<PunchEvent> {
        self.inner.lock().punch.take()
    }

    pub fn set_aim(&self, value: AimState) {
        self.inner.lock().aim = value;
    }

    pub fn aim(&self) -> AimState {
        self.inner.lock().aim
    }

    pub fn set_hands(&self, value: HandsState) {
        self.inner.lock().hands = value;
    }

    pub fn hands(&self) -> HandsState {
        self.inner.lock().hands
    }

    pub fn set_active_game(&self, game: GameKind) {
        self.inner.lock().active_game = Some(game);
    }

    pub fn clear_active_game(&self) -> Option<GameKind> {
        self.inner.lock().active_game.take()
    }

    pub fn active_game(&self) -> Option<GameKind> {
        self.inner.lock().active_game
    }

    pub fn set_session_status(&self, status: SessionStatus) {
        self.inner.lock().session_status = Some(status);
    }

    /// Current session status; defaults to "waiting" before the first write
    pub fn session_status(&self) -> SessionStatus {
        self.inner
            .lock()
            .session_status
            .clone()
            .unwrap_or_default()
    }
}
