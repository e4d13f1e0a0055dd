//! FlickFury - webcam gesture control for browser arcade games
//!
//! Two halves share this crate:
//! - the **relay server** (`flickfury-server`): room-based multiplayer
//!   fan-out plus a process-wide last-known-value channel store, and
//! - the **gesture controller** (`flickfury-controller`): turns a stream of
//!   hand-landmark frames into debounced flick/punch/aim events and fires
//!   them at the relay.

pub mod app;
pub mod channels;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod game;
pub mod gesture;
pub mod http;
pub mod landmarks;
pub mod lobby;
pub mod session;
pub mod tracker;
pub mod util;
pub mod ws;
