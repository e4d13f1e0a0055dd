//! Fire-and-forget event dispatcher
//!
//! Gesture control must never block the frame loop on network conditions.
//! Every outbound call is spawned with a short deadline and all outcomes
//! (success, timeout, refused, non-2xx) are swallowed: a dropped continuous
//! update is superseded by the next frame, a dropped one-shot event is lost
//! and that is acceptable at frame rate.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::ControllerConfig;
use crate::controller::ControlOutput;
use crate::game::GameKind;
use crate::util::rate_limit::{create_limiter, Limiter, STREAM_RATE_LIMIT};
use crate::ws::protocol::{AimState, FlickEvent, HandsState, PunchEvent, SessionStatus};

/// Deadline for continuous streams (aim/hands/frame)
const STREAM_TIMEOUT: Duration = Duration::from_millis(20);
/// Deadline for discrete gesture events
const GESTURE_TIMEOUT: Duration = Duration::from_millis(100);
/// Deadline for session status notifications
const STATUS_TIMEOUT: Duration = Duration::from_millis(50);
/// Deadline for the active-game query
const QUERY_TIMEOUT: Duration = Duration::from_millis(100);
/// Cadence of the background active-game poller
const GAME_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Rate-limited, best-effort sender of controller events to the relay
#[derive(Clone)]
pub struct EventDispatcher {
    client: Client,
    base_url: Arc<str>,
    aim_limiter: Arc<Limiter>,
    hands_limiter: Arc<Limiter>,
    frame_limiter: Arc<Limiter>,
}

impl EventDispatcher {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: Arc::from(config.relay_url.as_str()),
            aim_limiter: create_limiter(STREAM_RATE_LIMIT),
            hands_limiter: create_limiter(STREAM_RATE_LIMIT),
            frame_limiter: create_limiter(STREAM_RATE_LIMIT),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Spawn a send and forget it. The deadline bounds the suspension; no
    /// retry, no backoff, no error surfaces past a debug log.
    fn post<T: Serialize>(&self, path: &str, body: &T, deadline: Duration) {
        let url = self.url(path);
        let request = self.client.post(&url).timeout(deadline).json(body);
        tokio::spawn(async move {
            if let Err(e) = request.send().await {
                debug!(url = %url, error = %e, "Dropped outbound event");
            }
        });
    }

    /// Route a pipeline output to its channel
    pub fn dispatch(&self, output: ControlOutput) {
        match output {
            ControlOutput::Flick(event) => self.send_flick(event),
            ControlOutput::Punch(event) => self.send_punch(event),
            ControlOutput::Aim(aim) => self.send_aim(aim),
            ControlOutput::Hands(hands) => self.send_hands(hands),
            ControlOutput::Status(status) => self.send_session_status(status),
        }
    }

    pub fn send_flick(&self, event: FlickEvent) {
        info!(vx = event.vx, vy = event.vy, "Flick!");
        self.post("/flick", &event, GESTURE_TIMEOUT);
    }

    pub fn send_punch(&self, event: PunchEvent) {
        info!(hand = event.hand.as_str(), power = event.power, "Punch!");
        self.post("/punch", &event, GESTURE_TIMEOUT);
    }

    pub fn send_aim(&self, aim: AimState) {
        if self.aim_limiter.check().is_ok() {
            self.post("/aim", &aim, STREAM_TIMEOUT);
        }
    }

    pub fn send_hands(&self, hands: HandsState) {
        if self.hands_limiter.check().is_ok() {
            self.post("/hands", &hands, STREAM_TIMEOUT);
        }
    }

    pub fn send_session_status(&self, status: SessionStatus) {
        info!(status = ?status.status, "Session status change");
        self.post("/game_state", &status, STATUS_TIMEOUT);
    }

    /// Forward a pre-encoded preview frame for browser monitoring
    pub fn send_frame(&self, frame_b64: String) {
        if self.frame_limiter.check().is_ok() {
            self.post(
                "/video_frame",
                &serde_json::json!({ "frame": frame_b64 }),
                STREAM_TIMEOUT,
            );
        }
    }

    /// One-shot active-game query; any failure reads as "no game"
    pub async fn fetch_active_game(&self) -> Option<GameKind> {
        #[derive(Deserialize)]
        struct GameResponse {
            game: Option<GameKind>,
        }

        let response = self
            .client
            .get(self.url("/game"))
            .timeout(QUERY_TIMEOUT)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        response
            .json::<GameResponse>()
            .await
            .ok()
            .and_then(|r| r.game)
    }

    /// Spawn a background poller caching the active game so the frame loop
    /// reads it without ever waiting on the network. The task exits when the
    /// last receiver is dropped.
    pub fn spawn_game_poller(&self) -> watch::Receiver<Option<GameKind>> {
        let (tx, rx) = watch::channel(None);
        let dispatcher = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(GAME_POLL_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let game = dispatcher.fetch_active_game().await;
                if tx.send(game).is_err() {
                    break;
                }
            }
        });

        rx
    }
}
