//! HTTP route definitions
//!
//! The request/response surface: one-shot reads and writes of the named
//! channels, plus the preview frame pair and the WebSocket upgrade. Writes
//! to flick/punch/hands/game_state also fan out to every connected peer,
//! the legacy global notification path that coexists with room-scoped
//! relays.

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::app::AppState;
use crate::game::GameKind;
use crate::http::preview::{receive_frame, video_feed};
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;
use crate::ws::protocol::{
    AimState, FlickEvent, HandsState, JoystickState, PunchEvent, ServerMsg, SessionStatus,
};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS: browser games are served from anywhere on the LAN; restrict only
    // when CLIENT_ORIGIN is set (comma-separated origins)
    let allow_origin = match &state.config.client_origin {
        Some(origins) => AllowOrigin::list(
            origins
                .split(',')
                .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok()),
        ),
        None => AllowOrigin::any(),
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .route("/joystick", get(get_joystick).post(update_joystick))
        .route("/flick", get(get_flick).post(receive_flick))
        .route("/punch", get(get_punch).post(receive_punch))
        .route("/aim", get(get_aim).post(receive_aim))
        .route("/hands", get(get_hands).post(receive_hands))
        .route(
            "/game",
            get(get_game).post(register_game).delete(unregister_game),
        )
        .route("/game_state", get(get_game_state).post(update_game_state))
        .route("/video_frame", axum::routing::post(receive_frame))
        .route("/video_feed", get(video_feed))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn ok() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    connected_players: usize,
    rooms: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        connected_players: state.lobby.player_count(),
        rooms: state.lobby.room_count(),
    })
}

// ============================================================================
// Joystick channel
// ============================================================================

async fn update_joystick(
    State(state): State<AppState>,
    Json(value): Json<JoystickState>,
) -> Json<serde_json::Value> {
    state.channels.set_joystick(value);
    ok()
}

async fn get_joystick(State(state): State<AppState>) -> Json<JoystickState> {
    Json(state.channels.joystick())
}

// ============================================================================
// Flick channel (drain-on-read)
// ============================================================================

async fn receive_flick(
    State(state): State<AppState>,
    Json(event): Json<FlickEvent>,
) -> Json<serde_json::Value> {
    info!(vx = event.vx, vy = event.vy, "Flick received");
    state.channels.put_flick(event.clone());
    state.lobby.broadcast_all(ServerMsg::OpponentFlick(event));
    ok()
}

async fn get_flick(State(state): State<AppState>) -> Json<Option<FlickEvent>> {
    Json(state.channels.take_flick())
}

// ============================================================================
// Punch channel (drain-on-read)
// ============================================================================

async fn receive_punch(
    State(state): State<AppState>,
    Json(event): Json<PunchEvent>,
) -> Json<serde_json::Value> {
    info!(hand = event.hand.as_str(), power = event.power, "Punch received");
    state.channels.put_punch(event.clone());
    state.lobby.broadcast_all(ServerMsg::OpponentPunch(event));
    ok()
}

async fn get_punch(State(state): State<AppState>) -> Json<Option<PunchEvent>> {
    Json(state.channels.take_punch())
}

// ============================================================================
// Aim channel
// ============================================================================

async fn receive_aim(
    State(state): State<AppState>,
    Json(value): Json<AimState>,
) -> Json<serde_json::Value> {
    state.channels.set_aim(value);
    ok()
}

async fn get_aim(State(state): State<AppState>) -> Json<AimState> {
    Json(state.channels.aim())
}

// ============================================================================
// Hands channel
// ============================================================================

async fn receive_hands(
    State(state): State<AppState>,
    Json(value): Json<HandsState>,
) -> Json<serde_json::Value> {
    state.channels.set_hands(value);
    state
        .lobby
        .broadcast_all(ServerMsg::OpponentHands { id: None, hands: value });
    ok()
}

async fn get_hands(State(state): State<AppState>) -> Json<HandsState> {
    Json(state.channels.hands())
}

// ============================================================================
// Active game registration
// ============================================================================

#[derive(Deserialize)]
struct GameRequest {
    game: GameKind,
}

#[derive(Serialize)]
struct GameResponse {
    game: Option<GameKind>,
}

async fn register_game(
    State(state): State<AppState>,
    Json(req): Json<GameRequest>,
) -> Json<serde_json::Value> {
    info!(game = req.game.as_str(), "Active game registered");
    state.channels.set_active_game(req.game);
    Json(serde_json::json!({ "status": "ok", "game": req.game }))
}

async fn get_game(State(state): State<AppState>) -> Json<GameResponse> {
    Json(GameResponse {
        game: state.channels.active_game(),
    })
}

async fn unregister_game(State(state): State<AppState>) -> Json<serde_json::Value> {
    if let Some(game) = state.channels.clear_active_game() {
        info!(game = game.as_str(), "Active game closed");
    }
    ok()
}

// ============================================================================
// Session status (auto start/pause)
// ============================================================================

async fn update_game_state(
    State(state): State<AppState>,
    Json(status): Json<SessionStatus>,
) -> Json<serde_json::Value> {
    info!(status = ?status.status, message = %status.message, "Session status");
    state.channels.set_session_status(status.clone());
    state
        .lobby
        .broadcast_all(ServerMsg::GameStateChange(status));
    ok()
}

async fn get_game_state(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.channels.session_status())
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
