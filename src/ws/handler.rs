//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::lobby::PeerSender;
use crate::util::rate_limit::PeerRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler. Any client may connect; identity is assigned,
/// not authenticated.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Outbox: lobby/broadcast messages -> writer task -> WebSocket
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<ServerMsg>();
    let player_id = state.lobby.connect(outbox.clone());

    let writer_id = player_id;
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!(player_id = %writer_id, error = %e, "Failed to encode server message");
                    continue;
                }
            };
            if ws_sink.send(Message::Text(json)).await.is_err() {
                debug!(player_id = %writer_id, "WebSocket send failed");
                break;
            }
        }
    });

    let rate_limiter = PeerRateLimiter::new();

    // Reader loop: WebSocket -> lobby
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_message() {
                    warn!(player_id = %player_id, "Rate limited peer message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => dispatch(&state, player_id, &outbox, msg),
                    Err(e) => {
                        warn!(player_id = %player_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Reactive cleanup: a dropped connection is detected here, not proactively
    writer_handle.abort();
    state.lobby.disconnect(player_id);

    info!(player_id = %player_id, "WebSocket connection closed");
}

/// Route a parsed client message into the lobby
fn dispatch(state: &AppState, player_id: Uuid, outbox: &PeerSender, msg: ClientMsg) {
    match msg {
        ClientMsg::JoinRoom { room, game } => state.lobby.join_room(player_id, &room, game),
        ClientMsg::LeaveRoom { room } => state.lobby.leave_room(player_id, &room),
        ClientMsg::UpdateHands { hands } => state.lobby.update_hands(player_id, hands),
        ClientMsg::UpdateScore { score } => state.lobby.update_score(player_id, score),
        ClientMsg::PunchHit { hand, power } => state.lobby.punch_hit(player_id, hand, power),
        ClientMsg::BallUpdate { position, velocity } => {
            state.lobby.ball_update(player_id, position, velocity)
        }
        ClientMsg::Ping { t } => {
            let _ = outbox.send(ServerMsg::Pong { t });
        }
    }
}
