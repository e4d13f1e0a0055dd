//! Preview frame channel
//!
//! The controller posts its latest processed frame as a base64 JPEG; viewers
//! stream it back out as multipart MJPEG. Monitoring only: no game logic
//! reads this channel, and only the latest frame is retained.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::watch;

use crate::app::AppState;
use crate::http::routes::AppError;

/// Latest-frame slot shared between the ingest and streaming handlers
#[derive(Debug)]
pub struct PreviewChannel {
    tx: watch::Sender<Option<Bytes>>,
}

impl PreviewChannel {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Replace the latest frame; stale frames are simply overwritten
    pub fn publish(&self, frame: Bytes) {
        let _ = self.tx.send(Some(frame));
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Bytes>> {
        self.tx.subscribe()
    }
}

impl Default for PreviewChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
pub struct FramePayload {
    /// Base64-encoded JPEG bytes
    pub frame: String,
}

/// POST /video_frame - ingest the controller's latest preview frame
pub async fn receive_frame(
    State(state): State<AppState>,
    Json(payload): Json<FramePayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let jpeg = BASE64
        .decode(payload.frame.as_bytes())
        .map_err(|_| AppError::BadRequest("invalid base64 frame".to_string()))?;

    state.preview.publish(Bytes::from(jpeg));
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// GET /video_feed - stream the latest frames as multipart MJPEG
pub async fn video_feed(State(state): State<AppState>) -> Response {
    let rx = state.preview.subscribe();
    let frames = futures::stream::unfold(rx, |mut rx| async move {
        rx.changed().await.ok()?;
        let frame = rx.borrow_and_update().clone();
        Some((frame, rx))
    })
    .filter_map(|frame| async move {
        let jpeg = frame?;
        let mut part = Vec::with_capacity(jpeg.len() + 64);
        part.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
        part.extend_from_slice(&jpeg);
        part.extend_from_slice(b"\r\n");
        Some(Ok::<_, std::convert::Infallible>(Bytes::from(part)))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            "multipart/x-mixed-replace; boundary=frame",
        )
        .body(Body::from_stream(frames))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_overwrites_previous_frame() {
        let channel = PreviewChannel::new();
        let mut rx = channel.subscribe();

        channel.publish(Bytes::from_static(b"one"));
        channel.publish(Bytes::from_static(b"two"));

        // Watch semantics: only the latest frame is observable
        let latest = rx.borrow_and_update().clone().unwrap();
        assert_eq!(&latest[..], b"two");
    }
}
