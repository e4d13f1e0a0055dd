//! FlickFury gesture controller
//!
//! Reads hand-landmark frames as newline-delimited JSON from stdin (piped in
//! by the external detector process), runs the recognition pipeline, and
//! fires the resulting events at the relay server. The loop is strictly
//! sequential per frame; every network send is fire-and-forget so a slow
//! relay can never stall frame processing.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flickfury::config::ControllerConfig;
use flickfury::controller::GesturePipeline;
use flickfury::dispatch::EventDispatcher;
use flickfury::landmarks::FrameInput;
use flickfury::util::time::{init_process_time, monotonic_secs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = ControllerConfig::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize the monotonic gesture clock
    init_process_time();

    info!("Starting FlickFury gesture controller");
    info!("Relay server: {}", config.relay_url);
    info!("Show a HIGH-FIVE (open palm) to start!");

    let dispatcher = EventDispatcher::new(&config);
    let active_game = dispatcher.spawn_game_poller();
    let mut pipeline = GesturePipeline::new();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut frame_count: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let frame: FrameInput = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Skipping malformed frame");
                continue;
            }
        };

        let now = frame.t.unwrap_or_else(monotonic_secs);
        let game = *active_game.borrow();

        for output in pipeline.process_frame(&frame, game, now) {
            dispatcher.dispatch(output);
        }

        if config.preview_enabled {
            if let Some(preview) = frame.frame {
                dispatcher.send_frame(preview);
            }
        }

        frame_count += 1;
    }

    // The detector closing its pipe before the first frame means capture
    // never came up; that is the only fatal condition.
    if frame_count == 0 {
        anyhow::bail!("landmark stream ended before any frame was received (capture device unavailable?)");
    }

    info!(frames = frame_count, "Landmark stream ended, shutting down");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
