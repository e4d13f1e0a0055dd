//! Time utilities shared by the server and the controller

use std::time::Instant;

/// Process start time for uptime tracking and monotonic gesture clocks
static PROCESS_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize process start time (call once at startup)
pub fn init_process_time() {
    PROCESS_START.get_or_init(Instant::now);
}

/// Get process uptime in seconds
pub fn uptime_secs() -> u64 {
    PROCESS_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Monotonic seconds since process start.
///
/// Gesture cooldowns and the session machine compare timestamps from this
/// clock; frame records that arrive without their own timestamp fall back to
/// it as well.
pub fn monotonic_secs() -> f64 {
    PROCESS_START
        .get_or_init(Instant::now)
        .elapsed()
        .as_secs_f64()
}
