//! Gesture classifiers
//!
//! Posture classifiers (high-five, fist) look only at the current landmark
//! set. Motion detectors (flick, punch) consume the tracked velocity and a
//! per-hand cooldown clock; the clock is stamped exactly once per emitted
//! event.

use crate::landmarks::{index, HandLabel, Landmark};
use crate::tracker::{HandTrack, Vec3};
use crate::ws::protocol::{FlickEvent, PunchEvent};

/// Minimum upward speed (normalized units/s) to register a flick
pub const FLICK_VELOCITY_THRESHOLD: f32 = 0.5;
/// Minimum time between two flicks on the same hand
pub const FLICK_COOLDOWN_SECS: f64 = 0.5;

/// Minimum toward-camera speed to register a punch
pub const PUNCH_Z_THRESHOLD: f32 = 0.2;
/// Minimum time between two punches on the same hand
pub const PUNCH_COOLDOWN_SECS: f64 = 0.2;
/// Punch power is linear in forward speed, capped here
pub const MAX_PUNCH_POWER: f32 = 3.0;

/// Fingertip/reference-joint pairs for the open-palm check.
/// The thumb compares against its IP joint, the fingers against their PIP.
const EXTENSION_PAIRS: [(usize, usize); 5] = [
    (index::THUMB_TIP, index::THUMB_IP),
    (index::INDEX_FINGER_TIP, index::INDEX_FINGER_PIP),
    (index::MIDDLE_FINGER_TIP, index::MIDDLE_FINGER_PIP),
    (index::RING_FINGER_TIP, index::RING_FINGER_PIP),
    (index::PINKY_TIP, index::PINKY_PIP),
];

/// Non-thumb pairs for the fist check
const CURL_PAIRS: [(usize, usize); 4] = [
    (index::INDEX_FINGER_TIP, index::INDEX_FINGER_PIP),
    (index::MIDDLE_FINGER_TIP, index::MIDDLE_FINGER_PIP),
    (index::RING_FINGER_TIP, index::RING_FINGER_PIP),
    (index::PINKY_TIP, index::PINKY_PIP),
];

/// Open palm: at least 4 of 5 fingertips above (smaller y than) their
/// reference joint. Tolerates one mis-tracked digit.
pub fn is_high_five(landmarks: &[Landmark]) -> bool {
    let extended = EXTENSION_PAIRS
        .iter()
        .filter(|&&(tip, joint)| match (landmarks.get(tip), landmarks.get(joint)) {
            (Some(t), Some(j)) => t.y < j.y,
            _ => false,
        })
        .count();
    extended >= 4
}

/// Closed hand: at least 3 of 4 non-thumb fingertips below their PIP joint
pub fn is_fist(landmarks: &[Landmark]) -> bool {
    let curled = CURL_PAIRS
        .iter()
        .filter(|&&(tip, joint)| match (landmarks.get(tip), landmarks.get(joint)) {
            (Some(t), Some(j)) => t.y > j.y,
            _ => false,
        })
        .count();
    curled >= 3
}

/// Detect an upward flick from the hand's current velocity.
///
/// Image-space y grows downward, so upward speed is `-velocity.y`. On
/// trigger the hand's flick cooldown clock is reset to `now`.
pub fn detect_flick(
    velocity: Vec3,
    track: &mut HandTrack,
    label: HandLabel,
    now: f64,
) -> Option<FlickEvent> {
    if now - track.last_flick < FLICK_COOLDOWN_SECS {
        return None;
    }

    let upward = -velocity.y;
    let horizontal = velocity.x;

    if upward > FLICK_VELOCITY_THRESHOLD {
        track.last_flick = now;
        Some(FlickEvent {
            vx: horizontal,
            vy: upward,
            magnitude: (horizontal * horizontal + upward * upward).sqrt(),
            hand: Some(label),
            timestamp: Some(now),
        })
    } else {
        None
    }
}

/// Detect a forward punch from the hand's current velocity.
///
/// Depth decreases toward the camera, so forward speed is `-velocity.z`.
/// Power scales linearly off the threshold and clamps at 3x.
pub fn detect_punch(
    velocity: Vec3,
    track: &mut HandTrack,
    label: HandLabel,
    now: f64,
) -> Option<PunchEvent> {
    if now - track.last_punch < PUNCH_COOLDOWN_SECS {
        return None;
    }

    let forward = -velocity.z;

    if forward > PUNCH_Z_THRESHOLD {
        track.last_punch = now;
        Some(PunchEvent {
            hand: label,
            power: (forward / PUNCH_Z_THRESHOLD).min(MAX_PUNCH_POWER),
            velocity_z: forward,
            timestamp: Some(now),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Tracker;

    /// Build a 21-point hand with the given fingertips raised above their
    /// reference joints; all joints sit at y = 0.5
    fn hand_with_extended(extended: &[usize]) -> Vec<Landmark> {
        let mut lm = vec![
            Landmark {
                x: 0.5,
                y: 0.5,
                z: 0.0
            };
            index::LANDMARK_COUNT
        ];
        for &(tip, _) in EXTENSION_PAIRS.iter() {
            // Default: curled (tip below joint)
            lm[tip].y = 0.6;
        }
        for &tip in extended {
            lm[tip].y = 0.3;
        }
        lm
    }

    #[test]
    fn high_five_needs_four_extended() {
        let open = hand_with_extended(&[
            index::THUMB_TIP,
            index::INDEX_FINGER_TIP,
            index::MIDDLE_FINGER_TIP,
            index::RING_FINGER_TIP,
            index::PINKY_TIP,
        ]);
        assert!(is_high_five(&open));

        // One mis-tracked digit tolerated
        let four = hand_with_extended(&[
            index::INDEX_FINGER_TIP,
            index::MIDDLE_FINGER_TIP,
            index::RING_FINGER_TIP,
            index::PINKY_TIP,
        ]);
        assert!(is_high_five(&four));

        // Exactly three extended must not classify
        let three = hand_with_extended(&[
            index::INDEX_FINGER_TIP,
            index::MIDDLE_FINGER_TIP,
            index::RING_FINGER_TIP,
        ]);
        assert!(!is_high_five(&three));
    }

    #[test]
    fn short_landmark_list_never_panics() {
        assert!(!is_high_five(&[]));
        assert!(!is_fist(&[Landmark::default(); 5]));
    }

    #[test]
    fn fist_needs_three_curled() {
        // All fingertips below their PIPs
        let fist = hand_with_extended(&[]);
        assert!(is_fist(&fist));

        // Only index and middle curled
        let partial = hand_with_extended(&[index::RING_FINGER_TIP, index::PINKY_TIP]);
        assert!(!is_fist(&partial));
    }

    #[test]
    fn flick_triggers_on_upward_velocity() {
        let mut tracker = Tracker::new();
        let track = tracker.track_mut(HandLabel::Right);

        // Rising hand: vy = -3.0, so upward speed is 3.0
        let flick = detect_flick(Vec3::new(0.2, -3.0, 0.0), track, HandLabel::Right, 1.0)
            .expect("flick above threshold");
        assert!((flick.vy - 3.0).abs() < 1e-5);
        assert!((flick.vx - 0.2).abs() < 1e-5);
        assert!((flick.magnitude - (0.04f32 + 9.0).sqrt()).abs() < 1e-4);
        assert_eq!(flick.hand, Some(HandLabel::Right));
    }

    #[test]
    fn flick_cooldown_suppresses_second_event() {
        let mut tracker = Tracker::new();
        let track = tracker.track_mut(HandLabel::Left);
        let v = Vec3::new(0.0, -2.0, 0.0);

        assert!(detect_flick(v, track, HandLabel::Left, 1.0).is_some());
        // Within cooldown: suppressed regardless of magnitude
        assert!(detect_flick(Vec3::new(0.0, -50.0, 0.0), track, HandLabel::Left, 1.3).is_none());
        // After cooldown: accepted again
        assert!(detect_flick(v, track, HandLabel::Left, 1.6).is_some());
    }

    #[test]
    fn slow_rise_is_not_a_flick() {
        let mut tracker = Tracker::new();
        let track = tracker.track_mut(HandLabel::Right);
        assert!(detect_flick(Vec3::new(0.0, -0.4, 0.0), track, HandLabel::Right, 1.0).is_none());
        // No cooldown consumed by a non-event
        assert_eq!(track.last_flick, f64::NEG_INFINITY);
    }

    #[test]
    fn punch_power_is_clamped() {
        let mut tracker = Tracker::new();
        let track = tracker.track_mut(HandLabel::Right);

        // forward = 0.3 gives power 1.5
        let punch = detect_punch(Vec3::new(0.0, 0.0, -0.3), track, HandLabel::Right, 1.0)
            .expect("punch above threshold");
        assert!((punch.power - 1.5).abs() < 1e-5);

        // Past cooldown, absurd speed clamps at 3x
        let punch = detect_punch(Vec3::new(0.0, 0.0, -9.0), track, HandLabel::Right, 2.0)
            .expect("punch above threshold");
        assert!((punch.power - MAX_PUNCH_POWER).abs() < 1e-6);
    }

    #[test]
    fn punch_cooldown_per_hand() {
        let mut tracker = Tracker::new();
        let v = Vec3::new(0.0, 0.0, -0.5);

        let right = tracker.track_mut(HandLabel::Right);
        assert!(detect_punch(v, right, HandLabel::Right, 1.0).is_some());
        assert!(detect_punch(v, right, HandLabel::Right, 1.1).is_none());

        // The other hand's cooldown is independent
        let left = tracker.track_mut(HandLabel::Left);
        assert!(detect_punch(v, left, HandLabel::Left, 1.1).is_some());
    }
}
