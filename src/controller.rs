//! Per-frame gesture pipeline
//!
//! One frame in, bounded classification work, zero or more outputs. The
//! pipeline owns the motion tracker and the session machine; the caller
//! resolves the active game (from the poller cache) and forwards the
//! returned outputs to the dispatcher. No network, no clock reads; both
//! arrive as arguments, which keeps the whole pipeline testable frame by
//! frame.

use tracing::info;

use crate::game::{controls_for, GameKind, Scheme};
use crate::gesture::{detect_flick, detect_punch, is_fist, is_high_five};
use crate::landmarks::{FrameInput, HandFrame, HandLabel};
use crate::session::{SessionEvent, SessionMachine, SessionPhase};
use crate::tracker::{Tracker, Vec3};
use crate::ws::protocol::{AimState, FlickEvent, HandPoint, HandsState, PunchEvent, SessionStatus};

/// One outbound action produced by a frame
#[derive(Debug, Clone)]
pub enum ControlOutput {
    Flick(FlickEvent),
    Punch(PunchEvent),
    Aim(AimState),
    Hands(HandsState),
    Status(SessionStatus),
}

/// The controller's recognition pipeline
pub struct GesturePipeline {
    tracker: Tracker,
    session: SessionMachine,
}

impl GesturePipeline {
    pub fn new() -> Self {
        Self {
            tracker: Tracker::new(),
            session: SessionMachine::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    /// Process one detector frame.
    ///
    /// `active_game` is the relay's registered game (already resolved by the
    /// caller); `now` is the frame timestamp in seconds.
    pub fn process_frame(
        &mut self,
        frame: &FrameInput,
        active_game: Option<GameKind>,
        now: f64,
    ) -> Vec<ControlOutput> {
        let mut outputs = Vec::new();

        let hands_visible = !frame.hands.is_empty();
        let saw_high_five = frame
            .hands
            .iter()
            .any(|hand| is_high_five(&hand.landmarks));

        if let Some(event) = self.session.update(hands_visible, saw_high_five, now) {
            match event {
                SessionEvent::CountdownStarted => {
                    info!("High-five detected, countdown started");
                }
                SessionEvent::Started => info!("Session playing"),
                SessionEvent::Paused => {
                    info!("Hands lost past timeout, session paused");
                    self.tracker.clear_histories();
                }
                SessionEvent::HandsRegained => info!("Hands back"),
            }
            if let Some(status) = event.status() {
                outputs.push(ControlOutput::Status(status));
            }
        }

        if self.session.phase() == SessionPhase::Playing && hands_visible {
            self.classify_hands(frame, active_game, now, &mut outputs);
        }

        outputs
    }

    /// Record and classify every visible hand under the active game's
    /// control table (resolved once per frame).
    fn classify_hands(
        &mut self,
        frame: &FrameInput,
        active_game: Option<GameKind>,
        now: f64,
        outputs: &mut Vec<ControlOutput>,
    ) {
        let controls = controls_for(active_game);
        let mut hands = HandsState::default();

        for hand in &frame.hands {
            let Some(tip) = hand.tracking_point() else {
                continue;
            };

            self.tracker
                .record(hand.label, Vec3::new(tip.x, tip.y, tip.z), now);
            let velocity = self.tracker.velocity(hand.label);

            let point = HandPoint { x: tip.x, y: tip.y };
            match hand.label {
                HandLabel::Left => hands.left = point,
                HandLabel::Right => hands.right = point,
            }

            match controls.scheme {
                Scheme::TwoPhase => {
                    // Single-hand aim-then-commit on the right hand
                    if hand.label == HandLabel::Right && controls.flick {
                        self.two_phase(hand, velocity, point, now, outputs);
                    }
                }
                Scheme::TwoHand => {
                    if hand.label == HandLabel::Left && controls.aim {
                        outputs.push(ControlOutput::Aim(AimState { x: tip.x, y: tip.y }));
                    }
                    if hand.label == HandLabel::Right && controls.flick {
                        let track = self.tracker.track_mut(hand.label);
                        if let Some(flick) = detect_flick(velocity, track, hand.label, now) {
                            outputs.push(ControlOutput::Flick(flick));
                        }
                    }
                }
                Scheme::Cursor => {
                    // Both hands are cursors; positions travel in the hands
                    // update below
                }
            }

            if controls.punch {
                let track = self.tracker.track_mut(hand.label);
                if let Some(punch) = detect_punch(velocity, track, hand.label, now) {
                    outputs.push(ControlOutput::Punch(punch));
                }
            }
        }

        if controls.hands {
            outputs.push(ControlOutput::Hands(hands));
        }
    }

    /// Two-phase control: open hand streams the aim target; a fist freezes
    /// it and arms the shot; the committing flick takes its direction from
    /// the frozen target, not from raw velocity.
    fn two_phase(
        &mut self,
        hand: &HandFrame,
        velocity: Vec3,
        point: HandPoint,
        now: f64,
        outputs: &mut Vec<ControlOutput>,
    ) {
        let fist = is_fist(&hand.landmarks);
        let open = is_high_five(&hand.landmarks);
        let track = self.tracker.track_mut(hand.label);

        if fist && !track.shoot_mode {
            track.shoot_mode = true;
            track.locked_aim = (point.x, point.y);
            info!(x = point.x, y = point.y, "Shoot mode, aim locked");
        } else if open && track.shoot_mode {
            track.shoot_mode = false;
            info!("Aim mode");
        }

        if track.shoot_mode {
            if let Some(flick) = detect_flick(velocity, track, hand.label, now) {
                // Aim position (0..1) maps to launch direction (-1..1)
                let aim_vx = (0.5 - track.locked_aim.0) * 2.0;
                outputs.push(ControlOutput::Flick(FlickEvent {
                    vx: aim_vx,
                    vy: flick.vy,
                    magnitude: flick.magnitude,
                    hand: None,
                    timestamp: flick.timestamp,
                }));
                track.shoot_mode = false;
            }
        } else {
            outputs.push(ControlOutput::Aim(AimState {
                x: point.x,
                y: point.y,
            }));
        }
    }
}

impl Default for GesturePipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{index, Landmark};
    use crate::session::COUNTDOWN_SECS;
    use crate::ws::protocol::PlayStatus;

    /// A 21-point open palm (all fingertips above their joints)
    fn open_palm() -> Vec<Landmark> {
        let mut lm = vec![
            Landmark {
                x: 0.5,
                y: 0.5,
                z: 0.0
            };
            index::LANDMARK_COUNT
        ];
        for tip in [
            index::THUMB_TIP,
            index::INDEX_FINGER_TIP,
            index::MIDDLE_FINGER_TIP,
            index::RING_FINGER_TIP,
            index::PINKY_TIP,
        ] {
            lm[tip].y = 0.3;
        }
        lm
    }

    /// A fist: all fingertips below their joints
    fn fist() -> Vec<Landmark> {
        let mut lm = vec![
            Landmark {
                x: 0.5,
                y: 0.5,
                z: 0.0
            };
            index::LANDMARK_COUNT
        ];
        for tip in [
            index::THUMB_TIP,
            index::INDEX_FINGER_TIP,
            index::MIDDLE_FINGER_TIP,
            index::RING_FINGER_TIP,
            index::PINKY_TIP,
        ] {
            lm[tip].y = 0.7;
        }
        lm
    }

    /// Neither open nor fist: two fingers up, two down
    fn neutral_hand() -> Vec<Landmark> {
        let mut lm = fist();
        lm[index::INDEX_FINGER_TIP].y = 0.3;
        lm[index::MIDDLE_FINGER_TIP].y = 0.3;
        lm
    }

    fn hand_at(label: HandLabel, mut landmarks: Vec<Landmark>, x: f32, y: f32) -> HandFrame {
        landmarks[index::INDEX_FINGER_TIP].x = x;
        landmarks[index::INDEX_FINGER_TIP].y = y;
        HandFrame { label, landmarks }
    }

    fn frame(hands: Vec<HandFrame>) -> FrameInput {
        FrameInput {
            t: None,
            hands,
            frame: None,
        }
    }

    /// Drive a fresh pipeline into Playing, returning the current time.
    /// Uses the left hand so right-hand motion histories start clean.
    fn start_playing(pipeline: &mut GesturePipeline) -> f64 {
        let start = frame(vec![hand_at(HandLabel::Left, open_palm(), 0.5, 0.5)]);
        let outputs = pipeline.process_frame(&start, None, 0.0);
        assert!(outputs.is_empty());

        let visible = frame(vec![hand_at(HandLabel::Left, neutral_hand(), 0.5, 0.5)]);
        let outputs = pipeline.process_frame(&visible, None, COUNTDOWN_SECS);
        assert!(matches!(
            &outputs[..],
            [ControlOutput::Status(s)] if s.status == PlayStatus::Playing
        ));
        COUNTDOWN_SECS
    }

    #[test]
    fn no_gestures_before_playing() {
        let mut pipeline = GesturePipeline::new();
        // A violent motion while idle produces nothing
        let f = frame(vec![hand_at(HandLabel::Right, neutral_hand(), 0.5, 0.9)]);
        assert!(pipeline.process_frame(&f, Some(GameKind::Basketball), 0.0).is_empty());
        assert_eq!(pipeline.phase(), SessionPhase::WaitingForStart);
    }

    #[test]
    fn basketball_right_hand_flick_left_hand_aim() {
        let mut pipeline = GesturePipeline::new();
        let mut t = start_playing(&mut pipeline);

        // Prime the right hand history low, then snap upward
        for (dy, dt) in [(0.8, 0.0), (0.2, 0.2)] {
            t += dt;
            let f = frame(vec![
                hand_at(HandLabel::Right, neutral_hand(), 0.5, dy),
                hand_at(HandLabel::Left, neutral_hand(), 0.3, 0.6),
            ]);
            let outputs = pipeline.process_frame(&f, Some(GameKind::Basketball), t);

            let aims: Vec<_> = outputs
                .iter()
                .filter(|o| matches!(o, ControlOutput::Aim(_)))
                .collect();
            assert_eq!(aims.len(), 1, "left hand streams exactly one aim");

            if dy < 0.5 {
                // vy = 0.6/0.2 = 3.0 upward: flick fires with the right hand
                assert!(outputs.iter().any(|o| matches!(
                    o,
                    ControlOutput::Flick(f)
                        if f.hand == Some(HandLabel::Right) && (f.vy - 3.0).abs() < 1e-4
                )));
            }
            // Hands positions stream every visible frame
            assert!(outputs
                .iter()
                .any(|o| matches!(o, ControlOutput::Hands(_))));
        }
    }

    #[test]
    fn boxing_gates_out_flick() {
        let mut pipeline = GesturePipeline::new();
        let mut t = start_playing(&mut pipeline);

        // Fast upward motion under boxing: no flick may leak through
        for (dy, dt) in [(0.8, 0.0), (0.2, 0.2)] {
            t += dt;
            let f = frame(vec![hand_at(HandLabel::Right, neutral_hand(), 0.5, dy)]);
            let outputs = pipeline.process_frame(&f, Some(GameKind::Boxing), t);
            assert!(!outputs.iter().any(|o| matches!(o, ControlOutput::Flick(_))));
        }
    }

    #[test]
    fn boxing_detects_punch_power() {
        let mut pipeline = GesturePipeline::new();
        let t = start_playing(&mut pipeline);

        // Hand drives toward the camera: depth drops 0.12 over the 0.3s
        // window, so forward speed is 0.4 and power is 2.0
        let mut f1 = frame(vec![hand_at(HandLabel::Left, neutral_hand(), 0.4, 0.5)]);
        f1.hands[0].landmarks[index::INDEX_FINGER_TIP].z = 0.0;
        pipeline.process_frame(&f1, Some(GameKind::Boxing), t + 0.1);

        let mut f2 = frame(vec![hand_at(HandLabel::Left, neutral_hand(), 0.4, 0.5)]);
        f2.hands[0].landmarks[index::INDEX_FINGER_TIP].z = -0.12;
        let outputs = pipeline.process_frame(&f2, Some(GameKind::Boxing), t + 0.3);

        assert!(outputs.iter().any(|o| matches!(
            o,
            ControlOutput::Punch(p)
                if p.hand == HandLabel::Left && (p.power - 2.0).abs() < 1e-4
        )));
    }

    #[test]
    fn no_active_game_emits_nothing_but_status() {
        let mut pipeline = GesturePipeline::new();
        let mut t = start_playing(&mut pipeline);

        for (dy, dt) in [(0.8, 0.0), (0.2, 0.2)] {
            t += dt;
            let f = frame(vec![hand_at(HandLabel::Right, neutral_hand(), 0.5, dy)]);
            let outputs = pipeline.process_frame(&f, None, t);
            assert!(outputs.is_empty(), "got {:?}", outputs);
        }
    }

    #[test]
    fn minigolf_two_phase_locks_aim_and_commits_from_it() {
        let mut pipeline = GesturePipeline::new();
        let t = start_playing(&mut pipeline);

        // Open hand at x=0.2: streams aim
        let aim = frame(vec![hand_at(HandLabel::Right, open_palm(), 0.2, 0.6)]);
        let outputs = pipeline.process_frame(&aim, Some(GameKind::Minigolf), t + 0.1);
        assert!(outputs.iter().any(
            |o| matches!(o, ControlOutput::Aim(a) if (a.x - 0.2).abs() < 1e-6)
        ));

        // Fist freezes the target where the fist was made
        let lock = frame(vec![hand_at(HandLabel::Right, fist(), 0.2, 0.6)]);
        let outputs = pipeline.process_frame(&lock, Some(GameKind::Minigolf), t + 0.2);
        assert!(
            !outputs.iter().any(|o| matches!(o, ControlOutput::Aim(_))),
            "no aim streaming in shoot mode"
        );

        // Later the hand has drifted to x=0.8 and flicks upward
        let commit = frame(vec![hand_at(HandLabel::Right, fist(), 0.8, 0.1)]);
        let outputs = pipeline.process_frame(&commit, Some(GameKind::Minigolf), t + 0.4);

        let flick = outputs
            .iter()
            .find_map(|o| match o {
                ControlOutput::Flick(f) => Some(f),
                _ => None,
            })
            .expect("committing flick");

        // Direction comes from the frozen x=0.2, not the drifted position:
        // (0.5 - 0.2) * 2 = 0.6
        assert!((flick.vx - 0.6).abs() < 1e-5, "vx = {}", flick.vx);
        assert!(flick.hand.is_none());
    }

    #[test]
    fn pause_clears_motion_histories() {
        let mut pipeline = GesturePipeline::new();
        let t = start_playing(&mut pipeline);

        let f = frame(vec![hand_at(HandLabel::Right, neutral_hand(), 0.5, 0.8)]);
        pipeline.process_frame(&f, Some(GameKind::Basketball), t + 0.1);
        assert!(pipeline.tracker.track(HandLabel::Right).sample_count() > 0);

        // Hands vanish past the timeout
        let empty = frame(vec![]);
        pipeline.process_frame(&empty, Some(GameKind::Basketball), t + 0.2);
        let outputs = pipeline.process_frame(&empty, Some(GameKind::Basketball), t + 20.0);

        assert!(matches!(
            &outputs[..],
            [ControlOutput::Status(s)] if s.status == PlayStatus::Paused
        ));
        assert_eq!(pipeline.tracker.track(HandLabel::Right).sample_count(), 0);
        assert_eq!(pipeline.phase(), SessionPhase::Countdown);
    }
}
