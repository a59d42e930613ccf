//! Generic capture state machine.
//!
//! One [`CaptureMachine`] drives one [`ExerciseSession`] from a stream of
//! per-frame [`Features`].  All timing uses the `at` instant carried by the
//! features, never frame counts, so irregular delivery and silent gaps are
//! handled uniformly.
//!
//! Per voiced frame, with `delta` the time since the previous frame:
//!
//! 1. failure rule: start the failure timer or add `delta` to it, disqualify
//!    once it exceeds the grace window; otherwise reset it;
//! 2. add `delta` to voiced time;
//! 3. target rule: start the sustain timer or add `delta` to it, begin
//!    capturing once it reaches the requirement; losing the target resets it;
//! 4. while capturing, append a sample row;
//! 5. stop as completed once voiced time reaches the auto-stop cap.
//!
//! Silent frames only move the "previous frame" timestamp.  They neither
//! advance nor reset the failure and sustain timers.

use std::time::{Duration, Instant};

use crate::analysis::Features;

use super::feedback::Feedback;
use super::kind::CaptureMode;
use super::session::{CaptureState, ExerciseSession, SampleRow};

/// Result of feeding one frame to the machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// The session already ended; the frame was dropped.
    Ignored,
    /// Nothing voiced in this frame.
    Silent,
    /// Voiced, but capture has not begun.
    Waiting,
    /// Capture began on this frame; the first row was appended.
    CaptureStarted,
    /// A row was appended.
    Recorded,
    /// Practice kinds: a coaching hint for this frame.
    Feedback(Option<Feedback>),
    /// Failure rule exceeded its grace window; the session is over.
    Disqualified,
    /// Voiced time reached the cap; the session is over.
    AutoStopped,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Completed,
    Stopped,
    Disqualified,
}

/// Timers for the session being driven.
#[derive(Debug, Clone, Default)]
pub struct CaptureMachine {
    last_frame_at: Option<Instant>,
    /// Voiced time on target; `None` while the target is not held.
    sustained: Option<Duration>,
    /// Voiced time the failure condition has held.
    failing: Option<Duration>,
}

impl CaptureMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave `Idle`: enter `Armed` when the kind has a ready delay,
    /// `Listening` otherwise.  Timers are reset.
    pub fn arm(&mut self, session: &mut ExerciseSession) {
        if session.state != CaptureState::Idle {
            return;
        }
        *self = Self::default();
        let next = if session.params.ready_delay > Duration::ZERO {
            CaptureState::Armed
        } else {
            CaptureState::Listening
        };
        transition(session, next);
    }

    /// Voiced time the target has been held, if it currently is.
    pub fn sustained(&self) -> Option<Duration> {
        self.sustained
    }

    pub fn process(&mut self, session: &mut ExerciseSession, features: &Features) -> FrameOutcome {
        if session.state.is_terminal() {
            return FrameOutcome::Ignored;
        }
        if session.state == CaptureState::Idle {
            self.arm(session);
        }

        let at = features.at;
        let params = session.params;

        if session.state == CaptureState::Armed
            && session.elapsed(at) >= params.ready_delay
        {
            transition(session, CaptureState::Listening);
        }

        let previous = self.last_frame_at.unwrap_or(session.started_at);
        self.last_frame_at = Some(at);
        let delta = at.saturating_duration_since(previous);

        if !params.voicing.is_voiced(features) {
            return FrameOutcome::Silent;
        }

        // failure rule
        if let Some(rule) = params.failure {
            if rule.condition.holds(features) {
                let failing = accumulate(&mut self.failing, delta);
                if failing > rule.grace {
                    log::info!(
                        "{}: disqualified after {:.2}s of {:?}",
                        session.kind,
                        session.elapsed(at).as_secs_f64(),
                        rule.condition
                    );
                    session.failed = true;
                    transition(session, CaptureState::Failed);
                    return FrameOutcome::Disqualified;
                }
            } else {
                self.failing = None;
            }
        }

        // voiced time
        session.voiced += delta;

        let outcome = if params.capture == CaptureMode::FeedbackOnly {
            FrameOutcome::Feedback(params.feedback.evaluate(features))
        } else {
            // target / sustain
            let started = self.update_sustain(session, features, delta);

            // record
            if session.state == CaptureState::Capturing {
                session.rows.push(row(session, features));
                if started {
                    FrameOutcome::CaptureStarted
                } else {
                    FrameOutcome::Recorded
                }
            } else {
                FrameOutcome::Waiting
            }
        };

        // auto-stop
        if let Some(cap) = params.auto_stop {
            if session.voiced >= cap {
                log::info!(
                    "{}: auto-stop after {:.1}s voiced ({} rows)",
                    session.kind,
                    session.voiced.as_secs_f64(),
                    session.rows.len()
                );
                transition(session, CaptureState::Completed);
                return FrameOutcome::AutoStopped;
            }
        }

        outcome
    }

    /// Manual stop.  Safe in any state; terminal sessions keep their state.
    pub fn stop(&mut self, session: &mut ExerciseSession) -> SessionEnd {
        match session.state {
            CaptureState::Failed => SessionEnd::Disqualified,
            CaptureState::Completed => SessionEnd::Completed,
            CaptureState::Stopped => SessionEnd::Stopped,
            _ => {
                transition(session, CaptureState::Stopped);
                SessionEnd::Stopped
            }
        }
    }

    /// Returns `true` when capture began on this frame.
    fn update_sustain(
        &mut self,
        session: &mut ExerciseSession,
        features: &Features,
        delta: Duration,
    ) -> bool {
        let at = features.at;
        let params = session.params;

        match session.state {
            CaptureState::Armed | CaptureState::Listening | CaptureState::Sustaining => {}
            _ => return false,
        }

        if !params.target.holds(features) {
            if self.sustained.take().is_some() {
                log::debug!("{}: target lost, sustain reset", session.kind);
            }
            if session.state == CaptureState::Sustaining {
                transition(session, CaptureState::Listening);
            }
            return false;
        }

        let sustained = accumulate(&mut self.sustained, delta);
        if session.state == CaptureState::Armed {
            return false;
        }
        if sustained >= params.sustain {
            session.time_to_hit = Some(session.elapsed(at));
            transition(session, CaptureState::Capturing);
            true
        } else {
            if session.state == CaptureState::Listening {
                transition(session, CaptureState::Sustaining);
            }
            false
        }
    }
}

/// Starts a timer at zero, or adds `delta` to a running one.
fn accumulate(timer: &mut Option<Duration>, delta: Duration) -> Duration {
    let elapsed = match *timer {
        Some(elapsed) => elapsed + delta,
        None => Duration::ZERO,
    };
    *timer = Some(elapsed);
    elapsed
}

fn transition(session: &mut ExerciseSession, next: CaptureState) {
    log::debug!("{}: {:?} → {:?}", session.kind, session.state, next);
    session.state = next;
}

fn row(session: &ExerciseSession, f: &Features) -> SampleRow {
    let pitch = f.pitch.unwrap_or_default();
    SampleRow {
        offset: session.elapsed(f.at),
        pitch,
        avg_pitch: f.avg_pitch.unwrap_or(pitch),
        pitch_stddev: f.pitch_stddev,
        formants: f.formants,
        avg_formants: f.avg_formants,
        resonance_stability: f.resonance_stability,
        brightness: f.brightness,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{FormantPeak, FormantSample};
    use crate::exercise::kind::ExerciseKind;

    const TICK: Duration = Duration::from_millis(50);

    struct Rig {
        t0: Instant,
        session: ExerciseSession,
        machine: CaptureMachine,
    }

    impl Rig {
        fn new(kind: ExerciseKind) -> Self {
            let t0 = Instant::now();
            let mut session = ExerciseSession::new(kind, kind.params(200.0), t0);
            let mut machine = CaptureMachine::new();
            machine.arm(&mut session);
            Self {
                t0,
                session,
                machine,
            }
        }

        fn at(&self, offset: Duration) -> Instant {
            self.t0 + offset
        }

        fn feed(&mut self, offset: Duration, features: Features) -> FrameOutcome {
            let f = Features {
                at: self.at(offset),
                ..features
            };
            self.machine.process(&mut self.session, &f)
        }

        /// Feed frames every TICK over `[from, to)`, returning the last outcome.
        fn run(&mut self, from: Duration, to: Duration, features: Features) -> FrameOutcome {
            let mut t = from;
            let mut last = FrameOutcome::Silent;
            while t < to {
                last = self.feed(t, features);
                if self.session.state.is_terminal() {
                    break;
                }
                t += TICK;
            }
            last
        }
    }

    fn pitch(avg: f64) -> Features {
        Features {
            pitch: Some(avg),
            avg_pitch: Some(avg),
            pitch_stddev: 1.0,
            ..Features::silent(Instant::now())
        }
    }

    fn resonance(stability: f64) -> Features {
        let peak = |f| FormantPeak {
            frequency: f,
            energy: 0.0,
            bandwidth: 0.0,
        };
        Features {
            formants: Some(FormantSample {
                f1: peak(500.0),
                f2: peak(1500.0),
                f3: peak(2500.0),
            }),
            resonance_stability: Some(stability),
            ..pitch(200.0)
        }
    }

    fn silence() -> Features {
        Features::silent(Instant::now())
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn sustain_gated_kind_starts_armed() {
        let rig = Rig::new(ExerciseKind::PitchSustain);
        assert_eq!(rig.session.state(), CaptureState::Armed);
        let rig = Rig::new(ExerciseKind::ResonanceSustain);
        assert_eq!(rig.session.state(), CaptureState::Listening);
    }

    #[test]
    fn holding_target_three_seconds_starts_capture() {
        let mut rig = Rig::new(ExerciseKind::PitchSustain);
        rig.run(Duration::ZERO, ms(3000), pitch(202.0));
        assert_eq!(rig.session.state(), CaptureState::Sustaining);
        assert!(rig.session.rows().is_empty());

        assert_eq!(rig.feed(ms(3000), pitch(202.0)), FrameOutcome::CaptureStarted);
        assert_eq!(rig.session.state(), CaptureState::Capturing);
        let tth = rig.session.time_to_hit().unwrap().as_secs_f64();
        assert!((tth - 3.0).abs() < 0.06, "time to hit {tth}");
        assert_eq!(rig.session.rows().len(), 1);
        assert_eq!(rig.feed(ms(3050), pitch(202.0)), FrameOutcome::Recorded);
    }

    #[test]
    fn losing_target_at_2_9s_resets_sustain() {
        let mut rig = Rig::new(ExerciseKind::PitchSustain);
        rig.run(Duration::ZERO, ms(2900), pitch(200.0));
        assert_eq!(rig.machine.sustained(), Some(ms(2850)));

        // Off target but above the failure floor.
        rig.feed(ms(2900), pitch(220.0));
        assert_eq!(rig.machine.sustained(), None);
        assert_eq!(rig.session.state(), CaptureState::Listening);

        // Back on target: the full three seconds are needed again.
        rig.run(ms(2950), ms(5900), pitch(200.0));
        assert_eq!(rig.session.state(), CaptureState::Sustaining);
        assert!(rig.session.rows().is_empty());
        rig.feed(ms(5950), pitch(200.0));
        assert_eq!(rig.session.state(), CaptureState::Capturing);
    }

    #[test]
    fn capture_waits_for_ready_delay() {
        let mut rig = Rig::new(ExerciseKind::PitchSustain);
        let mut params = rig.session.params;
        params.sustain = Duration::from_millis(500);
        rig.session.params = params;

        rig.run(Duration::ZERO, ms(1950), pitch(200.0));
        assert_eq!(rig.session.state(), CaptureState::Armed);
        assert!(rig.session.rows().is_empty());

        assert_eq!(rig.feed(ms(2000), pitch(200.0)), FrameOutcome::CaptureStarted);
        let tth = rig.session.time_to_hit().unwrap();
        assert_eq!(tth, ms(2000));
    }

    #[test]
    fn low_pitch_beyond_grace_disqualifies() {
        let mut rig = Rig::new(ExerciseKind::PitchSustain);
        rig.run(Duration::ZERO, ms(3500), pitch(200.0));
        let rows_before = rig.session.rows().len();
        assert!(rows_before > 0);

        let outcome = rig.run(ms(3500), ms(5000), pitch(140.0));
        assert_eq!(outcome, FrameOutcome::Disqualified);
        assert_eq!(rig.session.state(), CaptureState::Failed);
        assert!(rig.session.failed());

        // Grace frames are still recorded; nothing after the failure point.
        let rows_at_failure = rig.session.rows().len();
        assert!(rig.session.rows().iter().all(|r| r.offset <= ms(4050)));
        assert_eq!(rig.feed(ms(5000), pitch(200.0)), FrameOutcome::Ignored);
        assert_eq!(rig.session.rows().len(), rows_at_failure);
        assert_eq!(rig.machine.stop(&mut rig.session), SessionEnd::Disqualified);
    }

    #[test]
    fn brief_dip_within_grace_is_forgiven() {
        let mut rig = Rig::new(ExerciseKind::PitchSustain);
        rig.run(Duration::ZERO, ms(1000), pitch(200.0));
        rig.run(ms(1000), ms(1500), pitch(140.0));
        rig.run(ms(1500), ms(2000), pitch(200.0));
        rig.run(ms(2000), ms(2500), pitch(140.0));
        assert!(!rig.session.failed());
    }

    #[test]
    fn silence_neither_advances_nor_resets_failure_timer() {
        let mut rig = Rig::new(ExerciseKind::PitchSustain);
        rig.feed(Duration::ZERO, pitch(140.0));
        rig.run(TICK, ms(2000), silence());
        assert!(!rig.session.failed());

        // Low again: 50 ms carried over from before the gap, not 2 s.
        assert_eq!(rig.feed(ms(2000), pitch(140.0)), FrameOutcome::Waiting);
        rig.run(ms(2050), ms(2500), pitch(140.0));
        assert!(!rig.session.failed());
        // 550 ms of low voice in total; a reset timer would stand at 500 ms.
        assert_eq!(rig.feed(ms(2500), pitch(140.0)), FrameOutcome::Disqualified);
    }

    #[test]
    fn silence_does_not_advance_sustain() {
        let mut rig = Rig::new(ExerciseKind::PitchSustain);
        rig.feed(Duration::ZERO, pitch(200.0));
        rig.feed(TICK, pitch(200.0));
        rig.run(ms(100), ms(3000), silence());

        assert_eq!(rig.feed(ms(3000), pitch(200.0)), FrameOutcome::Waiting);
        assert_eq!(rig.session.state(), CaptureState::Sustaining);
        assert_eq!(rig.machine.sustained(), Some(ms(100)));
        assert_eq!(rig.session.time_to_hit(), None);
        assert!(rig.session.rows().is_empty());
    }

    #[test]
    fn auto_stop_counts_voiced_time_only() {
        let mut rig = Rig::new(ExerciseKind::ResonanceSustain);
        // Two rounds of 10 s voiced + 20 s silence, then voice until the cap.
        for round in 0..2u64 {
            let t = ms(round * 30_000);
            rig.run(t, t + ms(10_000), resonance(5.0));
            rig.run(t + ms(10_000), t + ms(30_000), silence());
        }
        assert!(!rig.session.state().is_terminal());

        let outcome = rig.run(ms(60_000), ms(90_000), resonance(5.0));
        assert_eq!(outcome, FrameOutcome::AutoStopped);
        assert_eq!(rig.session.state(), CaptureState::Completed);
        assert_eq!(rig.session.voiced(), ms(30_000));
        let last = rig.session.rows().last().unwrap().offset;
        assert_eq!(last, ms(70_000));
    }

    #[test]
    fn resonance_records_from_first_voiced_frame() {
        let mut rig = Rig::new(ExerciseKind::ResonanceSustain);
        assert_eq!(rig.feed(Duration::ZERO, silence()), FrameOutcome::Silent);
        assert_eq!(rig.feed(TICK, pitch(200.0)), FrameOutcome::Silent);
        assert_eq!(rig.feed(TICK * 2, resonance(5.0)), FrameOutcome::CaptureStarted);
        assert_eq!(rig.session.time_to_hit(), Some(TICK * 2));
    }

    #[test]
    fn unstable_resonance_disqualifies_after_one_second() {
        let mut rig = Rig::new(ExerciseKind::ResonanceSustain);
        rig.run(Duration::ZERO, ms(1000), resonance(20.0));
        assert!(!rig.session.failed());
        assert_eq!(rig.feed(ms(1050), resonance(20.0)), FrameOutcome::Disqualified);
    }

    #[test]
    fn practice_reports_feedback_and_records_nothing() {
        let mut rig = Rig::new(ExerciseKind::PitchPractice);
        let outcome = rig.feed(Duration::ZERO, pitch(120.0));
        assert_eq!(outcome, FrameOutcome::Feedback(Some(Feedback::TooLow)));
        rig.run(TICK, ms(40000), pitch(120.0));
        assert_eq!(rig.session.state(), CaptureState::Listening);
        assert!(rig.session.rows().is_empty());
        assert!(!rig.session.failed());
    }

    #[test]
    fn manual_stop_is_safe_in_any_state() {
        let mut rig = Rig::new(ExerciseKind::WordDrill);
        assert_eq!(rig.machine.stop(&mut rig.session), SessionEnd::Stopped);
        assert_eq!(rig.session.state(), CaptureState::Stopped);
        assert_eq!(rig.feed(Duration::ZERO, resonance(1.0)), FrameOutcome::Ignored);
        assert_eq!(rig.machine.stop(&mut rig.session), SessionEnd::Stopped);
    }

    #[test]
    fn idle_session_arms_on_first_frame() {
        let kind = ExerciseKind::SentenceTest;
        let t0 = Instant::now();
        let mut session = ExerciseSession::new(kind, kind.params(0.0), t0);
        let mut machine = CaptureMachine::new();
        let f = Features {
            at: t0,
            ..pitch(180.0)
        };
        assert_eq!(machine.process(&mut session, &f), FrameOutcome::CaptureStarted);
    }
}
