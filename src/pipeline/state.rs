//! Live state shared between the orchestrator and whatever renders it.
//!
//! [`LiveState`] is the single source of truth for the current phase, the
//! latest per-frame [`LiveSnapshot`] and the last finished report.
//! [`SharedState`] is `Arc<Mutex<LiveState>>`; lock briefly and never hold
//! the lock across an `.await`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use crate::analysis::{Features, FormantAverages, FormantSample};
use crate::config::AppConfig;
use crate::exercise::{CaptureState, ExerciseKind, ExerciseSession, Feedback};
use crate::scoring::SessionReport;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// What the orchestrator is doing.
///
/// ```text
/// Idle ──Start(kind)──────────▶ Exercise(kind) ──Stop / auto-stop / fail──▶ Idle
///      ──StartSentenceTest────▶ SentenceTest{index} ──NextSentence ×6─────▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Exercise(ExerciseKind),
    /// Recording sentence `index` (0-based).
    SentenceTest { index: usize },
}

impl Phase {
    /// Returns `true` while a session is accepting frames.
    ///
    /// ```
    /// use voice_trainer::exercise::ExerciseKind;
    /// use voice_trainer::pipeline::Phase;
    ///
    /// assert!(!Phase::Idle.is_active());
    /// assert!(Phase::Exercise(ExerciseKind::WordDrill).is_active());
    /// assert!(Phase::SentenceTest { index: 3 }.is_active());
    /// ```
    pub fn is_active(&self) -> bool {
        !matches!(self, Phase::Idle)
    }

    pub fn label(&self) -> String {
        match self {
            Phase::Idle => "idle".to_string(),
            Phase::Exercise(kind) => kind.to_string(),
            Phase::SentenceTest { index } => format!("sentence {}/6", index + 1),
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle
    }
}

// ---------------------------------------------------------------------------
// LiveSnapshot
// ---------------------------------------------------------------------------

/// Everything worth displaying after one processed frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveSnapshot {
    pub pitch: Option<f64>,
    pub avg_pitch: Option<f64>,
    pub pitch_stddev: f64,
    pub formants: Option<FormantSample>,
    pub avg_formants: Option<FormantAverages>,
    pub resonance_stability: Option<f64>,
    pub brightness: Option<f64>,
    pub capture: CaptureState,
    /// Cumulative voiced time of the session.
    pub voiced: Duration,
    /// Voiced time left before auto-stop, for the timed tests.
    pub remaining: Option<Duration>,
    /// Voiced time the target has been held, while sustaining.
    pub sustain: Option<Duration>,
    pub rows: usize,
    pub feedback: Option<Feedback>,
}

impl LiveSnapshot {
    pub fn new(
        features: &Features,
        session: &ExerciseSession,
        sustain: Option<Duration>,
        feedback: Option<Feedback>,
    ) -> Self {
        Self {
            pitch: features.pitch,
            avg_pitch: features.avg_pitch,
            pitch_stddev: features.pitch_stddev,
            formants: features.formants,
            avg_formants: features.avg_formants,
            resonance_stability: features.resonance_stability,
            brightness: features.brightness,
            capture: session.state(),
            voiced: session.voiced(),
            remaining: session.time_remaining(),
            sustain,
            rows: session.rows().len(),
            feedback,
        }
    }
}

// ---------------------------------------------------------------------------
// LiveState
// ---------------------------------------------------------------------------

pub struct LiveState {
    pub phase: Phase,
    /// `None` until the first frame of the current session.
    pub snapshot: Option<LiveSnapshot>,
    pub last_report: Option<SessionReport>,
    /// Set when an event could not be honoured; cleared on the next start.
    pub error_message: Option<String>,
    pub config: AppConfig,
}

impl LiveState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            phase: Phase::Idle,
            snapshot: None,
            last_report: None,
            error_message: None,
            config,
        }
    }
}

impl Default for LiveState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

/// Thread-safe handle to [`LiveState`].
pub type SharedState = Arc<Mutex<LiveState>>;

pub fn new_shared_state(config: AppConfig) -> SharedState {
    Arc::new(Mutex::new(LiveState::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(Phase::Idle.label(), "idle");
        assert_eq!(
            Phase::Exercise(ExerciseKind::PitchSustain).label(),
            "pitch-sustain"
        );
        assert_eq!(Phase::SentenceTest { index: 0 }.label(), "sentence 1/6");
    }

    #[test]
    fn default_state_is_idle_and_empty() {
        let state = LiveState::default();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.snapshot.is_none());
        assert!(state.last_report.is_none());
    }

    #[test]
    fn shared_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedState>();
    }

    #[test]
    fn snapshot_mirrors_session_and_features() {
        let kind = ExerciseKind::PitchSustain;
        let at = std::time::Instant::now();
        let session = ExerciseSession::new(kind, kind.params(200.0), at);
        let features = Features {
            pitch: Some(201.0),
            avg_pitch: Some(200.5),
            ..Features::silent(at)
        };
        let snap = LiveSnapshot::new(&features, &session, None, None);
        assert_eq!(snap.avg_pitch, Some(200.5));
        assert_eq!(snap.capture, CaptureState::Idle);
        assert_eq!(snap.remaining, Some(Duration::from_secs(30)));
        assert_eq!(snap.rows, 0);
    }
}
