//! The record of one exercise run.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::analysis::{FormantAverages, FormantSample};

use super::kind::{ExerciseKind, ExerciseParams};
use super::words::WordPrompt;

/// Capture machine states.
///
/// ```text
/// Idle → Armed → Listening ⇄ Sustaining → Capturing → Completed
///                    └──────────┴────────────┴──────→ Failed | Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CaptureState {
    /// Created, no frame processed yet.
    Idle,
    /// Waiting out the ready delay; capture cannot begin.
    Armed,
    /// Accepting frames, target not (yet) held.
    Listening,
    /// Target held; sustain timer running.
    Sustaining,
    /// Appending a sample row per voiced frame.
    Capturing,
    /// Auto-stop reached.
    Completed,
    /// Disqualified by the failure rule.
    Failed,
    /// Manually stopped.
    Stopped,
}

impl CaptureState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }
}

/// One recorded feature snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleRow {
    /// Offset from session start.
    pub offset: Duration,
    /// This frame's raw pitch estimate.
    pub pitch: f64,
    pub avg_pitch: f64,
    pub pitch_stddev: f64,
    pub formants: Option<FormantSample>,
    pub avg_formants: Option<FormantAverages>,
    pub resonance_stability: Option<f64>,
    pub brightness: Option<f64>,
}

/// A single practice or test run.  Mutated only by
/// [`CaptureMachine`](super::CaptureMachine).
#[derive(Debug, Clone)]
pub struct ExerciseSession {
    pub(crate) kind: ExerciseKind,
    pub(crate) params: ExerciseParams,
    pub(crate) started_at: Instant,
    pub(crate) state: CaptureState,
    pub(crate) voiced: Duration,
    pub(crate) rows: Vec<SampleRow>,
    pub(crate) failed: bool,
    pub(crate) time_to_hit: Option<Duration>,
    pub(crate) word: Option<WordPrompt>,
}

impl ExerciseSession {
    pub fn new(kind: ExerciseKind, params: ExerciseParams, started_at: Instant) -> Self {
        Self {
            kind,
            params,
            started_at,
            state: CaptureState::Idle,
            voiced: Duration::ZERO,
            rows: Vec::new(),
            failed: false,
            time_to_hit: None,
            word: None,
        }
    }

    /// Attach the item a word drill is practising.
    pub fn with_word(mut self, word: WordPrompt) -> Self {
        self.word = Some(word);
        self
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn params(&self) -> &ExerciseParams {
        &self.params
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Cumulative voiced time.
    pub fn voiced(&self) -> Duration {
        self.voiced
    }

    pub fn rows(&self) -> &[SampleRow] {
        &self.rows
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn word(&self) -> Option<WordPrompt> {
        self.word
    }

    /// Offset at which capture began.
    pub fn time_to_hit(&self) -> Option<Duration> {
        self.time_to_hit
    }

    /// Voiced time left before auto-stop, if the kind has one.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.params
            .auto_stop
            .map(|cap| cap.saturating_sub(self.voiced))
    }

    pub fn elapsed(&self, at: Instant) -> Duration {
        at.saturating_duration_since(self.started_at)
    }
}
