//! Session finalisation: turn recorded rows into a summary and score.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::analysis::stats::{self, WindowedStat};
use crate::exercise::{
    CaptureMode, ExerciseKind, ExerciseSession, PassRule, SampleRow, Section, SessionEnd,
    WordPrompt,
};

use super::formula::{self, ScoreResult};

/// Summary of a finished, non-disqualified session with data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub kind: ExerciseKind,
    pub section: Section,
    pub ended: EndReason,
    /// Wall clock from start to finalisation.
    pub duration: Duration,
    pub time_to_hit: Option<Duration>,
    pub rows: usize,
    pub target_hz: Option<f64>,
    /// Mean of the recorded averaged pitch.
    pub avg_pitch: f64,
    /// Mean of the recorded pitch stddev.
    pub avg_stddev: f64,
    /// Mean of the recorded resonance stability, when formants were tracked.
    pub avg_stability: Option<f64>,
    /// Population stddev of the recorded averaged pitch.
    pub melodic_stability: f64,
    pub score: Option<ScoreResult>,
    pub passed: bool,
    /// The drilled item, for word drills started on one.
    pub word: Option<WordPrompt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndReason {
    AutoStop,
    Manual,
}

/// Outcome of ending a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionOutcome {
    Finished(SessionReport),
    /// Zero rows were recorded; ask the user to try again.
    NoData,
    /// The failure rule fired; no score, no XP.
    Disqualified,
    /// Practice kinds end without a report.
    Practice,
}

/// Finalise `session`, which must already have been ended with `end`.
pub fn finalize(session: &ExerciseSession, end: SessionEnd, ended_at: Instant) -> SessionOutcome {
    if end == SessionEnd::Disqualified || session.failed() {
        return SessionOutcome::Disqualified;
    }
    if session.params().capture == CaptureMode::FeedbackOnly {
        return SessionOutcome::Practice;
    }
    let rows = session.rows();
    let Some(pitch) = WindowedStat::of(&column(rows, |r| Some(r.avg_pitch))) else {
        return SessionOutcome::NoData;
    };

    let avg_stddev = stats::mean(&column(rows, |r| Some(r.pitch_stddev))).unwrap_or(0.0);
    let avg_stability = stats::mean(&column(rows, |r| r.resonance_stability));
    let duration = session.elapsed(ended_at);
    let time_to_hit = session
        .time_to_hit()
        .or_else(|| rows.first().map(|r| r.offset));
    let target_hz = session.params().target.target_hz();

    let score = match session.kind() {
        ExerciseKind::PitchSustain => Some(formula::pitch_score(
            target_hz.unwrap_or(pitch.mean),
            pitch.mean,
            time_to_hit.unwrap_or_default().as_secs_f64(),
            duration.as_secs_f64(),
            avg_stddev,
        )),
        ExerciseKind::ResonanceSustain => {
            Some(formula::resonance_score(avg_stability.unwrap_or(100.0)))
        }
        ExerciseKind::WordDrill => Some(formula::word_score(
            avg_stddev,
            avg_stability.unwrap_or(100.0),
        )),
        _ => None,
    };

    let passed = match session.params().pass {
        PassRule::None => false,
        PassRule::PitchStddevBelow(max) => avg_stddev < max,
        PassRule::Melodic {
            max_stddev_hz,
            min_mean_hz,
        } => pitch.stddev < max_stddev_hz && pitch.mean >= min_mean_hz,
        PassRule::StabilityBelow(max) => avg_stability.is_some_and(|s| s < max),
        PassRule::PitchAndResonanceBelow {
            pitch_stddev_hz,
            stability,
        } => avg_stddev < pitch_stddev_hz && avg_stability.is_some_and(|s| s < stability),
    };

    SessionOutcome::Finished(SessionReport {
        kind: session.kind(),
        section: session.kind().section(),
        ended: match end {
            SessionEnd::Completed => EndReason::AutoStop,
            _ => EndReason::Manual,
        },
        duration,
        time_to_hit,
        rows: rows.len(),
        target_hz,
        avg_pitch: pitch.mean,
        avg_stddev,
        avg_stability,
        melodic_stability: pitch.stddev,
        score,
        passed,
        word: session.word(),
    })
}

fn column(rows: &[SampleRow], pick: impl Fn(&SampleRow) -> Option<f64>) -> Vec<f64> {
    rows.iter().filter_map(pick).collect()
}
