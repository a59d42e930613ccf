//! Scores, pass/fail and XP for finished sessions.

pub mod formula;
pub mod report;

pub use formula::{
    pitch_score, resonance_score, scale_by_streak, word_score, xp_for_score, ScoreBreakdown,
    ScoreResult,
};
pub use report::{finalize, EndReason, SessionOutcome, SessionReport};
