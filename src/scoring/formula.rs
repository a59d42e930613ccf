//! Score and XP formulas.  Pure functions, no state.

use serde::Serialize;

use crate::exercise::Section;

/// Voiced duration that earns the full sustain component.
pub const FULL_SUSTAIN_SECS: f64 = 30.0;
/// Bonus for the first award of the day.
pub const DAILY_BONUS_XP: f64 = 10.0;

/// A finished session's score with its components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    /// Sum (or mean) of the components, rounded to the nearest integer.
    pub total: u32,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ScoreBreakdown {
    Pitch {
        accuracy: f64,
        speed: f64,
        sustain: f64,
        stability: f64,
    },
    Resonance {
        stability: f64,
    },
    Word {
        pitch: f64,
        resonance: f64,
    },
}

/// `max(0, 100 − 10·|target − avg|)`
pub fn accuracy_component(target_hz: f64, avg_pitch: f64) -> f64 {
    (100.0 - 10.0 * (target_hz - avg_pitch).abs()).max(0.0)
}

/// `max(0, 50 − 10·time_to_hit)`
pub fn speed_component(time_to_hit_secs: f64) -> f64 {
    (50.0 - 10.0 * time_to_hit_secs).max(0.0)
}

/// `min(100, 100·duration/30)`
pub fn sustain_component(duration_secs: f64) -> f64 {
    (100.0 * duration_secs / FULL_SUSTAIN_SECS).clamp(0.0, 100.0)
}

/// `max(0, 100 − 10·x)`; used for every stddev/stability-based component.
pub fn stability_component(value: f64) -> f64 {
    (100.0 - 10.0 * value).max(0.0)
}

fn round(total: f64) -> u32 {
    total.round().max(0.0) as u32
}

/// Pitch-sustain score, range 0..=350.
pub fn pitch_score(
    target_hz: f64,
    avg_pitch: f64,
    time_to_hit_secs: f64,
    duration_secs: f64,
    avg_stddev: f64,
) -> ScoreResult {
    let accuracy = accuracy_component(target_hz, avg_pitch);
    let speed = speed_component(time_to_hit_secs);
    let sustain = sustain_component(duration_secs);
    let stability = stability_component(avg_stddev);
    ScoreResult {
        total: round(accuracy + speed + sustain + stability),
        breakdown: ScoreBreakdown::Pitch {
            accuracy,
            speed,
            sustain,
            stability,
        },
    }
}

/// Resonance-sustain score, range 0..=100.
pub fn resonance_score(avg_stability: f64) -> ScoreResult {
    let stability = stability_component(avg_stability);
    ScoreResult {
        total: round(stability),
        breakdown: ScoreBreakdown::Resonance { stability },
    }
}

/// Word-drill score: mean of the pitch and resonance components, 0..=100.
pub fn word_score(pitch_stddev: f64, resonance_stability: f64) -> ScoreResult {
    let pitch = stability_component(pitch_stddev);
    let resonance = stability_component(resonance_stability);
    ScoreResult {
        total: round((pitch + resonance) / 2.0),
        breakdown: ScoreBreakdown::Word { pitch, resonance },
    }
}

// ---------------------------------------------------------------------------
// XP
// ---------------------------------------------------------------------------

pub fn section_multiplier(section: Section) -> f64 {
    match section {
        Section::Pitch | Section::Words => 1.0,
        Section::Sentences => 1.5,
        Section::Resonance => 2.0,
    }
}

pub fn streak_multiplier(streak_days: u32) -> f64 {
    match streak_days {
        30.. => 3.0,
        7.. => 2.0,
        _ => 1.0,
    }
}

/// XP for a score: `floor(score/10) × section`, plus the daily bonus,
/// scaled by the streak multiplier and floored.
pub fn xp_for_score(section: Section, score: u32, first_today: bool, streak_days: u32) -> u32 {
    let base = (score / 10) as f64 * section_multiplier(section);
    let bonus = if first_today { DAILY_BONUS_XP } else { 0.0 };
    scale_by_streak(base + bonus, streak_days)
}

/// Apply the streak multiplier to a raw amount (achievement rewards too).
pub fn scale_by_streak(amount: f64, streak_days: u32) -> u32 {
    (amount * streak_multiplier(streak_days)).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_pitch_session_scores_350() {
        let s = pitch_score(200.0, 200.0, 0.0, 30.0, 0.0);
        assert_eq!(s.total, 350);
        assert_eq!(
            s.breakdown,
            ScoreBreakdown::Pitch {
                accuracy: 100.0,
                speed: 50.0,
                sustain: 100.0,
                stability: 100.0
            }
        );
    }

    #[test]
    fn components_clamp_at_zero_and_cap() {
        assert_eq!(accuracy_component(200.0, 230.0), 0.0);
        assert_eq!(speed_component(9.0), 0.0);
        assert_eq!(sustain_component(75.0), 100.0);
        assert_eq!(stability_component(20.0), 0.0);
    }

    #[test]
    fn typical_pitch_session() {
        // 2 Hz off, 3.2 s to hit, 34.5 s long, 4.1 Hz stddev
        let s = pitch_score(164.81, 166.81, 3.2, 34.5, 4.1);
        // 80 + 18 + 100 + 59 = 257
        assert_eq!(s.total, 257);
    }

    #[test]
    fn resonance_score_scales_with_stability() {
        assert_eq!(resonance_score(0.0).total, 100);
        assert_eq!(resonance_score(6.25).total, 38);
        assert_eq!(resonance_score(12.0).total, 0);
    }

    #[test]
    fn word_score_averages_components() {
        assert_eq!(word_score(0.0, 0.0).total, 100);
        let s = word_score(20.0, 0.0);
        assert_eq!(
            s.breakdown,
            ScoreBreakdown::Word {
                pitch: 0.0,
                resonance: 100.0
            }
        );
        assert_eq!(s.total, 50);
    }

    #[test]
    fn xp_formula() {
        // floor(257/10) = 25
        assert_eq!(xp_for_score(Section::Pitch, 257, false, 0), 25);
        assert_eq!(xp_for_score(Section::Pitch, 257, true, 0), 35);
        assert_eq!(xp_for_score(Section::Resonance, 95, false, 0), 18);
        // 9 × 1.5 = 13.5 → floored after the streak multiplier
        assert_eq!(xp_for_score(Section::Sentences, 95, false, 0), 13);
        assert_eq!(xp_for_score(Section::Sentences, 95, false, 7), 27);
        assert_eq!(xp_for_score(Section::Words, 100, true, 30), 60);
    }

    #[test]
    fn streak_tiers() {
        assert_eq!(streak_multiplier(0), 1.0);
        assert_eq!(streak_multiplier(6), 1.0);
        assert_eq!(streak_multiplier(7), 2.0);
        assert_eq!(streak_multiplier(29), 2.0);
        assert_eq!(streak_multiplier(30), 3.0);
    }
}
