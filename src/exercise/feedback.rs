//! Live coaching hints for the practice kinds.

use std::fmt;

use serde::Serialize;

use crate::analysis::Features;

use super::kind::{FeedbackRule, PITCH_FLOOR_HZ};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Feedback {
    TooLow,
    OnTarget,
    Close,
    OffBy(f64),
    TooMuchVariation,
    Excellent,
    Good,
    StabilityTooHigh,
    StabilityClose,
    StabilityExcellent,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLow => write!(f, "too low (< {PITCH_FLOOR_HZ} Hz)"),
            Self::OnTarget => f.write_str("on target"),
            Self::Close => f.write_str("close"),
            Self::OffBy(hz) => write!(f, "off by {hz:.1} Hz"),
            Self::TooMuchVariation => f.write_str("too much variation"),
            Self::Excellent => f.write_str("excellent"),
            Self::Good => f.write_str("good, keep going"),
            Self::StabilityTooHigh => f.write_str("resonance too unstable"),
            Self::StabilityClose => f.write_str("resonance close"),
            Self::StabilityExcellent => f.write_str("resonance excellent"),
        }
    }
}

impl FeedbackRule {
    /// Classify a voiced frame; `None` when the rule has nothing to say.
    pub fn evaluate(&self, features: &Features) -> Option<Feedback> {
        match *self {
            Self::None => None,
            Self::Pitch { target_hz } => features.avg_pitch.map(|avg| pitch(avg, target_hz)),
            Self::Sentence { anchor_hz } => features
                .avg_pitch
                .map(|avg| sentence(avg, features.pitch_stddev, anchor_hz)),
            Self::Resonance => features.resonance_stability.map(resonance),
        }
    }
}

fn pitch(avg: f64, target_hz: f64) -> Feedback {
    let off = (avg - target_hz).abs();
    if avg < PITCH_FLOOR_HZ {
        Feedback::TooLow
    } else if off <= 5.0 {
        Feedback::OnTarget
    } else if off <= 10.0 {
        Feedback::Close
    } else {
        Feedback::OffBy(off)
    }
}

fn sentence(avg: f64, stddev: f64, anchor_hz: f64) -> Feedback {
    if avg < PITCH_FLOOR_HZ {
        Feedback::TooLow
    } else if stddev > 15.0 {
        Feedback::TooMuchVariation
    } else if stddev < 15.0 && (avg - anchor_hz).abs() <= 10.0 {
        Feedback::Excellent
    } else {
        Feedback::Good
    }
}

fn resonance(stability: f64) -> Feedback {
    if stability > 15.0 {
        Feedback::StabilityTooHigh
    } else if stability < 10.0 {
        Feedback::StabilityExcellent
    } else {
        Feedback::StabilityClose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn at_pitch(avg: f64, stddev: f64) -> Features {
        Features {
            pitch: Some(avg),
            avg_pitch: Some(avg),
            pitch_stddev: stddev,
            ..Features::silent(Instant::now())
        }
    }

    #[test]
    fn pitch_bands() {
        let rule = FeedbackRule::Pitch { target_hz: 200.0 };
        assert_eq!(rule.evaluate(&at_pitch(140.0, 0.0)), Some(Feedback::TooLow));
        assert_eq!(rule.evaluate(&at_pitch(204.0, 0.0)), Some(Feedback::OnTarget));
        assert_eq!(rule.evaluate(&at_pitch(191.0, 0.0)), Some(Feedback::Close));
        assert_eq!(rule.evaluate(&at_pitch(230.0, 0.0)), Some(Feedback::OffBy(30.0)));
    }

    #[test]
    fn sentence_bands() {
        let rule = FeedbackRule::Sentence { anchor_hz: 165.0 };
        assert_eq!(rule.evaluate(&at_pitch(170.0, 20.0)), Some(Feedback::TooMuchVariation));
        assert_eq!(rule.evaluate(&at_pitch(170.0, 5.0)), Some(Feedback::Excellent));
        assert_eq!(rule.evaluate(&at_pitch(190.0, 5.0)), Some(Feedback::Good));
    }

    #[test]
    fn resonance_bands() {
        let rule = FeedbackRule::Resonance;
        let with = |s| Features {
            resonance_stability: Some(s),
            ..at_pitch(200.0, 0.0)
        };
        assert_eq!(rule.evaluate(&with(20.0)), Some(Feedback::StabilityTooHigh));
        assert_eq!(rule.evaluate(&with(12.0)), Some(Feedback::StabilityClose));
        assert_eq!(rule.evaluate(&with(4.0)), Some(Feedback::StabilityExcellent));
        assert_eq!(rule.evaluate(&at_pitch(200.0, 0.0)), None);
    }
}
