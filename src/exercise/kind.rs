//! Exercise kinds and the parameter table that drives the capture machine.
//!
//! | Kind               | Target        | Sustain | Failure (grace)          | Auto-stop | Pass                      |
//! |--------------------|---------------|---------|--------------------------|-----------|---------------------------|
//! | PitchSustain       | ±5 Hz of note | 3 s     | avg pitch < 150 Hz (0.5s)| 30 s      | mean stddev < 10 Hz       |
//! | PitchPractice      | none          | 0       | none                     | manual    | feedback only             |
//! | SentencePractice   | none          | 0       | none                     | manual    | feedback only             |
//! | SentenceTest       | none          | 0       | none                     | "next"    | σ < 15 Hz, mean ≥ 150 Hz  |
//! | ResonanceSustain   | none          | 0       | stability > 15 % (1 s)   | 30 s      | mean stability < 10 %     |
//! | ResonancePractice  | none          | 0       | none                     | manual    | feedback only             |
//! | WordDrill          | none          | 0       | none                     | manual    | stddev < 10, stability < 10 |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::{is_on_target, Features};

/// Sustained-voicing cap shared by both timed tests.
pub const AUTO_STOP: Duration = Duration::from_secs(30);
/// Delay before a sustain-gated exercise may begin capturing.
pub const READY_DELAY: Duration = Duration::from_secs(2);
/// Lowest acceptable average pitch for the feminisation exercises.
pub const PITCH_FLOOR_HZ: f64 = 150.0;
/// Pitch anchor used for sentence-practice feedback.
pub const SENTENCE_ANCHOR_HZ: f64 = 165.0;

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// Curriculum section an exercise belongs to; scores are reported per section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    Pitch,
    Sentences,
    Resonance,
    Words,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Pitch,
        Section::Sentences,
        Section::Resonance,
        Section::Words,
    ];

    /// 1-based section number.
    pub fn number(self) -> u8 {
        match self {
            Self::Pitch => 1,
            Self::Sentences => 2,
            Self::Resonance => 3,
            Self::Words => 4,
        }
    }

    /// The section unlocked by passing this one, if any.
    pub fn next(self) -> Option<Section> {
        match self {
            Self::Pitch => Some(Self::Sentences),
            Self::Sentences => Some(Self::Resonance),
            Self::Resonance => Some(Self::Words),
            Self::Words => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ExerciseKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseKind {
    PitchSustain,
    PitchPractice,
    SentencePractice,
    SentenceTest,
    ResonanceSustain,
    ResonancePractice,
    WordDrill,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 7] = [
        ExerciseKind::PitchSustain,
        ExerciseKind::PitchPractice,
        ExerciseKind::SentencePractice,
        ExerciseKind::SentenceTest,
        ExerciseKind::ResonanceSustain,
        ExerciseKind::ResonancePractice,
        ExerciseKind::WordDrill,
    ];

    pub fn section(self) -> Section {
        match self {
            Self::PitchSustain | Self::PitchPractice => Section::Pitch,
            Self::SentencePractice | Self::SentenceTest => Section::Sentences,
            Self::ResonanceSustain | Self::ResonancePractice => Section::Resonance,
            Self::WordDrill => Section::Words,
        }
    }

    pub fn is_practice(self) -> bool {
        matches!(
            self,
            Self::PitchPractice | Self::SentencePractice | Self::ResonancePractice
        )
    }

    /// Build the parameter set for this kind.  `target_hz` is only read by
    /// the pitch kinds.
    pub fn params(self, target_hz: f64) -> ExerciseParams {
        let open = ExerciseParams {
            target: TargetRule::None,
            sustain: Duration::ZERO,
            failure: None,
            auto_stop: None,
            voicing: Voicing::Pitch,
            capture: CaptureMode::Record,
            ready_delay: Duration::ZERO,
            pass: PassRule::None,
            feedback: FeedbackRule::None,
        };

        match self {
            Self::PitchSustain => ExerciseParams {
                target: TargetRule::PitchNear {
                    target_hz,
                    threshold_hz: 5.0,
                },
                sustain: Duration::from_secs(3),
                failure: Some(FailureRule {
                    condition: FailureCondition::PitchBelow(PITCH_FLOOR_HZ),
                    grace: Duration::from_millis(500),
                }),
                auto_stop: Some(AUTO_STOP),
                ready_delay: READY_DELAY,
                pass: PassRule::PitchStddevBelow(10.0),
                ..open
            },
            Self::PitchPractice => ExerciseParams {
                capture: CaptureMode::FeedbackOnly,
                feedback: FeedbackRule::Pitch { target_hz },
                ..open
            },
            Self::SentencePractice => ExerciseParams {
                capture: CaptureMode::FeedbackOnly,
                feedback: FeedbackRule::Sentence {
                    anchor_hz: SENTENCE_ANCHOR_HZ,
                },
                ..open
            },
            Self::SentenceTest => ExerciseParams {
                pass: PassRule::Melodic {
                    max_stddev_hz: 15.0,
                    min_mean_hz: PITCH_FLOOR_HZ,
                },
                ..open
            },
            Self::ResonanceSustain => ExerciseParams {
                failure: Some(FailureRule {
                    condition: FailureCondition::StabilityAbove(15.0),
                    grace: Duration::from_secs(1),
                }),
                auto_stop: Some(AUTO_STOP),
                voicing: Voicing::PitchAndFormants,
                pass: PassRule::StabilityBelow(10.0),
                ..open
            },
            Self::ResonancePractice => ExerciseParams {
                voicing: Voicing::PitchAndFormants,
                capture: CaptureMode::FeedbackOnly,
                feedback: FeedbackRule::Resonance,
                ..open
            },
            Self::WordDrill => ExerciseParams {
                voicing: Voicing::PitchAndFormants,
                pass: PassRule::PitchAndResonanceBelow {
                    pitch_stddev_hz: 10.0,
                    stability: 10.0,
                },
                ..open
            },
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PitchSustain => "pitch-sustain",
            Self::PitchPractice => "pitch-practice",
            Self::SentencePractice => "sentence-practice",
            Self::SentenceTest => "sentence-test",
            Self::ResonanceSustain => "resonance-sustain",
            Self::ResonancePractice => "resonance-practice",
            Self::WordDrill => "word-drill",
        };
        f.write_str(name)
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.to_string() == s)
            .ok_or_else(|| {
                let names: Vec<String> = Self::ALL.iter().map(|k| k.to_string()).collect();
                format!("unknown exercise {s:?} (expected one of: {})", names.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// ExerciseParams
// ---------------------------------------------------------------------------

/// Everything the capture machine needs to know about one exercise kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExerciseParams {
    pub target: TargetRule,
    /// How long the target must hold before capture begins.
    pub sustain: Duration,
    pub failure: Option<FailureRule>,
    /// Cumulative voiced time that ends the session as completed.
    pub auto_stop: Option<Duration>,
    pub voicing: Voicing,
    pub capture: CaptureMode,
    /// Capture cannot begin before this much time has passed since start.
    pub ready_delay: Duration,
    pub pass: PassRule,
    pub feedback: FeedbackRule,
}

/// Condition that gates the start of capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetRule {
    /// Capture begins with the first voiced frame.
    None,
    /// Average pitch within `± threshold_hz` of `target_hz`.
    PitchNear { target_hz: f64, threshold_hz: f64 },
}

impl TargetRule {
    pub fn holds(&self, features: &Features) -> bool {
        match *self {
            Self::None => true,
            Self::PitchNear {
                target_hz,
                threshold_hz,
            } => features
                .avg_pitch
                .is_some_and(|avg| is_on_target(avg, target_hz, threshold_hz)),
        }
    }

    pub fn target_hz(&self) -> Option<f64> {
        match *self {
            Self::None => None,
            Self::PitchNear { target_hz, .. } => Some(target_hz),
        }
    }
}

/// A disqualifying condition and how long it may persist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailureRule {
    pub condition: FailureCondition,
    pub grace: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailureCondition {
    /// Average pitch strictly below the given Hz.
    PitchBelow(f64),
    /// Resonance stability strictly above the given percentage.  A missing
    /// stability value counts as the worst case (100 %).
    StabilityAbove(f64),
}

impl FailureCondition {
    pub fn holds(&self, features: &Features) -> bool {
        match *self {
            Self::PitchBelow(hz) => features.avg_pitch.is_some_and(|avg| avg < hz),
            Self::StabilityAbove(pct) => features.resonance_stability.unwrap_or(100.0) > pct,
        }
    }
}

/// What makes a frame count as voiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voicing {
    Pitch,
    PitchAndFormants,
}

impl Voicing {
    pub fn is_voiced(&self, features: &Features) -> bool {
        match self {
            Self::Pitch => features.pitch.is_some(),
            Self::PitchAndFormants => features.pitch.is_some() && features.formants.is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Append a sample row per voiced frame once capturing.
    Record,
    /// Live feedback only; nothing is recorded or scored.
    FeedbackOnly,
}

/// Pass threshold applied to a finished session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PassRule {
    None,
    /// Mean recorded pitch stddev below the limit.
    PitchStddevBelow(f64),
    /// Population stddev of recorded average pitch below `max_stddev_hz`
    /// and its mean at least `min_mean_hz`.
    Melodic { max_stddev_hz: f64, min_mean_hz: f64 },
    /// Mean recorded resonance stability below the limit.
    StabilityBelow(f64),
    PitchAndResonanceBelow { pitch_stddev_hz: f64, stability: f64 },
}

/// Live feedback classification for the practice kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedbackRule {
    None,
    Pitch { target_hz: f64 },
    Sentence { anchor_hz: f64 },
    Resonance,
}
