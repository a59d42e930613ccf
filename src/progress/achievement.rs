//! Achievement catalogue.

use serde::{Deserialize, Serialize};

use crate::exercise::WordLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Achievement {
    FirstSteps,
    PitchPerfect,
    RockSolid,
    Speedster,
    ResonanceMaster,
    WordWizard,
    VowelVirtuoso,
    PhrasePhenom,
    EarlyBird,
    Consistent7,
    Consistent30,
    Consistent100,
    Overachiever,
    Marathoner,
}

impl Achievement {
    pub const ALL: [Achievement; 14] = [
        Achievement::FirstSteps,
        Achievement::PitchPerfect,
        Achievement::RockSolid,
        Achievement::Speedster,
        Achievement::ResonanceMaster,
        Achievement::WordWizard,
        Achievement::VowelVirtuoso,
        Achievement::PhrasePhenom,
        Achievement::EarlyBird,
        Achievement::Consistent7,
        Achievement::Consistent30,
        Achievement::Consistent100,
        Achievement::Overachiever,
        Achievement::Marathoner,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::FirstSteps => "First Steps",
            Self::PitchPerfect => "Pitch Perfect",
            Self::RockSolid => "Rock Solid",
            Self::Speedster => "Speedster",
            Self::ResonanceMaster => "Resonance Master",
            Self::WordWizard => "Word Wizard",
            Self::VowelVirtuoso => "Vowel Virtuoso",
            Self::PhrasePhenom => "Phrase Phenom",
            Self::EarlyBird => "Early Bird",
            Self::Consistent7 => "Week Warrior",
            Self::Consistent30 => "Monthly Master",
            Self::Consistent100 => "Century Champion",
            Self::Overachiever => "Overachiever",
            Self::Marathoner => "Marathoner",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::FirstSteps => "Complete your first exercise",
            Self::PitchPerfect => "Average within 1 Hz of the target",
            Self::RockSolid => "Sustain for 30 s with under 5 Hz stddev",
            Self::Speedster => "Hit the target pitch in under a second",
            Self::ResonanceMaster => "Pass the resonance test",
            Self::WordWizard => "Master every word",
            Self::VowelVirtuoso => "Master all vowels",
            Self::PhrasePhenom => "Master every phrase",
            Self::EarlyBird => "5 day streak",
            Self::Consistent7 => "7 day streak",
            Self::Consistent30 => "30 day streak",
            Self::Consistent100 => "100 day streak",
            Self::Overachiever => "Practice 30 of the last 30 days",
            Self::Marathoner => "A single 60 minute session",
        }
    }

    /// Raw XP reward, before the streak multiplier.
    pub fn xp_reward(self) -> u32 {
        match self {
            Self::FirstSteps => 10,
            Self::PitchPerfect | Self::Speedster | Self::EarlyBird => 50,
            Self::VowelVirtuoso => 75,
            Self::PhrasePhenom => 150,
            Self::RockSolid | Self::Marathoner => 100,
            Self::ResonanceMaster => 150,
            Self::WordWizard => 200,
            Self::Consistent7 => 75,
            Self::Consistent30 => 250,
            Self::Consistent100 => 500,
            Self::Overachiever => 300,
        }
    }

    /// Awarded once every item of `level` has been mastered.
    pub fn for_word_level(level: WordLevel) -> Achievement {
        match level {
            WordLevel::Vowels => Self::VowelVirtuoso,
            WordLevel::Words => Self::WordWizard,
            WordLevel::Phrases => Self::PhrasePhenom,
        }
    }

    /// The single streak achievement a streak of `days` qualifies for
    /// (highest tier only).
    pub fn for_streak(days: u32) -> Option<Achievement> {
        match days {
            100.. => Some(Self::Consistent100),
            30.. => Some(Self::Consistent30),
            7.. => Some(Self::Consistent7),
            5.. => Some(Self::EarlyBird),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streak_tiers_pick_the_highest() {
        assert_eq!(Achievement::for_streak(4), None);
        assert_eq!(Achievement::for_streak(5), Some(Achievement::EarlyBird));
        assert_eq!(Achievement::for_streak(29), Some(Achievement::Consistent7));
        assert_eq!(Achievement::for_streak(100), Some(Achievement::Consistent100));
    }

    #[test]
    fn every_word_level_has_its_own_achievement() {
        let earned: Vec<Achievement> = WordLevel::ALL
            .into_iter()
            .map(Achievement::for_word_level)
            .collect();
        assert_eq!(
            earned,
            vec![
                Achievement::VowelVirtuoso,
                Achievement::WordWizard,
                Achievement::PhrasePhenom
            ]
        );
    }

    #[test]
    fn ids_are_camel_case() {
        let json = serde_json::to_string(&Achievement::Consistent30).unwrap();
        assert_eq!(json, "\"consistent30\"");
        let back: Achievement = serde_json::from_str("\"firstSteps\"").unwrap();
        assert_eq!(back, Achievement::FirstSteps);
    }
}
