//! Word drill content: three graded lists of things to say.
//!
//! A drill targets one [`WordPrompt`].  The progression ledger remembers
//! which prompts of each [`WordLevel`] have been passed, so repeating a
//! mastered item does not count twice.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const VOWELS: [&str; 5] = ["A", "E", "I", "O", "U"];

pub const WORDS: [&str; 10] = [
    "hello",
    "water",
    "sister",
    "mother",
    "beautiful",
    "amazing",
    "wonderful",
    "together",
    "forever",
    "sunshine",
];

pub const PHRASES: [&str; 5] = [
    "how are you",
    "nice to meet you",
    "have a nice day",
    "see you later",
    "good morning",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordLevel {
    Vowels,
    Words,
    Phrases,
}

impl WordLevel {
    pub const ALL: [WordLevel; 3] = [WordLevel::Vowels, WordLevel::Words, WordLevel::Phrases];

    pub fn items(self) -> &'static [&'static str] {
        match self {
            Self::Vowels => &VOWELS,
            Self::Words => &WORDS,
            Self::Phrases => &PHRASES,
        }
    }

    pub fn prompt(self, index: usize) -> Option<WordPrompt> {
        self.items()
            .get(index)
            .map(|&text| WordPrompt { level: self, text })
    }

    /// Look an item up by its text, ignoring case and surrounding space.
    ///
    /// ```
    /// use voice_trainer::exercise::WordLevel;
    ///
    /// let p = WordLevel::Phrases.find(" Good Morning ").unwrap();
    /// assert_eq!(p.text, "good morning");
    /// assert!(WordLevel::Words.find("good morning").is_none());
    /// ```
    pub fn find(self, text: &str) -> Option<WordPrompt> {
        let wanted = text.trim();
        self.items()
            .iter()
            .find(|item| item.eq_ignore_ascii_case(wanted))
            .map(|&text| WordPrompt { level: self, text })
    }
}

impl fmt::Display for WordLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vowels => "vowels",
            Self::Words => "words",
            Self::Phrases => "phrases",
        })
    }
}

impl FromStr for WordLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.to_string() == s)
            .ok_or_else(|| format!("unknown word level {s:?} (expected vowels, words or phrases)"))
    }
}

/// One item to drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WordPrompt {
    pub level: WordLevel,
    pub text: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_match_their_levels() {
        assert_eq!(WordLevel::Vowels.items().len(), 5);
        assert_eq!(WordLevel::Words.items().len(), 10);
        assert_eq!(WordLevel::Phrases.items().len(), 5);
        assert_eq!(
            WordLevel::Words.prompt(9),
            Some(WordPrompt {
                level: WordLevel::Words,
                text: "sunshine"
            })
        );
        assert_eq!(WordLevel::Vowels.prompt(5), None);
    }

    #[test]
    fn find_ignores_case() {
        assert_eq!(WordLevel::Vowels.find("e").map(|p| p.text), Some("E"));
        assert_eq!(WordLevel::Words.find("HELLO").map(|p| p.text), Some("hello"));
        assert_eq!(WordLevel::Words.find("goodbye"), None);
    }

    #[test]
    fn level_names_parse_back() {
        for level in WordLevel::ALL {
            assert_eq!(level.to_string().parse::<WordLevel>(), Ok(level));
        }
        assert!("nouns".parse::<WordLevel>().is_err());
    }
}
