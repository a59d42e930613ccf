//! 12-tone equal temperament conversions referenced to A4 = 440 Hz.

use std::fmt;

use thiserror::Error;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Reference pitch of A4.
pub const A4_HZ: f64 = 440.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NoteError {
    #[error("unknown note name {0:?}")]
    UnknownName(String),

    #[error("missing or invalid octave in {0:?}")]
    BadOctave(String),
}

/// Nearest equal-tempered note to a measured frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteReading {
    /// Note name with octave, e.g. `"E3"`.
    pub name: String,
    /// Deviation from the named note in cents (floored).
    pub cents: i32,
    /// The frequency that was converted.
    pub frequency: f64,
}

impl fmt::Display for NoteReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:+} cents)", self.name, self.cents)
    }
}

/// Semitone offset of a note name from A within the same octave
/// (C = -9 … B = 2).
fn semitone_offset(name: &str) -> Option<i32> {
    NOTE_NAMES
        .iter()
        .position(|&n| n == name)
        .map(|idx| idx as i32 - 9)
}

/// Frequency of `name` in `octave`, e.g. `note_to_frequency("A", 4) == 440`.
pub fn note_to_frequency(name: &str, octave: i32) -> Result<f64, NoteError> {
    let offset = semitone_offset(name).ok_or_else(|| NoteError::UnknownName(name.to_string()))?;
    let semitones = offset + (octave - 4) * 12;
    Ok(A4_HZ * 2f64.powf(semitones as f64 / 12.0))
}

/// Split a combined note such as `"E3"` or `"F#4"` into name and octave.
pub fn parse_note(note: &str) -> Result<(String, i32), NoteError> {
    let split = note
        .find(|c: char| c.is_ascii_digit() || c == '-')
        .ok_or_else(|| NoteError::BadOctave(note.to_string()))?;
    let (name, octave) = note.split_at(split);
    let octave: i32 = octave
        .parse()
        .map_err(|_| NoteError::BadOctave(note.to_string()))?;
    if semitone_offset(name).is_none() {
        return Err(NoteError::UnknownName(name.to_string()));
    }
    Ok((name.to_string(), octave))
}

/// Frequency of a combined note name such as `"E3"`.
pub fn named_note_frequency(note: &str) -> Result<f64, NoteError> {
    let (name, octave) = parse_note(note)?;
    note_to_frequency(&name, octave)
}

/// Nearest note to `frequency`; `None` for non-positive or non-finite input.
pub fn frequency_to_note(frequency: f64) -> Option<NoteReading> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return None;
    }
    let note_num = 12.0 * (frequency / A4_HZ).log2();
    let nearest = note_num.round();
    let index = nearest as i64 + 69;
    let octave = index.div_euclid(12) - 1;
    let name = NOTE_NAMES[index.rem_euclid(12) as usize];
    let cents = ((note_num - nearest) * 100.0).floor() as i32;

    Some(NoteReading {
        name: format!("{name}{octave}"),
        cents,
        frequency,
    })
}
