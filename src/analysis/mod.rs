//! Per-frame feature extraction.
//!
//! # Pipeline
//!
//! ```text
//! Frame ─┬─ PitchEstimator   (autocorrelation, 80–1000 Hz)  ─┐
//!        └─ FormantEstimator (LPC or spectral peaks, F1..F3) ─┴→ Features
//! ```
//!
//! Both estimators keep a bounded history of accepted estimates (capacity
//! 50) and expose the same windowed statistics from [`stats`].  Estimator
//! faults never escape [`PitchEstimator::detect`] or
//! [`FormantEstimator::detect`]: a malformed frame is simply unvoiced.

pub mod analyzer;
pub mod error;
pub mod formant;
pub mod lpc;
pub mod note;
pub mod pitch;
pub mod stats;

pub use analyzer::{Analyzer, Features};
pub use error::AnalysisError;
pub use formant::{
    FormantAverages, FormantBackend, FormantEstimator, FormantIndex, FormantPeak, FormantSample,
    LpcBackend, SpectralPeakBackend,
};
pub use note::{frequency_to_note, named_note_frequency, note_to_frequency, NoteError, NoteReading};
pub use pitch::{is_on_target, PitchEstimator};
pub use stats::WindowedStat;
