//! Estimator-internal failures.
//!
//! These never leave the estimator boundary: `detect()` logs them and
//! reports the frame as unvoiced.

use thiserror::Error;

use crate::audio::Frame;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("frame contains no samples")]
    EmptyFrame,

    #[error("frame has an invalid sample rate ({0} Hz)")]
    InvalidSampleRate(u32),

    #[error("non-finite sample at index {0}")]
    NonFiniteSample(usize),

    #[error("frame too short for analysis: {got} samples (need {need})")]
    FrameTooShort { got: usize, need: usize },

    #[error("linear prediction is unstable for this frame")]
    LpcUnstable,

    #[error("only {0} formant candidates found (need 3)")]
    NotEnoughFormants(usize),

    #[error("no spectral energy inside the formant bands")]
    NoSpectralPeak,
}

/// Reject frames the estimators cannot interpret.
pub fn validate_frame(frame: &Frame) -> Result<(), AnalysisError> {
    if frame.samples.is_empty() {
        return Err(AnalysisError::EmptyFrame);
    }
    if frame.sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate(frame.sample_rate));
    }
    if let Some(idx) = frame.samples.iter().position(|s| !s.is_finite()) {
        return Err(AnalysisError::NonFiniteSample(idx));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn validation_catches_malformed_frames() {
        let now = Instant::now();
        assert_eq!(
            validate_frame(&Frame::new(Vec::new(), 44_100, now)),
            Err(AnalysisError::EmptyFrame)
        );
        assert_eq!(
            validate_frame(&Frame::new(vec![0.1; 8], 0, now)),
            Err(AnalysisError::InvalidSampleRate(0))
        );
        assert_eq!(
            validate_frame(&Frame::new(vec![0.1, f32::NAN, 0.2], 44_100, now)),
            Err(AnalysisError::NonFiniteSample(1))
        );
        assert!(validate_frame(&Frame::new(vec![0.1; 8], 44_100, now)).is_ok());
    }
}
