//! Fundamental-frequency estimation by normalised autocorrelation.
//!
//! ## Algorithm
//!
//! 1. Frames whose RMS falls below the minimum-signal threshold are treated
//!    as silence: no estimate, history untouched.
//! 2. Autocorrelation `r[lag] = Σ x[i]·x[i+lag]` over the first half of the
//!    frame, normalised by `sqrt(E(head)·E(lagged))`, the energies of the two
//!    windows being compared.
//! 3. Scan lags for 1000 Hz … 80 Hz and take the **first** true peak (greater
//!    than both neighbours) whose normalised value exceeds 0.5.  Starting at
//!    the 1000 Hz lag keeps the short-lag shoulder from producing octave
//!    errors.
//! 4. Parabolic interpolation across the peak refines the lag, and
//!    `sample_rate / lag` gives the frequency.
//! 5. Results outside 60–1200 Hz are rejected.

use crate::audio::{Frame, RingBuffer};

use super::error::{validate_frame, AnalysisError};
use super::stats;

/// Capacity of the rolling pitch history.
pub const HISTORY_CAPACITY: usize = 50;
/// Default RMS below which a frame counts as silence.
pub const DEFAULT_MIN_RMS: f64 = 0.005;

const MIN_VOICE_HZ: f64 = 80.0;
const MAX_VOICE_HZ: f64 = 1000.0;
const MIN_CLARITY: f64 = 0.5;
const ACCEPT_MIN_HZ: f64 = 60.0;
const ACCEPT_MAX_HZ: f64 = 1200.0;

/// `true` when `current` lies within `± threshold_hz` of `target`.
pub fn is_on_target(current: f64, target: f64, threshold_hz: f64) -> bool {
    (current - target).abs() <= threshold_hz
}

// ---------------------------------------------------------------------------
// PitchEstimator
// ---------------------------------------------------------------------------

/// Per-frame pitch detector with a bounded history of accepted estimates.
#[derive(Debug, Clone)]
pub struct PitchEstimator {
    history: RingBuffer<f64>,
    min_rms: f64,
}

impl Default for PitchEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RMS)
    }
}

impl PitchEstimator {
    pub fn new(min_rms: f64) -> Self {
        Self::with_capacity(min_rms, HISTORY_CAPACITY)
    }

    pub fn with_capacity(min_rms: f64, capacity: usize) -> Self {
        Self {
            history: RingBuffer::new(capacity),
            min_rms,
        }
    }

    /// Estimate the pitch of `frame` in Hz, or `None` when unvoiced.
    ///
    /// Malformed frames are logged and reported as unvoiced.
    pub fn detect(&mut self, frame: &Frame) -> Option<f64> {
        match self.try_detect(frame) {
            Ok(pitch) => pitch,
            Err(e) => {
                log::debug!("pitch: frame rejected: {e}");
                None
            }
        }
    }

    /// Like [`detect`](Self::detect) but surfaces malformed-frame errors.
    pub fn try_detect(&mut self, frame: &Frame) -> Result<Option<f64>, AnalysisError> {
        validate_frame(frame)?;

        if frame.rms() < self.min_rms {
            return Ok(None);
        }

        let pitch = autocorrelate(&frame.samples, frame.sample_rate)
            .filter(|f| (ACCEPT_MIN_HZ..=ACCEPT_MAX_HZ).contains(f));

        if let Some(f) = pitch {
            self.history.push(f);
        }
        Ok(pitch)
    }

    /// Mean of the trailing `n` estimates; `None` before the first estimate.
    pub fn average_over(&self, n: usize) -> Option<f64> {
        stats::mean(&self.recent(n))
    }

    /// Population standard deviation of the trailing `n` estimates
    /// (`0.0` with fewer than two).
    pub fn stddev_over(&self, n: usize) -> f64 {
        stats::population_stddev(&self.recent(n))
    }

    /// Most recent accepted estimate.
    pub fn latest(&self) -> Option<f64> {
        self.history.last()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn recent(&self, n: usize) -> Vec<f64> {
        self.history.recent(n).collect()
    }
}

// ---------------------------------------------------------------------------
// Autocorrelation
// ---------------------------------------------------------------------------

/// Estimate the fundamental of `samples`; `None` when no clear period exists.
fn autocorrelate(samples: &[f32], sample_rate: u32) -> Option<f64> {
    let half = samples.len() / 2;
    let rate = sample_rate as f64;
    let min_lag = ((rate / MAX_VOICE_HZ).floor() as usize).max(1);
    // Rounded up so a MIN_VOICE_HZ period falls inside the scan.
    let max_lag = (rate / MIN_VOICE_HZ).ceil() as usize;

    if half < 3 || min_lag + 1 >= half {
        return None;
    }

    // Lags up to max_lag plus its right-hand neighbour.
    let last_lag = (max_lag + 1).min(half - 1);
    let head_energy: f64 = samples[..half].iter().map(|&s| s as f64 * s as f64).sum();
    if head_energy <= 0.0 {
        return None;
    }

    // Each lag is normalised by the energy of both windows it compares, so
    // the partial period at the window edge does not bias the peak.
    let mut lag_energy = head_energy;
    let mut norm = Vec::with_capacity(last_lag + 1);
    for lag in 0..=last_lag {
        if lag > 0 {
            let incoming = samples[lag + half - 1] as f64;
            let outgoing = samples[lag - 1] as f64;
            lag_energy = (lag_energy + incoming * incoming - outgoing * outgoing).max(0.0);
        }
        let corr: f64 = (0..half)
            .map(|i| samples[i] as f64 * samples[i + lag] as f64)
            .sum();
        let scale = (head_energy * lag_energy).sqrt();
        norm.push(if scale > 0.0 { corr / scale } else { 0.0 });
    }

    let peak = (min_lag..=max_lag)
        .take_while(|&lag| lag + 1 < norm.len())
        .find(|&lag| {
            norm[lag] > MIN_CLARITY && norm[lag] > norm[lag - 1] && norm[lag] > norm[lag + 1]
        })?;

    let (alpha, beta, gamma) = (norm[peak - 1], norm[peak], norm[peak + 1]);
    let denom = alpha - 2.0 * beta + gamma;
    let delta = if denom.abs() > f64::EPSILON {
        0.5 * (alpha - gamma) / denom
    } else {
        0.0
    };

    Some(rate / (peak as f64 + delta))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Instant;

    const RATE: u32 = 44_100;
    const LEN: usize = 2048;

    fn tone(freq: f64, amplitude: f64) -> Frame {
        let samples = (0..LEN)
            .map(|i| {
                (amplitude * (2.0 * std::f64::consts::PI * freq * i as f64 / RATE as f64).sin())
                    as f32
            })
            .collect();
        Frame::new(samples, RATE, Instant::now())
    }

    #[test]
    fn pure_tones_within_one_percent() {
        for freq in [80.0, 82.0, 150.0, 220.0, 440.0, 700.0, 1000.0] {
            let mut est = PitchEstimator::default();
            let got = est.detect(&tone(freq, 0.5)).expect("tone should be voiced");
            let err = (got - freq).abs() / freq;
            assert!(err < 0.01, "{freq} Hz detected as {got:.2} Hz");
        }
    }

    #[test]
    fn lowest_voice_band_edge_is_found_at_common_rates() {
        for rate in [22_050u32, 44_100, 48_000] {
            let samples: Vec<f32> = (0..LEN)
                .map(|i| {
                    let phase = 2.0 * std::f64::consts::PI * 80.0 * i as f64 / rate as f64;
                    (0.5 * phase.sin()) as f32
                })
                .collect();
            let got = autocorrelate(&samples, rate).expect("80 Hz should be found");
            assert!((got - 80.0).abs() < 0.8, "{rate} Hz: 80 Hz detected as {got:.2} Hz");
        }
    }

    #[test]
    fn accepted_estimates_enter_history() {
        let mut est = PitchEstimator::default();
        est.detect(&tone(220.0, 0.5));
        est.detect(&tone(220.0, 0.5));
        assert_eq!(est.history_len(), 2);
        let avg = est.average_over(5).unwrap();
        assert!((avg - 220.0).abs() < 2.2);
        assert!(est.stddev_over(10) < 1e-9);
    }

    #[test]
    fn silence_is_unvoiced_and_leaves_history_alone() {
        let mut est = PitchEstimator::default();
        assert_eq!(est.detect(&tone(220.0, 0.0)), None);
        assert_eq!(est.history_len(), 0);
        assert_eq!(est.average_over(10), None);
    }

    #[test]
    fn malformed_frame_is_absent_not_an_error() {
        let mut est = PitchEstimator::default();
        let frame = Frame::new(vec![f32::INFINITY; LEN], RATE, Instant::now());
        assert_eq!(est.detect(&frame), None);
        assert!(matches!(
            est.try_detect(&frame),
            Err(AnalysisError::NonFiniteSample(0))
        ));
    }

    #[test]
    fn noise_without_period_is_unvoiced() {
        // Deterministic xorshift noise has no autocorrelation peak above 0.5.
        let mut state = 0x2545_f491_u32;
        let samples = (0..LEN)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32) - 0.5
            })
            .collect();
        let mut est = PitchEstimator::default();
        assert_eq!(est.detect(&Frame::new(samples, RATE, Instant::now())), None);
    }

    #[test]
    fn history_is_bounded_to_fifty() {
        let mut est = PitchEstimator::default();
        let frame = tone(440.0, 0.5);
        for _ in 0..60 {
            est.detect(&frame);
        }
        assert_eq!(est.history_len(), HISTORY_CAPACITY);
    }

    #[test]
    fn clear_history_resets_stats() {
        let mut est = PitchEstimator::default();
        est.detect(&tone(440.0, 0.5));
        est.clear_history();
        assert_eq!(est.latest(), None);
        assert_eq!(est.stddev_over(10), 0.0);
    }

    #[test]
    fn on_target_is_inclusive() {
        assert!(is_on_target(205.0, 200.0, 5.0));
        assert!(is_on_target(195.0, 200.0, 5.0));
        assert!(!is_on_target(205.1, 200.0, 5.0));
    }

    proptest! {
        #[test]
        fn quiet_frames_never_touch_history(
            samples in prop::collection::vec(-0.0049f32..0.0049, 256..2048)
        ) {
            let mut est = PitchEstimator::default();
            let frame = Frame::new(samples, RATE, Instant::now());
            prop_assert_eq!(est.detect(&frame), None);
            prop_assert_eq!(est.history_len(), 0);
        }

        #[test]
        fn stddev_of_repeated_value_is_zero(value in 60.0f64..1200.0, count in 1usize..60) {
            let mut history = RingBuffer::new(HISTORY_CAPACITY);
            for _ in 0..count {
                history.push(value);
            }
            let window: Vec<f64> = history.recent(10).collect();
            prop_assert!(stats::population_stddev(&window) < 1e-9);
        }
    }
}
