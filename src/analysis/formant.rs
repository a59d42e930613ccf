//! Vowel-resonance (formant) estimation.
//!
//! The numerical method sits behind [`FormantBackend`], chosen once when the
//! estimator is built:
//!
//! * [`LpcBackend`]: linear prediction at 10 kHz; poles of the prediction
//!   polynomial give frequency, bandwidth and envelope energy per formant.
//! * [`SpectralPeakBackend`]: the loudest magnitude-spectrum bin inside each
//!   of three fixed bands.  Energy and bandwidth are reported as zero.
//!
//! [`FormantEstimator`] wraps either backend with the silence gate and the
//! bounded history that the rolling statistics read from.

use num_complex::Complex32;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::audio::{Frame, RingBuffer};

use super::error::{validate_frame, AnalysisError};
use super::lpc;
use super::pitch::{DEFAULT_MIN_RMS, HISTORY_CAPACITY};
use super::stats;

/// Window used by [`FormantEstimator::brightness_ratio`].
pub const BRIGHTNESS_WINDOW: usize = 10;

const F1_BAND: (f64, f64) = (200.0, 1000.0);
const F2_BAND: (f64, f64) = (800.0, 3000.0);
const F3_BAND: (f64, f64) = (2000.0, 4000.0);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One formant: centre frequency (Hz), envelope energy (dB) and bandwidth (Hz).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FormantPeak {
    pub frequency: f64,
    pub energy: f64,
    pub bandwidth: f64,
}

impl FormantPeak {
    fn at(frequency: f64) -> Self {
        Self {
            frequency,
            ..Self::default()
        }
    }
}

/// F1, F2 and F3 of a single frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FormantSample {
    pub f1: FormantPeak,
    pub f2: FormantPeak,
    pub f3: FormantPeak,
}

impl FormantSample {
    pub fn frequency(&self, index: FormantIndex) -> f64 {
        match index {
            FormantIndex::F1 => self.f1.frequency,
            FormantIndex::F2 => self.f2.frequency,
            FormantIndex::F3 => self.f3.frequency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormantIndex {
    F1,
    F2,
    F3,
}

/// Mean formant frequencies over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormantAverages {
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// A method for extracting F1..F3 from one block of samples.
pub trait FormantBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn analyse(&mut self, samples: &[f32], sample_rate: u32)
        -> Result<FormantSample, AnalysisError>;
}

/// Linear-prediction formant tracker.
pub struct LpcBackend {
    planner: FftPlanner<f32>,
}

impl LpcBackend {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }
}

impl Default for LpcBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FormantBackend for LpcBackend {
    fn name(&self) -> &'static str {
        "lpc"
    }

    fn analyse(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<FormantSample, AnalysisError> {
        let target = lpc::PROC_SAMPLE_RATE;
        let (x, rate) = if sample_rate > target {
            let out_len =
                (samples.len() as f64 * target as f64 / sample_rate as f64).round() as usize;
            let rate = sample_rate as f64 * out_len as f64 / samples.len() as f64;
            (lpc::fft_resample(samples, out_len, &mut self.planner), rate)
        } else {
            (samples.to_vec(), sample_rate as f64)
        };

        let need = 2 * lpc::LPC_ORDER;
        if x.len() < need {
            return Err(AnalysisError::FrameTooShort { got: x.len(), need });
        }

        let window = lpc::hamming_window(x.len());
        let shaped: Vec<f32> = lpc::pre_emphasis(&x, lpc::PREEMPH_COEF)
            .iter()
            .zip(&window)
            .map(|(s, w)| s * w)
            .collect();

        let r = lpc::autocorrelation(&shaped, lpc::LPC_ORDER);
        let (a, _) = lpc::levinson_durbin(&r, lpc::LPC_ORDER).ok_or(AnalysisError::LpcUnstable)?;

        let found = lpc::resonances(&a, rate);
        if found.len() < 3 {
            return Err(AnalysisError::NotEnoughFormants(found.len()));
        }

        let peak = |i: usize| FormantPeak {
            frequency: found[i].frequency,
            energy: lpc::envelope_db(&a, found[i].frequency, rate),
            bandwidth: found[i].bandwidth,
        };
        Ok(FormantSample {
            f1: peak(0),
            f2: peak(1),
            f3: peak(2),
        })
    }
}

/// Band-limited spectral peak picking.
pub struct SpectralPeakBackend {
    planner: FftPlanner<f32>,
}

impl SpectralPeakBackend {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }
}

impl Default for SpectralPeakBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FormantBackend for SpectralPeakBackend {
    fn name(&self) -> &'static str {
        "spectral"
    }

    fn analyse(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<FormantSample, AnalysisError> {
        let n = samples.len();
        if n < 2 {
            return Err(AnalysisError::FrameTooShort { got: n, need: 2 });
        }

        let fft = self.planner.plan_fft_forward(n);
        let mut buf: Vec<Complex32> = samples
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let w = 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / (n - 1) as f32).cos();
                Complex32::new(s * w, 0.0)
            })
            .collect();
        fft.process(&mut buf);

        let bin_hz = sample_rate as f64 / n as f64;
        let magnitudes: Vec<f32> = buf[..=n / 2].iter().map(|c| c.norm()).collect();

        let pick = |(lo, hi): (f64, f64)| -> Result<FormantPeak, AnalysisError> {
            let first = (lo / bin_hz).ceil() as usize;
            let last = ((hi / bin_hz).floor() as usize).min(magnitudes.len() - 1);
            (first..=last)
                .filter(|&k| magnitudes[k] > 0.0)
                .max_by(|&a, &b| magnitudes[a].total_cmp(&magnitudes[b]))
                .map(|k| FormantPeak::at(k as f64 * bin_hz))
                .ok_or(AnalysisError::NoSpectralPeak)
        };

        Ok(FormantSample {
            f1: pick(F1_BAND)?,
            f2: pick(F2_BAND)?,
            f3: pick(F3_BAND)?,
        })
    }
}

// ---------------------------------------------------------------------------
// FormantEstimator
// ---------------------------------------------------------------------------

/// Per-frame formant detector with a bounded history.
pub struct FormantEstimator {
    backend: Box<dyn FormantBackend>,
    history: RingBuffer<FormantSample>,
    min_rms: f64,
}

impl Default for FormantEstimator {
    fn default() -> Self {
        Self::with_backend(Box::new(LpcBackend::new()), DEFAULT_MIN_RMS)
    }
}

impl FormantEstimator {
    pub fn with_backend(backend: Box<dyn FormantBackend>, min_rms: f64) -> Self {
        log::debug!("formant: using {} backend", backend.name());
        Self {
            backend,
            history: RingBuffer::new(HISTORY_CAPACITY),
            min_rms,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Estimate F1..F3 for `frame`, or `None` when silent or when the
    /// backend fails.  Failures leave the history untouched.
    pub fn detect(&mut self, frame: &Frame) -> Option<FormantSample> {
        match self.try_detect(frame) {
            Ok(sample) => sample,
            Err(e) => {
                log::debug!("formant: frame rejected: {e}");
                None
            }
        }
    }

    pub fn try_detect(&mut self, frame: &Frame) -> Result<Option<FormantSample>, AnalysisError> {
        validate_frame(frame)?;
        if frame.rms() < self.min_rms {
            return Ok(None);
        }
        let sample = self.backend.analyse(&frame.samples, frame.sample_rate)?;
        self.history.push(sample);
        Ok(Some(sample))
    }

    /// Mean F1/F2/F3 over the trailing `n` entries.
    pub fn average_formants(&self, n: usize) -> Option<FormantAverages> {
        Some(FormantAverages {
            f1: stats::mean(&self.series(FormantIndex::F1, n))?,
            f2: stats::mean(&self.series(FormantIndex::F2, n))?,
            f3: stats::mean(&self.series(FormantIndex::F3, n))?,
        })
    }

    /// Population standard deviation of one formant over the trailing `n`.
    pub fn stddev(&self, index: FormantIndex, n: usize) -> f64 {
        stats::population_stddev(&self.series(index, n))
    }

    /// Mean coefficient of variation (percent) of F1 and F2 over the
    /// trailing `n`; `100.0` when there is no history.
    pub fn resonance_stability(&self, n: usize) -> f64 {
        let cv = |index| {
            let values = self.series(index, n);
            match stats::WindowedStat::of(&values) {
                Some(s) => stats::coefficient_of_variation(s.stddev, s.mean),
                None => 100.0,
            }
        };
        (cv(FormantIndex::F1) + cv(FormantIndex::F2)) / 2.0
    }

    /// Mean F2 over mean F1 across the last [`BRIGHTNESS_WINDOW`] entries.
    pub fn brightness_ratio(&self) -> Option<f64> {
        let avg = self.average_formants(BRIGHTNESS_WINDOW)?;
        (avg.f1 != 0.0).then(|| avg.f2 / avg.f1)
    }

    pub fn latest(&self) -> Option<FormantSample> {
        self.history.last()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn series(&self, index: FormantIndex, n: usize) -> Vec<f64> {
        self.history.recent(n).map(|s| s.frequency(index)).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
