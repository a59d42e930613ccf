//! Runs both estimators on every frame and snapshots the derived features
//! the exercise machine reads.

use std::time::Instant;

use serde::Serialize;

use crate::audio::Frame;
use crate::config::{AnalysisConfig, FormantMethod};

use super::formant::{
    FormantAverages, FormantBackend, FormantEstimator, FormantSample, LpcBackend,
    SpectralPeakBackend,
};
use super::pitch::PitchEstimator;

/// Feature snapshot for one processed frame.
///
/// `avg_*` and stability values reflect the histories *after* this frame,
/// so they stay defined across silent frames once any data exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Features {
    #[serde(skip)]
    pub at: Instant,
    /// This frame's pitch, `None` when unvoiced.
    pub pitch: Option<f64>,
    pub avg_pitch: Option<f64>,
    /// Population stddev of recent pitch (0 with fewer than two estimates).
    pub pitch_stddev: f64,
    /// This frame's formants, `None` when unvoiced or on estimator failure.
    pub formants: Option<FormantSample>,
    pub avg_formants: Option<FormantAverages>,
    /// Resonance stability percentage; `None` until a formant sample exists.
    pub resonance_stability: Option<f64>,
    pub brightness: Option<f64>,
}

impl Features {
    /// A snapshot with nothing detected.
    pub fn silent(at: Instant) -> Self {
        Self {
            at,
            pitch: None,
            avg_pitch: None,
            pitch_stddev: 0.0,
            formants: None,
            avg_formants: None,
            resonance_stability: None,
            brightness: None,
        }
    }
}

/// Owns one pitch and one formant estimator.
pub struct Analyzer {
    pitch: PitchEstimator,
    formant: FormantEstimator,
    average_window: usize,
    stability_window: usize,
}

impl Analyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        let backend: Box<dyn FormantBackend> = match config.formant_method {
            FormantMethod::Lpc => Box::new(LpcBackend::new()),
            FormantMethod::Spectral => Box::new(SpectralPeakBackend::new()),
        };
        Self::with_estimators(
            PitchEstimator::new(config.min_rms),
            FormantEstimator::with_backend(backend, config.min_rms),
            config,
        )
    }

    pub fn with_estimators(
        pitch: PitchEstimator,
        formant: FormantEstimator,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            pitch,
            formant,
            average_window: config.average_window.max(1),
            stability_window: config.stability_window.max(1),
        }
    }

    /// Analyse one frame.
    pub fn analyze(&mut self, frame: &Frame) -> Features {
        let pitch = self.pitch.detect(frame);
        let formants = self.formant.detect(frame);
        let has_formants = self.formant.history_len() > 0;

        Features {
            at: frame.captured_at,
            pitch,
            avg_pitch: self.pitch.average_over(self.average_window),
            pitch_stddev: self.pitch.stddev_over(self.stability_window),
            formants,
            avg_formants: self.formant.average_formants(self.average_window),
            resonance_stability: has_formants
                .then(|| self.formant.resonance_stability(self.stability_window)),
            brightness: self.formant.brightness_ratio(),
        }
    }

    /// Drop both histories; called at the start of every session.
    pub fn reset(&mut self) {
        self.pitch.clear_history();
        self.formant.clear_history();
    }

    pub fn pitch(&self) -> &PitchEstimator {
        &self.pitch
    }

    pub fn formant(&self) -> &FormantEstimator {
        &self.formant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f64, amplitude: f32) -> Frame {
        let rate = 44_100;
        let samples = (0..2048)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * freq * i as f64 / rate as f64;
                amplitude * phase.sin() as f32
            })
            .collect();
        Frame::new(samples, rate, Instant::now())
    }

    #[test]
    fn voiced_frame_fills_pitch_stats() {
        let mut analyzer = Analyzer::new(&AnalysisConfig::default());
        let f = analyzer.analyze(&tone(220.0, 0.5));
        let pitch = f.pitch.unwrap();
        assert!((pitch - 220.0).abs() < 2.2);
        assert_eq!(f.avg_pitch, Some(pitch));
        assert_eq!(f.pitch_stddev, 0.0);
    }

    #[test]
    fn silence_keeps_previous_averages() {
        let mut analyzer = Analyzer::new(&AnalysisConfig::default());
        analyzer.analyze(&tone(220.0, 0.5));
        let quiet = analyzer.analyze(&tone(220.0, 0.0));
        assert_eq!(quiet.pitch, None);
        assert!(quiet.avg_pitch.is_some());
    }

    #[test]
    fn reset_clears_histories() {
        let mut analyzer = Analyzer::new(&AnalysisConfig::default());
        analyzer.analyze(&tone(220.0, 0.5));
        analyzer.reset();
        assert_eq!(analyzer.pitch().history_len(), 0);
        assert_eq!(analyzer.formant().history_len(), 0);
        let f = analyzer.analyze(&tone(220.0, 0.0));
        assert_eq!(f, Features::silent(f.at));
    }

    #[test]
    fn spectral_method_selected_from_config() {
        let config = AnalysisConfig {
            formant_method: FormantMethod::Spectral,
            ..AnalysisConfig::default()
        };
        let analyzer = Analyzer::new(&config);
        assert_eq!(analyzer.formant().backend_name(), "spectral");
    }
}
