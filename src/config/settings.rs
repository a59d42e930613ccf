//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::analysis::note;

// ---------------------------------------------------------------------------
// FormantMethod
// ---------------------------------------------------------------------------

/// Selects the formant backend, fixed for the lifetime of an analyzer.
///
/// | Variant  | Method                                         |
/// |----------|------------------------------------------------|
/// | Lpc      | Linear prediction at 10 kHz, pole picking      |
/// | Spectral | Loudest FFT bin in each of three fixed bands   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormantMethod {
    Lpc,
    Spectral,
}

impl Default for FormantMethod {
    fn default() -> Self {
        Self::Lpc
    }
}

// ---------------------------------------------------------------------------
// PracticeConfig
// ---------------------------------------------------------------------------

/// Per-user practice parameters read once per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeConfig {
    /// Target note for the pitch-sustain test, e.g. `"E3"`.
    pub target_note: String,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            target_note: "E3".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for microphone capture and framing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Input device name; `None` means the system default.
    pub input_device: Option<String>,
    /// Mono samples per analysis frame.
    pub frame_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input_device: None,
            frame_size: crate::audio::DEFAULT_FRAME_LEN,
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisConfig
// ---------------------------------------------------------------------------

/// Estimator thresholds and statistic windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// RMS below which a frame is treated as silence.
    pub min_rms: f64,
    pub formant_method: FormantMethod,
    /// Trailing entries used for averaged pitch/formants.
    pub average_window: usize,
    /// Trailing entries used for stddev and resonance stability.
    pub stability_window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_rms: 0.005,
            formant_method: FormantMethod::default(),
            average_window: 5,
            stability_window: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_trainer::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub practice: PracticeConfig,
    pub audio: AudioConfig,
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Frequency of the configured target note.
    pub fn target_frequency(&self) -> Result<f64> {
        note::named_note_frequency(&self.practice.target_note)
            .with_context(|| format!("invalid target note {:?}", self.practice.target_note))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// A default `AppConfig` survives a TOML round trip.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.practice.target_note, loaded.practice.target_note);
        assert_eq!(original.audio.input_device, loaded.audio.input_device);
        assert_eq!(original.audio.frame_size, loaded.audio.frame_size);
        assert_eq!(original.analysis.min_rms, loaded.analysis.min_rms);
        assert_eq!(
            original.analysis.formant_method,
            loaded.analysis.formant_method
        );
        assert_eq!(
            original.analysis.stability_window,
            loaded.analysis.stability_window
        );
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.practice.target_note, "E3");
        assert_eq!(config.audio.frame_size, 2048);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.practice.target_note, "E3");
        assert!(cfg.audio.input_device.is_none());
        assert_eq!(cfg.analysis.min_rms, 0.005);
        assert_eq!(cfg.analysis.formant_method, FormantMethod::Lpc);
        assert_eq!(cfg.analysis.average_window, 5);
        assert_eq!(cfg.analysis.stability_window, 10);
        let f = cfg.target_frequency().unwrap();
        assert!((f - 164.81).abs() < 0.01);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.practice.target_note = "A3".into();
        cfg.audio.input_device = Some("USB Mic".into());
        cfg.analysis.formant_method = FormantMethod::Spectral;
        cfg.analysis.min_rms = 0.01;

        cfg.save_to(&path).expect("save");
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("formant_method = \"spectral\""));

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded.practice.target_note, "A3");
        assert_eq!(loaded.audio.input_device, Some("USB Mic".into()));
        assert_eq!(loaded.analysis.formant_method, FormantMethod::Spectral);
        assert_eq!(loaded.analysis.min_rms, 0.01);
        assert!((loaded.target_frequency().unwrap() - 220.0).abs() < 1e-9);
    }

    #[test]
    fn bad_target_note_is_an_error() {
        let mut cfg = AppConfig::default();
        cfg.practice.target_note = "Q9".into();
        assert!(cfg.target_frequency().is_err());
    }
}
