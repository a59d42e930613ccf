//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\voice-trainer\
//!   macOS:   ~/Library/Application Support/voice-trainer/
//!   Linux:   ~/.config/voice-trainer/
//!
//! Data dir (progression ledger):
//!   Windows: %LOCALAPPDATA%\voice-trainer\
//!   macOS:   ~/Library/Application Support/voice-trainer/
//!   Linux:   ~/.local/share/voice-trainer/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory for persisted practice data.
    pub data_dir: PathBuf,
    /// Full path to `progress.json`.
    pub progress_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "voice-trainer";

    /// Resolves all paths using the `dirs` crate, falling back to the
    /// current directory when the platform has no standard location.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            progress_file: data_dir.join("progress.json"),
            config_dir,
            data_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths.data_dir.ends_with("voice-trainer"));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .progress_file
            .file_name()
            .is_some_and(|n| n == "progress.json"));
    }
}
