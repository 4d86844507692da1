//! Persisted user preferences.
//!
//! Stored as a flat TOML table:
//!
//! ```toml
//! sensitivity = 100.0
//! threshold = 11.0
//! bell_type = "Regular Bell"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sound::BellType;
use crate::trigger::{clamp_percent, TriggerConfig};

/// User preferences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sound intensity percentage [0, 100]
    pub sensitivity: f64,

    /// Motion threshold percentage [0, 100]
    pub threshold: f64,

    pub bell_type: BellType,
}

impl Default for Settings {
    fn default() -> Self {
        let trigger = TriggerConfig::default();
        Self {
            sensitivity: trigger.sensitivity,
            threshold: trigger.threshold,
            bell_type: BellType::default(),
        }
    }
}

impl Settings {
    /// Trigger percentages, clamped into range
    pub fn trigger(&self) -> TriggerConfig {
        TriggerConfig::new(self.threshold, self.sensitivity)
    }

    pub fn set_threshold(&mut self, percent: f64) {
        self.threshold = clamp_percent(percent);
    }

    pub fn set_sensitivity(&mut self, percent: f64) {
        self.sensitivity = clamp_percent(percent);
    }

    /// Restore threshold and sensitivity defaults (the bell selection is kept)
    pub fn reset(&mut self) {
        let defaults = Settings::default();
        self.threshold = defaults.threshold;
        self.sensitivity = defaults.sensitivity;
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trigger = self.trigger();
        write!(
            f,
            "threshold {:.0}% (>{:.3}), sensitivity {:.0}% (x{:.2}), bell: {}",
            self.threshold,
            trigger.effective_threshold(),
            self.sensitivity,
            trigger.effective_sensitivity(),
            self.bell_type
        )
    }
}

/// Preference persistence errors
#[derive(Debug)]
pub enum SettingsError {
    /// Reading or writing the file failed
    Io(PathBuf, std::io::Error),
    /// The file is not valid preferences TOML
    Parse(PathBuf, toml::de::Error),
    /// Settings could not be encoded
    Serialize(toml::ser::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(path, e) => write!(f, "{}: {}", path.display(), e),
            SettingsError::Parse(path, e) => write!(f, "{}: {}", path.display(), e),
            SettingsError::Serialize(e) => write!(f, "Failed to encode settings: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(_, e) => Some(e),
            SettingsError::Parse(_, e) => Some(e),
            SettingsError::Serialize(e) => Some(e),
        }
    }
}

/// Key-value preferences file
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields defaults
    pub fn load(&self) -> Result<Settings, SettingsError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No settings at {}, using defaults", self.path.display());
                return Ok(Settings::default());
            }
            Err(e) => return Err(SettingsError::Io(self.path.clone(), e)),
        };

        let mut settings: Settings =
            toml::from_str(&text).map_err(|e| SettingsError::Parse(self.path.clone(), e))?;
        settings.threshold = clamp_percent(settings.threshold);
        settings.sensitivity = clamp_percent(settings.sensitivity);
        Ok(settings)
    }

    /// Write settings, creating parent directories as needed
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let text = toml::to_string(settings).map_err(SettingsError::Serialize)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io(parent.to_path_buf(), e))?;
        }
        std::fs::write(&self.path, text).map_err(|e| SettingsError::Io(self.path.clone(), e))?;
        log::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
