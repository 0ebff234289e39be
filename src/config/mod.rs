use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::cw::{DecoderTiming, BREAK_DELAY_MS, DOT_THRESHOLD_MS};
use crate::error::{Error, Result};

/// User settings. The code table itself is fixed and not part of this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Decoding
    pub dot_threshold_ms: u64,
    pub break_delay_ms: u64,

    // Input
    pub signal_key: char,

    // Sidetone
    pub sidetone_frequency: f32,
    pub sidetone_volume: f32,
    pub sample_rate: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dot_threshold_ms: DOT_THRESHOLD_MS,
            break_delay_ms: BREAK_DELAY_MS,
            signal_key: 'm',
            sidetone_frequency: 600.0,
            sidetone_volume: 0.5,
            sample_rate: 48_000.0,
        }
    }
}

impl Settings {
    /// Path to the settings file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("telegraph");
            path.push("settings.json");
            path
        })
    }

    pub fn timing(&self) -> DecoderTiming {
        DecoderTiming {
            dot_threshold_ms: self.dot_threshold_ms,
            break_delay_ms: self.break_delay_ms,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dot_threshold_ms == 0 {
            return Err(Error::InvalidSetting("dot_threshold_ms must be positive".into()));
        }
        if self.break_delay_ms == 0 {
            return Err(Error::InvalidSetting("break_delay_ms must be positive".into()));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(Error::InvalidSetting(format!(
                "sample_rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if !self.sidetone_frequency.is_finite() || self.sidetone_frequency <= 0.0 {
            return Err(Error::InvalidSetting(format!(
                "sidetone_frequency must be positive, got {}",
                self.sidetone_frequency
            )));
        }
        Ok(())
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            warn!("could not determine config path, using default settings");
            return Self::default();
        };

        if !path.exists() {
            debug!(?path, "settings file does not exist, using defaults");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(?path, error = %e, "failed to load settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&contents)?;
        settings.validate()?;
        info!(?path, "loaded settings");
        Ok(settings)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(Error::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let mut file = fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        info!(?path, "saved settings");
        Ok(())
    }
}
