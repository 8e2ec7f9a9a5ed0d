//! Recording configuration
//!
//! YAML-backed capture settings. A missing or unparsable file falls back
//! to defaults so a broken config never blocks a recording session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::{DEFAULT_BITS_PER_SAMPLE, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};
use crate::wav::WavFormat;

/// Capture format settings for narration recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
        }
    }
}

impl RecordingConfig {
    /// The WAV format chapters get exported with
    pub fn wav_format(&self) -> WavFormat {
        WavFormat::new(self.channels, self.sample_rate, self.bits_per_sample)
    }
}

/// Default config location: `<config dir>/lectern/recording.yaml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lectern")
        .join("recording.yaml")
}

/// Load the recording config, falling back to defaults when the file is
/// missing or does not parse.
pub fn load_config(path: &Path) -> RecordingConfig {
    if !path.exists() {
        log::info!(
            "no recording config at {}, using defaults",
            path.display()
        );
        return RecordingConfig::default();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("failed to parse recording config: {}, using defaults", e);
                RecordingConfig::default()
            }
        },
        Err(e) => {
            log::warn!("failed to read recording config: {}, using defaults", e);
            RecordingConfig::default()
        }
    }
}

/// Save the recording config, creating parent directories as needed.
pub fn save_config(config: &RecordingConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let yaml =
        serde_yaml::to_string(config).context("failed to serialize recording config")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}
