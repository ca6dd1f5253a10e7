//! Configuration file management for orbitscope.
//!
//! This module handles loading and saving application configuration from TOML files.
//! Configuration is stored in the user's config directory.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::{is_valid_capture_size, TrackSource};
use crate::error::SettingsError;
use crate::visual::{ColorTheme, VisualizationState, MAX_SIZE_SCALE};

/// Highest accepted `visual.frame_rate`.
pub const MAX_FRAME_RATE: u32 = 240;

/// Audio playback and capture configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `orbitscope list-devices`
    /// - device name from `orbitscope list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// WAV file looped during visualization; empty plays the demo loop
    #[serde(default)]
    pub track: String,
    /// Spectrum frame length, a power of two in [128, 1024]
    #[serde(default = "default_capture_size")]
    pub capture_size: usize,
    /// Whether the visualizer may open an audio stream at all
    #[serde(default = "default_true")]
    pub capture_enabled: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            track: String::new(),
            capture_size: default_capture_size(),
            capture_enabled: true,
        }
    }
}

impl AudioConfig {
    pub fn track_source(&self) -> TrackSource {
        if self.track.trim().is_empty() {
            TrackSource::Demo
        } else {
            TrackSource::File(PathBuf::from(self.track.trim()))
        }
    }
}

/// Appearance of the visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_true")]
    pub show_bass: bool,
    #[serde(default = "default_true")]
    pub show_mid: bool,
    #[serde(default = "default_true")]
    pub show_treble: bool,
    #[serde(default)]
    pub color_theme: ColorTheme,
    #[serde(default = "default_size_scale")]
    pub size_scale: f32,
    /// Frames drawn per second, in [1, 240]
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            show_bass: true,
            show_mid: true,
            show_treble: true,
            color_theme: ColorTheme::default(),
            size_scale: default_size_scale(),
            frame_rate: default_frame_rate(),
        }
    }
}

impl VisualConfig {
    pub fn state(&self) -> VisualizationState {
        VisualizationState {
            size_scale: self.size_scale,
            show_bass: self.show_bass,
            show_mid: self.show_mid,
            show_treble: self.show_treble,
            theme: self.color_theme,
        }
    }
}

fn default_device() -> String {
    "default".to_string()
}

fn default_capture_size() -> usize {
    128
}

fn default_true() -> bool {
    true
}

fn default_size_scale() -> f32 {
    1.0
}

fn default_frame_rate() -> u32 {
    60
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrbitConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub visual: VisualConfig,
}

impl OrbitConfig {
    /// Loads configuration from `path`.
    ///
    /// # Errors
    /// - If the config file cannot be read
    /// - If the TOML is malformed or a value is out of range
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parses and validates configuration text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: OrbitConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_size_scale(self.visual.size_scale)?;
        if !is_valid_capture_size(self.audio.capture_size) {
            return Err(SettingsError::InvalidCaptureSize(self.audio.capture_size));
        }
        if !(1..=MAX_FRAME_RATE).contains(&self.visual.frame_rate) {
            return Err(SettingsError::FrameRateOutOfRange(self.visual.frame_rate));
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        tracing::info!("Configuration saved");
        Ok(())
    }
}

pub(crate) fn validate_size_scale(scale: f32) -> Result<f32, SettingsError> {
    if scale.is_finite() && scale > 0.0 && scale <= MAX_SIZE_SCALE {
        Ok(scale)
    } else {
        Err(SettingsError::SizeScaleOutOfRange(scale))
    }
}

/// Directory holding the config file, `~/.config/orbitscope`.
///
/// # Errors
/// - If the home directory cannot be determined
fn config_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    Ok(home.join(".config").join("orbitscope"))
}

/// Retrieves the path to the config file, creating its directory.
///
/// # Errors
/// - If the config directory cannot be determined
/// - If the config directory cannot be created
pub fn config_path() -> anyhow::Result<PathBuf> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
    Ok(dir.join("orbitscope.toml"))
}
