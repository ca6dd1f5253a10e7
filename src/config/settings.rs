//! Individual visualization settings, validated at the boundary.

use std::path::Path;

use crate::error::SettingsError;
use crate::visual::ColorTheme;

use super::file::{validate_size_scale, OrbitConfig, VisualConfig};

/// Keys accepted by [`SettingChange::parse`].
pub const SETTING_KEYS: [&str; 5] = ["show_bass", "show_mid", "show_treble", "color_theme", "size_scale"];

/// One changed visualization setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingChange {
    ShowBass(bool),
    ShowMid(bool),
    ShowTreble(bool),
    ColorTheme(ColorTheme),
    SizeScale(f32),
}

impl SettingChange {
    /// Parses a `key = value` pair as typed on the command line.
    pub fn parse(key: &str, value: &str) -> Result<Self, SettingsError> {
        let key = key.trim();
        let value = value.trim();

        match key {
            "show_bass" => parse_bool(key, value).map(Self::ShowBass),
            "show_mid" => parse_bool(key, value).map(Self::ShowMid),
            "show_treble" => parse_bool(key, value).map(Self::ShowTreble),
            "color_theme" => value.parse().map(Self::ColorTheme),
            "size_scale" => {
                let scale: f32 = value.parse().map_err(|_| SettingsError::InvalidNumber {
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
                validate_size_scale(scale).map(Self::SizeScale)
            }
            other => Err(SettingsError::UnknownKey(other.to_string())),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::ShowBass(_) => "show_bass",
            Self::ShowMid(_) => "show_mid",
            Self::ShowTreble(_) => "show_treble",
            Self::ColorTheme(_) => "color_theme",
            Self::SizeScale(_) => "size_scale",
        }
    }

    /// Writes the change into a config section.
    pub fn apply_to(&self, config: &mut VisualConfig) {
        match *self {
            Self::ShowBass(show) => config.show_bass = show,
            Self::ShowMid(show) => config.show_mid = show,
            Self::ShowTreble(show) => config.show_treble = show,
            Self::ColorTheme(theme) => config.color_theme = theme,
            Self::SizeScale(scale) => config.size_scale = scale,
        }
    }

    /// Writes the change into the config file at `path`.
    ///
    /// The file is re-read first so edits made to other keys since startup
    /// survive.
    ///
    /// # Errors
    /// - If the config file cannot be read, parsed or written
    pub fn persist(&self, path: &Path) -> anyhow::Result<()> {
        let mut config = OrbitConfig::load_from(path)?;
        self.apply_to(&mut config.visual);
        config.save_to(path)
    }

    /// The changes that turn `old` into `new`, one per differing key.
    pub fn diff(old: &VisualConfig, new: &VisualConfig) -> Vec<SettingChange> {
        let mut changes = Vec::new();
        if old.show_bass != new.show_bass {
            changes.push(Self::ShowBass(new.show_bass));
        }
        if old.show_mid != new.show_mid {
            changes.push(Self::ShowMid(new.show_mid));
        }
        if old.show_treble != new.show_treble {
            changes.push(Self::ShowTreble(new.show_treble));
        }
        if old.color_theme != new.color_theme {
            changes.push(Self::ColorTheme(new.color_theme));
        }
        if old.size_scale != new.size_scale {
            changes.push(Self::SizeScale(new.size_scale));
        }
        changes
    }
}

impl std::fmt::Display for SettingChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShowBass(v) | Self::ShowMid(v) | Self::ShowTreble(v) => write!(f, "{} = {}", self.key(), v),
            Self::ColorTheme(theme) => write!(f, "{} = {}", self.key(), theme),
            Self::SizeScale(scale) => write!(f, "{} = {:.1}", self.key(), scale),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(SettingsError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
