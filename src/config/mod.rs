//! Configuration management for orbitscope.
//!
//! This module handles loading and saving application configuration from TOML files,
//! parsing of individual visualization settings, and picking up edits made to the
//! file while the visualizer is running. Configuration is stored in the user's
//! config directory.

pub mod file;
pub mod settings;
pub mod watch;

pub use file::{config_path, AudioConfig, OrbitConfig, VisualConfig, MAX_FRAME_RATE};
pub use settings::{SettingChange, SETTING_KEYS};
pub use watch::SettingsWatcher;
