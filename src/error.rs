//! Error types for the visualization core.
//!
//! Command handlers wrap these in `anyhow` the same way they wrap everything
//! else; the core itself only ever returns these typed errors.

use thiserror::Error;

/// Failure to acquire or drive the audio stream and its capture facility.
///
/// Every variant is recoverable: the caller may retry `start()` later or
/// keep running with the visualization disabled.
#[derive(Error, Debug)]
pub enum SourceError {
    /// No output device is available on the default host
    #[error("No audio output device available")]
    NoOutputDevice,

    /// The configured device name or index could not be resolved
    #[error("Audio output device '{0}' not found. Use 'orbitscope list-devices' to see available devices.")]
    DeviceNotFound(String),

    /// Device enumeration or configuration query failed
    #[error("Audio device error: {0}")]
    Device(String),

    /// The device's native sample format is not one we can write
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Building the output stream failed
    #[error("Failed to build audio stream: {0}")]
    BuildStream(String),

    /// Starting or pausing playback failed
    #[error("Playback control failed: {0}")]
    Playback(String),

    /// The track could not be decoded
    #[error("Failed to load track: {0}")]
    Track(String),

    /// The capture thread could not be spawned
    #[error("Failed to start spectrum capture: {0}")]
    Capture(String),
}

/// A settings value rejected at the settings boundary.
#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("Unknown setting '{0}'. Known settings: show_bass, show_mid, show_treble, color_theme, size_scale")]
    UnknownKey(String),

    #[error("Setting '{key}' expects true or false, got '{value}'")]
    InvalidBool { key: String, value: String },

    #[error("Unknown color theme '{0}'. Choose red, green or blue")]
    InvalidTheme(String),

    #[error("Setting '{key}' expects a number, got '{value}'")]
    InvalidNumber { key: String, value: String },

    #[error("Please select a size scale between 0 (exclusive) and 3, got {0}")]
    SizeScaleOutOfRange(f32),

    #[error("Capture size must be a power of two between 128 and 1024, got {0}")]
    InvalidCaptureSize(usize),

    #[error("Frame rate must be between 1 and 240 frames per second, got {0}")]
    FrameRateOutOfRange(u32),
}
