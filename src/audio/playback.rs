//! Looped track playback through an output device.
//!
//! Every mono sample written to the device is also pushed into the
//! [`SampleTap`] the spectrum capture reads from.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};

use super::capture::SampleTap;
use super::track::{LoopCursor, Track};
use crate::error::SourceError;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// A playing (or pausable) audio stream.
pub trait AudioStream {
    fn play(&self) -> Result<(), SourceError>;
    fn pause(&self) -> Result<(), SourceError>;
    fn sample_rate(&self) -> u32;
}

/// Acquires audio streams that feed a sample tap.
pub trait StreamProvider {
    /// Opens a stream, initially paused, that pushes every played mono
    /// sample into `tap`.
    fn acquire(&mut self, tap: SampleTap) -> Result<Box<dyn AudioStream>, SourceError>;
}

/// Where the looped track comes from.
#[derive(Debug, Clone)]
pub enum TrackSource {
    /// A WAV file on disk
    File(std::path::PathBuf),
    /// The synthesized demo loop
    Demo,
}

/// Plays a looped track on a cpal output device.
pub struct CpalTrackProvider {
    /// Device name, index, or "default"
    device_name: String,
    track_source: TrackSource,
    /// Decoded on first acquisition and reused afterwards
    track: Option<Track>,
}

impl CpalTrackProvider {
    pub fn new(device_name: String, track_source: TrackSource) -> Self {
        Self {
            device_name,
            track_source,
            track: None,
        }
    }

    fn load_track(&mut self, device_rate: u32) -> Result<Track, SourceError> {
        if let Some(track) = &self.track {
            return Ok(track.clone());
        }
        let track = match &self.track_source {
            TrackSource::File(path) => Track::from_wav(path)?,
            TrackSource::Demo => {
                tracing::info!("No track configured, playing the built-in demo loop");
                Track::demo(device_rate)
            }
        };
        self.track = Some(track.clone());
        Ok(track)
    }
}

impl StreamProvider for CpalTrackProvider {
    fn acquire(&mut self, tap: SampleTap) -> Result<Box<dyn AudioStream>, SourceError> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if self.device_name == "default" {
                host.default_output_device()
                    .ok_or(SourceError::NoOutputDevice)
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Playback device: {}", device_name);

        let supported = device
            .default_output_config()
            .map_err(|e| SourceError::Device(e.to_string()))?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0;

        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            sample_rate,
            config.channels,
            sample_format
        );

        let track = self.load_track(sample_rate)?;
        let cursor = LoopCursor::new(track, sample_rate);

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, cursor, tap)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, cursor, tap)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, cursor, tap)?,
            other => return Err(SourceError::UnsupportedFormat(format!("{other:?}"))),
        };

        // Some backends start streams immediately
        stream
            .pause()
            .map_err(|e| SourceError::Playback(e.to_string()))?;

        Ok(Box::new(CpalStream {
            stream,
            sample_rate,
        }))
    }
}

struct CpalStream {
    stream: cpal::Stream,
    sample_rate: u32,
}

impl AudioStream for CpalStream {
    fn play(&self) -> Result<(), SourceError> {
        self.stream
            .play()
            .map_err(|e| SourceError::Playback(e.to_string()))
    }

    fn pause(&self) -> Result<(), SourceError> {
        self.stream
            .pause()
            .map_err(|e| SourceError::Playback(e.to_string()))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut cursor: LoopCursor,
    tap: SampleTap,
) -> Result<cpal::Stream, SourceError>
where
    T: Sample + SizedSample + FromSample<f32>,
{
    let channels = config.channels.max(1) as usize;
    let mut played: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                played.clear();
                for frame in data.chunks_mut(channels) {
                    let sample = cursor.next_sample();
                    played.push(sample);
                    frame.fill(T::from_sample(sample));
                }
                tap.push_slice(&played);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| SourceError::BuildStream(e.to_string()))
}

/// Finds an output device by name or numeric index.
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device, SourceError> {
    let devices: Vec<cpal::Device> = host
        .output_devices()
        .map_err(|e| SourceError::Device(format!("Failed to enumerate devices: {e}")))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        return devices
            .into_iter()
            .nth(index)
            .ok_or_else(|| SourceError::DeviceNotFound(device_spec.to_string()));
    }

    devices
        .into_iter()
        .find(|device| device.name().is_ok_and(|name| name == device_spec))
        .ok_or_else(|| SourceError::DeviceNotFound(device_spec.to_string()))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// If the redirect itself fails the closure still runs, just without suppression.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    let Ok(dev_null) = OpenOptions::new().write(true).open("/dev/null") else {
        return f();
    };

    // Save the current stderr file descriptor
    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return f();
    }

    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return f();
    }

    let result = f();

    // Restore the original stderr
    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    f()
}
