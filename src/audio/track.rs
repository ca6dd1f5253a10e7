//! The looped track that feeds playback.

use std::f32::consts::TAU;
use std::path::Path;

use crate::error::SourceError;

/// Mono PCM audio held in memory.
#[derive(Debug, Clone)]
pub struct Track {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Track {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Decodes a WAV file, downmixing all channels to mono.
    ///
    /// # Errors
    /// - If the file cannot be opened or is not a WAV file
    /// - If it contains no samples
    pub fn from_wav(path: &Path) -> Result<Self, SourceError> {
        let mut reader = hound::WavReader::open(path)
            .map_err(|e| SourceError::Track(format!("{}: {e}", path.display())))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| SourceError::Track(e.to_string()))?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| SourceError::Track(e.to_string()))?
            }
        };

        let samples: Vec<f32> = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        if samples.is_empty() {
            return Err(SourceError::Track(format!(
                "{} contains no audio",
                path.display()
            )));
        }

        tracing::info!(
            "Loaded track {}: {:.1}s at {}Hz, {} channel(s)",
            path.display(),
            samples.len() as f32 / spec.sample_rate as f32,
            spec.sample_rate,
            channels
        );

        Ok(Self::new(samples, spec.sample_rate))
    }

    /// A short synthesized loop with a kick on every beat, a sustained chord
    /// and bright off-beat ticks, so each band gets some energy.
    pub fn demo(sample_rate: u32) -> Self {
        const BPM: f32 = 120.0;
        const BEATS: usize = 8;

        let rate = sample_rate as f32;
        let beat_len = (rate * 60.0 / BPM) as usize;
        let total = beat_len * BEATS;
        let chord = [220.0, 277.18, 329.63];

        let samples = (0..total)
            .map(|n| {
                let t = n as f32 / rate;
                let in_beat = (n % beat_len) as f32 / rate;

                // kick: pitch drop from 110Hz to 45Hz with a fast decay
                let kick_freq = 45.0 + 65.0 * (-in_beat * 30.0).exp();
                let kick = (TAU * kick_freq * in_beat).sin() * (-in_beat * 8.0).exp();

                let pad: f32 = chord.iter().map(|f| (TAU * f * t).sin()).sum::<f32>() / 3.0;

                // tick on the off-beat
                let off = ((n + beat_len / 2) % beat_len) as f32 / rate;
                let tick = (TAU * 6000.0 * t).sin() * (-off * 60.0).exp();

                0.55 * kick + 0.25 * pad + 0.2 * tick
            })
            .collect();

        Self::new(samples, sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Endless playback position over a track, resampled to the output rate.
#[derive(Debug)]
pub struct LoopCursor {
    track: Track,
    position: f64,
    step: f64,
}

impl LoopCursor {
    pub fn new(track: Track, output_rate: u32) -> Self {
        let step = track.sample_rate as f64 / output_rate.max(1) as f64;
        Self {
            track,
            position: 0.0,
            step,
        }
    }

    /// Next output sample, wrapping around at the end of the track.
    pub fn next_sample(&mut self) -> f32 {
        let samples = &self.track.samples;
        if samples.is_empty() {
            return 0.0;
        }

        let len = samples.len();
        let index = self.position as usize % len;
        let frac = (self.position - self.position.floor()) as f32;
        let current = samples[index];
        let next = samples[(index + 1) % len];

        self.position += self.step;
        if self.position >= len as f64 {
            self.position -= len as f64;
        }

        current + (next - current) * frac
    }
}
