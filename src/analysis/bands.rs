//! Bass/mid/treble reduction of a spectrum frame.
//!
//! The frame is cut into three contiguous index ranges by fixed percentages
//! (bass 0-10%, mid 10-40%, treble 40-100%) and each range is reduced to the
//! mean absolute magnitude of its samples.

use std::ops::Range;

/// Upper bound of the bass range, in percent of the frame length.
const BASS_END_PERCENT: usize = 10;
/// Upper bound of the mid range, in percent of the frame length.
const MID_END_PERCENT: usize = 40;

/// Mean absolute magnitude of each band of the latest spectrum frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandIntensities {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

/// One of the three fixed bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Bass,
    Mid,
    Treble,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::Bass, Band::Mid, Band::Treble];
}

impl BandIntensities {
    /// Returns the intensity of a single band.
    pub fn get(&self, band: Band) -> f32 {
        match band {
            Band::Bass => self.bass,
            Band::Mid => self.mid,
            Band::Treble => self.treble,
        }
    }
}

/// Splits a frame of `len` samples into the bass, mid and treble ranges.
///
/// A range ends at the first index at or above its percentage of `len`, so
/// the index sitting inside a boundary percentage belongs to the lower band.
/// The three ranges are contiguous, non-overlapping and cover `0..len`.
pub fn band_ranges(len: usize) -> [Range<usize>; 3] {
    let bass_end = (len * BASS_END_PERCENT).div_ceil(100);
    let mid_end = (len * MID_END_PERCENT).div_ceil(100);
    [0..bass_end, bass_end..mid_end, mid_end..len]
}

/// Reduces a spectrum frame into its three band intensities.
///
/// An empty frame (or an empty range of a very short frame) yields zero for
/// the affected bands.
pub fn analyze(frame: &[i8]) -> BandIntensities {
    let [bass, mid, treble] = band_ranges(frame.len());

    BandIntensities {
        bass: mean_magnitude(&frame[bass]),
        mid: mean_magnitude(&frame[mid]),
        treble: mean_magnitude(&frame[treble]),
    }
}

fn mean_magnitude(samples: &[i8]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    // i8::MIN has no positive counterpart, so widen before taking abs
    let total: f32 = samples.iter().map(|&s| (s as f32).abs()).sum();
    total / samples.len() as f32
}
