//! Audio side of the visualizer.
//!
//! A looped track is played on an output device; what is played is tapped,
//! turned into spectrum frames on a capture thread and published to the
//! render loop through a single lock-free slot.

pub mod capture;
pub mod playback;
pub mod slot;
pub mod source;
pub mod track;

pub use capture::is_valid_capture_size;
pub use playback::{CpalTrackProvider, StreamProvider, TrackSource};
pub use slot::{spectrum_slot, SpectrumReader, SpectrumSnapshot};
pub use source::{SourceState, SpectrumSource};
