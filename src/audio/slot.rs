//! Single-slot publication of band intensities from the capture thread to
//! the render loop.
//!
//! Backed by a triple buffer: the writer never waits for the reader and the
//! reader always gets the most recent complete value without taking a lock.

use triple_buffer::{Input, Output, TripleBuffer};

use crate::analysis::{self, BandIntensities};

/// What the render loop sees of the latest spectrum frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpectrumSnapshot {
    pub bands: BandIntensities,
    /// Number of frames delivered so far, starting at 1
    pub sequence: u64,
}

/// Writing half, owned by the capture callback.
pub struct SpectrumPublisher {
    input: Input<Option<SpectrumSnapshot>>,
    sequence: u64,
}

/// Reading half, owned by the visualization surface.
pub struct SpectrumReader {
    output: Output<Option<SpectrumSnapshot>>,
}

/// Creates a connected publisher/reader pair holding no data yet.
pub fn spectrum_slot() -> (SpectrumPublisher, SpectrumReader) {
    let (input, output) = TripleBuffer::new(&None).split();
    (
        SpectrumPublisher { input, sequence: 0 },
        SpectrumReader { output },
    )
}

impl SpectrumPublisher {
    /// Analyzes a spectrum frame and publishes the result.
    pub fn publish_frame(&mut self, frame: &[i8]) {
        self.publish(analysis::analyze(frame));
    }

    pub fn publish(&mut self, bands: BandIntensities) {
        self.sequence += 1;
        self.input.write(Some(SpectrumSnapshot {
            bands,
            sequence: self.sequence,
        }));
    }
}

impl SpectrumReader {
    /// Latest published snapshot, or `None` if nothing was ever published.
    pub fn latest(&mut self) -> Option<SpectrumSnapshot> {
        *self.output.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_until_first_publish() {
        let (_publisher, mut reader) = spectrum_slot();
        assert_eq!(reader.latest(), None);
    }

    #[test]
    fn test_reader_sees_latest_value() {
        let (mut publisher, mut reader) = spectrum_slot();
        publisher.publish_frame(&[10, -10, 20, -20, 30, -30, 40, -40, 50, -50]);
        publisher.publish_frame(&[0; 10]);

        let snapshot = reader.latest().unwrap();
        assert_eq!(snapshot.sequence, 2);
        assert_eq!(snapshot.bands, BandIntensities::default());

        // value is held until replaced
        assert_eq!(reader.latest().unwrap().sequence, 2);
    }

    #[test]
    fn test_publish_across_threads() {
        let (mut publisher, mut reader) = spectrum_slot();
        let writer = std::thread::spawn(move || {
            for i in 0..1000 {
                publisher.publish(BandIntensities {
                    bass: i as f32,
                    mid: i as f32,
                    treble: i as f32,
                });
            }
        });
        writer.join().unwrap();

        let snapshot = reader.latest().unwrap();
        assert_eq!(snapshot.sequence, 1000);
        assert_eq!(snapshot.bands.bass, 999.0);
        assert_eq!(snapshot.bands.bass, snapshot.bands.treble);
    }
}
