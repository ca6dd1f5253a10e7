//! The spectrum source: one audio stream plus the capture facility bound to
//! it, with a start/pause/resume/release lifecycle.

use super::capture::{CaptureFacility, FrameCallback, SampleTap, MAX_CAPTURE_RATE_HZ};
use super::playback::{AudioStream, StreamProvider};
use crate::error::SourceError;

/// Lifecycle state of a [`SpectrumSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Never started
    NotStarted,
    /// Playing and delivering frames
    Running,
    /// Resources held, nothing delivered
    Paused,
    /// Resources dropped; needs a fresh `start()`
    Released,
}

/// Resources held between `start()` and release.
struct Active {
    stream: Box<dyn AudioStream>,
    capture: CaptureFacility,
    tap: SampleTap,
}

/// Owns the audio stream and the capture facility, and delivers spectrum
/// frames to a callback registered once at construction.
pub struct SpectrumSource<P: StreamProvider> {
    provider: P,
    capture_size: usize,
    /// Parked here while no capture thread exists
    callback: Option<FrameCallback>,
    active: Option<Active>,
    state: SourceState,
}

impl<P: StreamProvider> SpectrumSource<P> {
    pub fn new(provider: P, capture_size: usize, on_frame: FrameCallback) -> Self {
        Self {
            provider,
            capture_size,
            callback: Some(on_frame),
            active: None,
            state: SourceState::NotStarted,
        }
    }

    pub fn state(&self) -> SourceState {
        self.state
    }

    pub fn capture_size(&self) -> usize {
        self.capture_size
    }

    /// Acquires the stream and capture facility and starts looped playback
    /// with capture enabled.
    ///
    /// Only valid from `NotStarted` or `Released`; otherwise a no-op.
    ///
    /// # Errors
    /// - If the stream cannot be acquired or started
    /// - If the capture thread cannot be spawned
    pub fn start(&mut self) -> Result<(), SourceError> {
        if matches!(self.state, SourceState::Running | SourceState::Paused) {
            tracing::warn!("Spectrum source already started ({:?}), ignoring start", self.state);
            return Ok(());
        }

        let callback = self
            .callback
            .take()
            .ok_or_else(|| SourceError::Capture("frame callback was lost".to_string()))?;

        // A few capture windows of history is plenty
        let tap = SampleTap::new(self.capture_size * 4);

        let stream = match self.provider.acquire(tap.clone()) {
            Ok(stream) => stream,
            Err(e) => {
                self.callback = Some(callback);
                return Err(e);
            }
        };

        let capture =
            match CaptureFacility::spawn(tap.clone(), self.capture_size, MAX_CAPTURE_RATE_HZ, callback) {
                Ok(capture) => capture,
                Err((e, callback)) => {
                    self.callback = Some(callback);
                    return Err(e);
                }
            };

        capture.set_enabled(true);
        if let Err(e) = stream.play() {
            self.callback = capture.release();
            return Err(e);
        }

        tracing::info!(
            "Spectrum source started: {}Hz stream, capture size {}",
            stream.sample_rate(),
            self.capture_size
        );
        self.active = Some(Active {
            stream,
            capture,
            tap,
        });
        self.state = SourceState::Running;
        Ok(())
    }

    /// Stops delivery and playback. No callback runs after this returns.
    ///
    /// With `release_resources`, the stream and capture facility are dropped
    /// as well and only a new `start()` brings them back.
    pub fn pause(&mut self, release_resources: bool) {
        if release_resources {
            self.release();
            return;
        }

        let Some(active) = &self.active else {
            tracing::debug!("Pause ignored: spectrum source is {:?}", self.state);
            return;
        };

        active.capture.set_enabled(false);
        if let Err(e) = active.stream.pause() {
            tracing::warn!("Failed to pause playback: {}", e);
        }
        if self.state == SourceState::Running {
            tracing::debug!("Spectrum source paused");
        }
        self.state = SourceState::Paused;
    }

    /// Restarts playback and delivery of a paused source.
    ///
    /// Returns false without doing anything unless the source is paused.
    pub fn resume(&mut self) -> bool {
        let Some(active) = &self.active else {
            tracing::debug!("Resume ignored: spectrum source is {:?}", self.state);
            return false;
        };
        if self.state != SourceState::Paused {
            return false;
        }

        // Stale samples from before the pause would otherwise show up once
        active.tap.clear();
        if let Err(e) = active.stream.play() {
            tracing::warn!("Failed to resume playback: {}", e);
        }
        active.capture.set_enabled(true);
        self.state = SourceState::Running;
        tracing::debug!("Spectrum source resumed");
        true
    }

    /// Drops the stream and joins the capture thread.
    pub fn release(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        active.capture.set_enabled(false);
        if let Err(e) = active.stream.pause() {
            tracing::debug!("Failed to pause playback before release: {}", e);
        }
        self.callback = active.capture.release();
        drop(active.stream);

        self.state = SourceState::Released;
        tracing::info!("Spectrum source released");
    }
}

impl<P: StreamProvider> Drop for SpectrumSource<P> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    /// A stream that plays nothing and records play/pause calls.
    pub(crate) struct FakeStream {
        playing: Arc<AtomicBool>,
    }

    impl AudioStream for FakeStream {
        fn play(&self) -> Result<(), SourceError> {
            self.playing.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn pause(&self) -> Result<(), SourceError> {
            self.playing.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn sample_rate(&self) -> u32 {
            8000
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeProvider {
        pub playing: Arc<AtomicBool>,
        pub acquisitions: Arc<AtomicUsize>,
        pub fail: bool,
    }

    impl StreamProvider for FakeProvider {
        fn acquire(&mut self, tap: SampleTap) -> Result<Box<dyn AudioStream>, SourceError> {
            if self.fail {
                return Err(SourceError::NoOutputDevice);
            }
            self.acquisitions.fetch_add(1, Ordering::SeqCst);
            tap.push_slice(&[0.5; 64]);
            Ok(Box::new(FakeStream {
                playing: Arc::clone(&self.playing),
            }))
        }
    }

    fn source_with_channel() -> (SpectrumSource<FakeProvider>, mpsc::Receiver<usize>) {
        let (tx, rx) = mpsc::channel();
        let source = SpectrumSource::new(
            FakeProvider::default(),
            128,
            Box::new(move |frame| {
                let _ = tx.send(frame.len());
            }),
        );
        (source, rx)
    }

    fn drain(rx: &mpsc::Receiver<usize>) {
        while rx.try_recv().is_ok() {}
    }

    #[test]
    fn test_start_delivers_frames() {
        let (mut source, rx) = source_with_channel();
        source.start().unwrap();
        assert_eq!(source.state(), SourceState::Running);
        assert!(source.provider.playing.load(Ordering::SeqCst));
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 128);
    }

    #[test]
    fn test_start_twice_is_guarded() {
        let (mut source, _rx) = source_with_channel();
        source.start().unwrap();
        source.start().unwrap();
        assert_eq!(source.provider.acquisitions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pause_quiesces_and_resume_restarts() {
        let (mut source, rx) = source_with_channel();
        source.start().unwrap();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();

        source.pause(false);
        source.pause(false);
        assert_eq!(source.state(), SourceState::Paused);
        assert!(!source.provider.playing.load(Ordering::SeqCst));

        drain(&rx);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        assert!(source.resume());
        assert_eq!(source.state(), SourceState::Running);
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn test_resume_without_start_is_noop() {
        let (mut source, _rx) = source_with_channel();
        assert!(!source.resume());
        assert_eq!(source.state(), SourceState::NotStarted);
    }

    #[test]
    fn test_release_then_restart() {
        let (mut source, rx) = source_with_channel();
        source.start().unwrap();
        source.pause(true);
        assert_eq!(source.state(), SourceState::Released);
        assert!(!source.resume());

        drain(&rx);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        source.start().unwrap();
        assert_eq!(source.provider.acquisitions.load(Ordering::SeqCst), 2);
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn test_acquisition_failure_is_recoverable() {
        let (tx, _rx) = mpsc::channel::<usize>();
        let mut source = SpectrumSource::new(
            FakeProvider {
                fail: true,
                ..Default::default()
            },
            128,
            Box::new(move |frame| {
                let _ = tx.send(frame.len());
            }),
        );

        assert!(matches!(source.start(), Err(SourceError::NoOutputDevice)));
        assert_eq!(source.state(), SourceState::NotStarted);

        source.provider.fail = false;
        source.start().unwrap();
        assert_eq!(source.state(), SourceState::Running);
    }
}
