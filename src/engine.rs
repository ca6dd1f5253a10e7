//! The visualizer core: one spectrum source feeding one surface through the
//! spectrum slot, driven by lifecycle signals from the shell.

use std::time::Instant;

use crate::analysis::BandIntensities;
use crate::audio::{is_valid_capture_size, spectrum_slot, SourceState, SpectrumSource, StreamProvider};
use crate::audio::capture::MIN_CAPTURE_SIZE;
use crate::config::SettingChange;
use crate::visual::{RenderedFrame, VisualizationState, VisualizationSurface};

/// What the footer reports about the audio side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisualizerStatus {
    /// Capture not granted yet
    NotStarted,
    Running,
    Paused,
    /// Acquisition failed; the reason is shown to the user
    Unavailable(String),
    Released,
}

impl std::fmt::Display for VisualizerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "capture not permitted"),
            Self::Running => write!(f, "playing"),
            Self::Paused => write!(f, "paused"),
            Self::Unavailable(reason) => write!(f, "audio unavailable: {reason}"),
            Self::Released => write!(f, "stopped"),
        }
    }
}

pub struct Visualizer<P: StreamProvider> {
    source: SpectrumSource<P>,
    surface: VisualizationSurface,
    unavailable: Option<String>,
}

impl<P: StreamProvider> Visualizer<P> {
    pub fn new(state: VisualizationState, provider: P, capture_size: usize) -> Self {
        let capture_size = if is_valid_capture_size(capture_size) {
            capture_size
        } else {
            tracing::warn!(
                "Capture size {} unsupported, falling back to {}",
                capture_size,
                MIN_CAPTURE_SIZE
            );
            MIN_CAPTURE_SIZE
        };

        let (mut publisher, reader) = spectrum_slot();
        let source = SpectrumSource::new(
            provider,
            capture_size,
            Box::new(move |frame: &[i8]| publisher.publish_frame(frame)),
        );

        Self {
            source,
            surface: VisualizationSurface::new(state, reader),
            unavailable: None,
        }
    }

    /// Starts the source once capture has been permitted.
    ///
    /// A failure leaves the surface drawing its background only; calling
    /// this again retries.
    pub fn grant_capture(&mut self) -> VisualizerStatus {
        match self.source.start() {
            Ok(()) => {
                self.unavailable = None;
                self.surface.set_unavailable(false);
            }
            Err(e) => {
                tracing::error!("Audio unavailable: {}", e);
                self.unavailable = Some(e.to_string());
                self.surface.set_unavailable(true);
            }
        }
        self.status()
    }

    /// Resumes delivery and restarts the animation with empty trails.
    /// Returns whether a paused source was resumed.
    pub fn on_become_visible(&mut self, now: Instant) -> bool {
        let resumed = self.source.resume();
        if !resumed {
            tracing::debug!("Visible without a paused source (status: {})", self.status());
        }
        self.surface.restart(now);
        resumed
    }

    /// Pauses delivery; a final hide releases the audio resources too.
    pub fn on_become_hidden(&mut self, final_hide: bool) {
        self.source.pause(final_hide);
    }

    pub fn on_layout_known(&mut self, width: f32, height: f32, now: Instant) {
        self.surface.on_layout_known(width, height, now);
    }

    pub fn apply(&mut self, change: SettingChange) {
        tracing::debug!("Applying setting change {:?}", change);
        self.surface.apply(change);
    }

    pub fn tick(&mut self, now: Instant) -> Option<RenderedFrame> {
        self.surface.tick(now)
    }

    pub fn state(&self) -> &VisualizationState {
        self.surface.state()
    }

    pub fn status(&self) -> VisualizerStatus {
        if let Some(reason) = &self.unavailable {
            return VisualizerStatus::Unavailable(reason.clone());
        }
        match self.source.state() {
            SourceState::NotStarted => VisualizerStatus::NotStarted,
            SourceState::Running => VisualizerStatus::Running,
            SourceState::Paused => VisualizerStatus::Paused,
            SourceState::Released => VisualizerStatus::Released,
        }
    }

    /// Intensities read by the last tick.
    pub fn bands(&self) -> BandIntensities {
        self.surface
            .latest()
            .map(|snapshot| snapshot.bands)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Band;
    use crate::audio::source::tests::FakeProvider;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn visualizer(provider: FakeProvider) -> Visualizer<FakeProvider> {
        Visualizer::new(VisualizationState::default(), provider, 128)
    }

    /// Ticks until a snapshot newer than `after` shows up.
    fn wait_for_sequence(vis: &mut Visualizer<FakeProvider>, after: u64) -> Option<u64> {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(2) {
            vis.tick(Instant::now());
            if let Some(snapshot) = vis.surface.latest() {
                if snapshot.sequence > after {
                    return Some(snapshot.sequence);
                }
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        None
    }

    #[test]
    fn test_nothing_acquired_without_permission() {
        let provider = FakeProvider::default();
        let acquisitions = provider.acquisitions.clone();
        let mut vis = visualizer(provider);
        vis.on_layout_known(800.0, 600.0, Instant::now());

        assert_eq!(vis.status(), VisualizerStatus::NotStarted);
        assert_eq!(vis.tick(Instant::now()), None);

        assert!(!vis.on_become_visible(Instant::now()));
        vis.on_become_hidden(false);
        assert_eq!(acquisitions.load(Ordering::SeqCst), 0);
        assert_eq!(vis.status(), VisualizerStatus::NotStarted);
    }

    #[test]
    fn test_granted_capture_feeds_the_surface() {
        let mut vis = visualizer(FakeProvider::default());
        vis.on_layout_known(800.0, 600.0, Instant::now());
        assert_eq!(vis.grant_capture(), VisualizerStatus::Running);

        assert!(wait_for_sequence(&mut vis, 0).is_some());
        let frame = vis.tick(Instant::now()).unwrap();
        assert_eq!(frame.shapes.len(), 3);
        // Constant input has all of its energy in the DC bin
        assert!(vis.bands().bass > 0.0);
    }

    #[test]
    fn test_pause_twice_then_resume() {
        let provider = FakeProvider::default();
        let playing = provider.playing.clone();
        let mut vis = visualizer(provider);
        vis.on_layout_known(800.0, 600.0, Instant::now());
        vis.grant_capture();

        let first = wait_for_sequence(&mut vis, 0).unwrap();
        for _ in 0..3 {
            vis.tick(Instant::now());
        }
        assert!(!vis.surface.shape(Band::Bass).trail().is_empty());

        vis.on_become_hidden(false);
        vis.on_become_hidden(false);
        assert_eq!(vis.status(), VisualizerStatus::Paused);
        assert!(!playing.load(Ordering::SeqCst));

        vis.tick(Instant::now());
        let paused_at = vis.surface.latest().unwrap().sequence;
        assert!(paused_at >= first);
        std::thread::sleep(Duration::from_millis(200));
        vis.tick(Instant::now());
        assert_eq!(vis.surface.latest().unwrap().sequence, paused_at);

        assert!(vis.on_become_visible(Instant::now()));
        assert_eq!(vis.status(), VisualizerStatus::Running);
        assert!(playing.load(Ordering::SeqCst));
        for band in Band::ALL {
            assert!(vis.surface.shape(band).trail().is_empty());
        }
        assert!(wait_for_sequence(&mut vis, paused_at).is_some());
    }

    #[test]
    fn test_final_hide_releases() {
        let mut vis = visualizer(FakeProvider::default());
        vis.grant_capture();
        vis.on_become_hidden(true);
        assert_eq!(vis.status(), VisualizerStatus::Released);

        // Becoming visible does not bring a released source back
        assert!(!vis.on_become_visible(Instant::now()));
        assert_eq!(vis.status(), VisualizerStatus::Released);
    }

    #[test]
    fn test_visible_while_running_restarts_only_the_animation() {
        let mut vis = visualizer(FakeProvider::default());
        vis.on_layout_known(800.0, 600.0, Instant::now());
        vis.grant_capture();
        assert!(wait_for_sequence(&mut vis, 0).is_some());
        vis.tick(Instant::now());
        assert!(!vis.surface.shape(Band::Mid).trail().is_empty());

        assert!(!vis.on_become_visible(Instant::now()));
        assert_eq!(vis.status(), VisualizerStatus::Running);
        assert!(vis.surface.shape(Band::Mid).trail().is_empty());
    }

    #[test]
    fn test_acquisition_failure_is_unavailable() {
        let mut vis = visualizer(FakeProvider {
            fail: true,
            ..Default::default()
        });
        vis.on_layout_known(800.0, 600.0, Instant::now());

        let status = vis.grant_capture();
        assert!(matches!(status, VisualizerStatus::Unavailable(_)));

        let frame = vis.tick(Instant::now()).unwrap();
        assert!(frame.shapes.is_empty());
        assert_eq!(vis.bands(), BandIntensities::default());
    }

    #[test]
    fn test_invalid_capture_size_falls_back() {
        let mut vis = Visualizer::new(VisualizationState::default(), FakeProvider::default(), 100);
        vis.grant_capture();
        assert_eq!(vis.source.capture_size(), MIN_CAPTURE_SIZE);
    }
}
