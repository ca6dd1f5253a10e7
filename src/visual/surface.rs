//! The visualization surface: owns the three shapes and turns the latest
//! band intensities plus the rotation phase into one frame per tick.

use std::time::Instant;

use super::clock::AnimationClock;
use super::shape::{FrameContext, Point, ShapeConfig, ShapeFrame, TrailedShape};
use super::theme::{ColorTheme, Palette, Rgb};
use crate::analysis::{Band, BandIntensities};
use crate::audio::{SpectrumReader, SpectrumSnapshot};
use crate::config::SettingChange;

/// Shape size at rest, before the user's size scale is applied.
pub const MIN_SIZE_DEFAULT: f32 = 50.0;

/// Largest accepted size scale.
pub const MAX_SIZE_SCALE: f32 = 3.0;

/// Scale used when a non-positive value slips past the settings boundary.
const FALLBACK_MIN_SIZE_SCALE: f32 = 0.1;

/// Forces a size scale into (0, 3].
pub fn clamp_size_scale(scale: f32) -> f32 {
    if !scale.is_finite() {
        1.0
    } else if scale <= 0.0 {
        FALLBACK_MIN_SIZE_SCALE
    } else {
        scale.min(MAX_SIZE_SCALE)
    }
}

/// User-controlled appearance of the visualization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualizationState {
    pub size_scale: f32,
    pub show_bass: bool,
    pub show_mid: bool,
    pub show_treble: bool,
    pub theme: ColorTheme,
}

impl Default for VisualizationState {
    fn default() -> Self {
        Self {
            size_scale: 1.0,
            show_bass: true,
            show_mid: true,
            show_treble: true,
            theme: ColorTheme::default(),
        }
    }
}

impl VisualizationState {
    pub fn min_size(&self) -> f32 {
        MIN_SIZE_DEFAULT * self.size_scale
    }

    pub fn is_visible(&self, band: Band) -> bool {
        match band {
            Band::Bass => self.show_bass,
            Band::Mid => self.show_mid,
            Band::Treble => self.show_treble,
        }
    }

    pub fn palette(&self) -> Palette {
        self.theme.palette()
    }

    pub fn apply(&mut self, change: SettingChange) {
        match change {
            SettingChange::ShowBass(show) => self.show_bass = show,
            SettingChange::ShowMid(show) => self.show_mid = show,
            SettingChange::ShowTreble(show) => self.show_treble = show,
            SettingChange::ColorTheme(theme) => self.theme = theme,
            SettingChange::SizeScale(scale) => {
                let clamped = clamp_size_scale(scale);
                if clamped != scale {
                    tracing::warn!("Size scale {} out of range, using {}", scale, clamped);
                }
                self.size_scale = clamped;
            }
        }
    }
}

/// Layout-derived constants, recomputed on every layout event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub center: Point,
    /// The shorter of the two half-dimensions
    pub short_side: f32,
}

impl Layout {
    pub fn new(width: f32, height: f32) -> Self {
        let center = Point::new(width / 2.0, height / 2.0);
        Self {
            center,
            short_side: center.x.min(center.y),
        }
    }
}

/// Everything drawn for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub background: Rgb,
    /// Visible shapes, bass first
    pub shapes: Vec<ShapeFrame>,
    pub bands: BandIntensities,
}

pub struct VisualizationSurface {
    shapes: [(Band, TrailedShape); 3],
    state: VisualizationState,
    clock: AnimationClock,
    layout: Option<Layout>,
    reader: SpectrumReader,
    latest: Option<SpectrumSnapshot>,
    unavailable: bool,
}

impl VisualizationSurface {
    pub fn new(state: VisualizationState, reader: SpectrumReader) -> Self {
        let palette = state.palette();
        let make = |config| TrailedShape::new(config, palette.shape, palette.trail);

        Self {
            shapes: [
                (Band::Bass, make(ShapeConfig::BASS)),
                (Band::Mid, make(ShapeConfig::MID)),
                (Band::Treble, make(ShapeConfig::TREBLE)),
            ],
            state: VisualizationState {
                size_scale: clamp_size_scale(state.size_scale),
                ..state
            },
            clock: AnimationClock::new(),
            layout: None,
            reader,
            latest: None,
            unavailable: false,
        }
    }

    pub fn state(&self) -> &VisualizationState {
        &self.state
    }

    pub fn shape(&self, band: Band) -> &TrailedShape {
        let (_, shape) = self
            .shapes
            .iter()
            .find(|(b, _)| *b == band)
            .unwrap_or(&self.shapes[0]);
        shape
    }

    /// Last snapshot read by a tick.
    pub fn latest(&self) -> Option<SpectrumSnapshot> {
        self.latest
    }

    /// Marks the audio side as unusable: ticks then draw only the background.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Recomputes center and orbit radii. The clock starts on the first
    /// layout only.
    pub fn on_layout_known(&mut self, width: f32, height: f32, now: Instant) {
        if width <= 0.0 || height <= 0.0 {
            tracing::debug!("Ignoring empty layout {}x{}", width, height);
            return;
        }

        let layout = Layout::new(width, height);
        for (_, shape) in &mut self.shapes {
            shape.set_orbit(layout.short_side);
        }
        if self.layout.is_none() {
            self.clock.restart(now);
        }
        self.layout = Some(layout);
        tracing::debug!("Layout {}x{}, short side {}", width, height, layout.short_side);
    }

    /// Clears every trail and restarts the rotation from zero.
    pub fn restart(&mut self, now: Instant) {
        for (_, shape) in &mut self.shapes {
            shape.restart_trail();
        }
        if self.layout.is_some() {
            self.clock.restart(now);
        }
    }

    /// Applies a settings change immediately.
    pub fn apply(&mut self, change: SettingChange) {
        self.state.apply(change);
        if let SettingChange::ColorTheme(_) = change {
            let palette = self.state.palette();
            for (_, shape) in &mut self.shapes {
                shape.set_colors(palette.shape, palette.trail);
            }
        }
    }

    /// Produces the frame for `now`.
    ///
    /// Returns `None` until a layout is known and a spectrum snapshot has
    /// been received; shapes are not advanced in that case.
    pub fn tick(&mut self, now: Instant) -> Option<RenderedFrame> {
        let background = self.state.palette().background;
        if self.unavailable {
            return Some(RenderedFrame {
                background,
                shapes: Vec::new(),
                bands: BandIntensities::default(),
            });
        }

        self.latest = self.reader.latest();
        let snapshot = self.latest?;
        let layout = self.layout?;
        let angle = self.clock.angle_at(now)?;

        let ctx = FrameContext {
            center: layout.center,
            min_size: self.state.min_size(),
        };

        let state = self.state;
        let shapes = self
            .shapes
            .iter_mut()
            .filter(|(band, _)| state.is_visible(*band))
            .map(|(band, shape)| shape.update(&ctx, angle, snapshot.bands.get(*band)))
            .collect();

        Some(RenderedFrame {
            background,
            shapes,
            bands: snapshot.bands,
        })
    }
}
