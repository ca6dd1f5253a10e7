//! The visualizer: plays the configured track and animates its spectrum.
//!
//! Runs the render loop at the configured frame rate, forwards terminal focus,
//! resize and key events to the visualizer core, and applies settings changes
//! from the keyboard and from edits to the config file. Supports toggling pause
//! externally via SIGUSR1.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;

use crate::analysis::Band;
use crate::audio::{CpalTrackProvider, StreamProvider};
use crate::config::{self, OrbitConfig, SettingChange, SettingsWatcher};
use crate::engine::Visualizer;
use crate::ui::{ErrorScreen, Footer, UiCommand, VisualizerTui};
use crate::visual::{RenderedFrame, VisualizationState, MAX_SIZE_SCALE};

const SCALE_STEP: f32 = 0.1;
const MIN_STEPPED_SCALE: f32 = 0.1;

/// Command-line overrides for a visualizer run.
#[derive(Debug, Clone, Default)]
pub struct VisualizeOptions {
    /// WAV file to loop instead of the configured track
    pub track: Option<PathBuf>,
    /// Output device instead of the configured one
    pub device: Option<String>,
    /// Run without opening any audio stream
    pub no_capture: bool,
}

/// Adds `delta` to a size scale, keeping it on the 0.1 grid within (0, 3].
fn step_scale(current: f32, delta: f32) -> f32 {
    let stepped = ((current + delta) * 10.0).round() / 10.0;
    stepped.clamp(MIN_STEPPED_SCALE, MAX_SIZE_SCALE)
}

/// The settings change a key command asks for, if any.
fn change_for(command: UiCommand, state: &VisualizationState) -> Option<SettingChange> {
    match command {
        UiCommand::ToggleBand(band) => {
            let show = !state.is_visible(band);
            Some(match band {
                Band::Bass => SettingChange::ShowBass(show),
                Band::Mid => SettingChange::ShowMid(show),
                Band::Treble => SettingChange::ShowTreble(show),
            })
        }
        UiCommand::CycleTheme => Some(SettingChange::ColorTheme(state.theme.next())),
        UiCommand::ScaleUp => Some(SettingChange::SizeScale(step_scale(state.size_scale, SCALE_STEP))),
        UiCommand::ScaleDown => Some(SettingChange::SizeScale(step_scale(state.size_scale, -SCALE_STEP))),
        _ => None,
    }
}

/// Whether the surface is on screen: not paused by the user and focused.
#[derive(Debug, Clone, Copy)]
struct Visibility {
    paused: bool,
    focused: bool,
}

impl Visibility {
    fn is_visible(&self) -> bool {
        !self.paused && self.focused
    }
}

/// Applies a visibility transition to the core if it changed anything.
fn transition<P: StreamProvider>(vis: &mut Visualizer<P>, before: Visibility, after: Visibility) {
    match (before.is_visible(), after.is_visible()) {
        (true, false) => vis.on_become_hidden(false),
        (false, true) => {
            vis.on_become_visible(Instant::now());
        }
        _ => {}
    }
}

/// Runs the visualizer until the user quits.
pub async fn handle_visualize(options: VisualizeOptions) -> Result<(), anyhow::Error> {
    tracing::info!("=== orbitscope Visualizer Started ===");

    let config_path = config::config_path()?;
    let file_config = match OrbitConfig::load_from(&config_path) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err:#}");
            let error_message = format!(
                "Configuration Error:\n\n{err:#}\n\nPlease check your ~/.config/orbitscope/orbitscope.toml file and try again."
            );
            let mut error_screen = ErrorScreen::new()?;
            error_screen.show_error(&error_message)?;
            error_screen.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    // CLI overrides apply to this run only and are never written back
    let mut audio = file_config.audio.clone();
    if let Some(track) = &options.track {
        audio.track = track.display().to_string();
    }
    if let Some(device) = &options.device {
        audio.device = device.clone();
    }

    tracing::info!(
        "Configuration loaded: device={}, track={:?}, capture_size={}, frame_rate={}",
        audio.device,
        audio.track_source(),
        audio.capture_size,
        file_config.visual.frame_rate
    );

    let provider = CpalTrackProvider::new(audio.device.clone(), audio.track_source());
    let mut vis = Visualizer::new(file_config.visual.state(), provider, audio.capture_size);

    let mut tui = VisualizerTui::new()?;
    let (width, height) = tui.layout_size()?;
    vis.on_layout_known(width, height, Instant::now());

    if audio.capture_enabled && !options.no_capture {
        let status = vis.grant_capture();
        tracing::info!("Capture granted: {}", status);
    } else {
        tracing::info!("Capture not permitted, visualizer stays idle");
    }

    let toggle_requested = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&toggle_requested))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut watcher = SettingsWatcher::new(config_path.clone(), file_config.visual.clone());

    let frame_rate = file_config.visual.frame_rate.clamp(1, config::MAX_FRAME_RATE);
    let mut ticker = tokio::time::interval(Duration::from_secs(1) / frame_rate);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut visibility = Visibility {
        paused: false,
        focused: true,
    };
    let mut last_frame: Option<RenderedFrame> = None;
    let mut frame_count = 0u64;

    tracing::debug!("Entering render loop at {} fps", frame_rate);

    'render: loop {
        ticker.tick().await;

        let mut commands = tui.handle_input()?;
        if toggle_requested.swap(false, Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: toggling pause via external trigger");
            commands.push(UiCommand::TogglePause);
        }

        for command in commands {
            let before = visibility;
            match command {
                UiCommand::Quit => break 'render,
                UiCommand::TogglePause => visibility.paused = !visibility.paused,
                UiCommand::FocusLost => visibility.focused = false,
                UiCommand::FocusGained => visibility.focused = true,
                UiCommand::Resized => {
                    let (width, height) = tui.layout_size()?;
                    vis.on_layout_known(width, height, Instant::now());
                }
                other => {
                    if let Some(change) = change_for(other, vis.state()) {
                        vis.apply(change);
                        watcher.record(change);
                        if let Err(e) = change.persist(&config_path) {
                            tracing::warn!("Failed to persist {}: {:#}", change, e);
                        }
                    }
                }
            }
            transition(&mut vis, before, visibility);
        }

        for change in watcher.poll(Instant::now()) {
            vis.apply(change);
        }

        if visibility.is_visible() {
            last_frame = vis.tick(Instant::now());
        }

        frame_count += 1;
        if frame_count.is_multiple_of(u64::from(frame_rate) * 10) {
            let bands = vis.bands();
            tracing::debug!(
                "Frame {}: bass={:.1} mid={:.1} treble={:.1}",
                frame_count,
                bands.bass,
                bands.mid,
                bands.treble
            );
        }

        let state = *vis.state();
        let footer = Footer {
            status: vis.status(),
            bands: vis.bands(),
            theme: state.theme,
            size_scale: state.size_scale,
        };
        tui.render(last_frame.as_ref(), &footer)?;
    }

    vis.on_become_hidden(true);
    tui.cleanup()?;

    tracing::info!("=== orbitscope Visualizer Exited Successfully ===");
    Ok(())
}
