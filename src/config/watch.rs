//! Picks up edits to the config file made while the visualizer runs.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::file::{OrbitConfig, VisualConfig};
use super::settings::SettingChange;

/// Minimum time between two reads of the config file.
pub const WATCH_INTERVAL: Duration = Duration::from_millis(500);

pub struct SettingsWatcher {
    path: PathBuf,
    interval: Duration,
    known: VisualConfig,
    last_check: Option<Instant>,
}

impl SettingsWatcher {
    pub fn new(path: PathBuf, known: VisualConfig) -> Self {
        Self::with_interval(path, known, WATCH_INTERVAL)
    }

    pub fn with_interval(path: PathBuf, known: VisualConfig, interval: Duration) -> Self {
        Self {
            path,
            interval,
            known,
            last_check: None,
        }
    }

    /// Records a change made by this process so it is not reported back.
    pub fn record(&mut self, change: SettingChange) {
        change.apply_to(&mut self.known);
    }

    /// Re-reads the file if the interval has passed and returns what changed.
    ///
    /// An unreadable or invalid file is logged and reported as no change.
    pub fn poll(&mut self, now: Instant) -> Vec<SettingChange> {
        if let Some(last) = self.last_check {
            if now.saturating_duration_since(last) < self.interval {
                return Vec::new();
            }
        }
        self.last_check = Some(now);

        let config = match OrbitConfig::load_from(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config edit: {:#}", e);
                return Vec::new();
            }
        };

        let changes = SettingChange::diff(&self.known, &config.visual);
        if !changes.is_empty() {
            tracing::info!("Config file changed: {} setting(s) updated", changes.len());
        }
        self.known = config.visual;
        changes
    }
}
