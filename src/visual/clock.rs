//! Rotation phase shared by every shape.

use std::f64::consts::TAU;
use std::time::Instant;

/// How fast the shapes orbit the center.
pub const REVOLUTIONS_PER_SECOND: f64 = 0.3;

/// Converts elapsed time into an orbit angle in radians.
pub fn phase(elapsed_millis: u64, revolutions_per_second: f64) -> f64 {
    let revolutions = elapsed_millis as f64 * revolutions_per_second / 1000.0;
    revolutions * TAU
}

/// Elapsed-time origin for the rotation phase.
///
/// The origin is unset until the surface first gets a layout; from then on
/// the angle only grows until the next explicit restart.
#[derive(Debug, Default)]
pub struct AnimationClock {
    origin: Option<Instant>,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the elapsed-time origin to `now`.
    pub fn restart(&mut self, now: Instant) {
        self.origin = Some(now);
    }

    /// Current angle, or `None` before the first restart.
    pub fn angle_at(&self, now: Instant) -> Option<f64> {
        let origin = self.origin?;
        let elapsed = now.saturating_duration_since(origin);
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        Some(phase(millis, REVOLUTIONS_PER_SECOND))
    }
}
