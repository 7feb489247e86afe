//! Operator stillness detection.

use std::time::Duration;

use crate::Vec3;

/// Speed below which the stylus counts as still (m/s).
pub const INACTIVITY_SPEED: f64 = 0.01;

/// Stillness needed before the operator counts as inactive.
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(2);

/// Flags the operator inactive after a continuous still period.
#[derive(Debug, Clone)]
pub struct InactivityDetector {
    speed_threshold: f64,
    timeout: f64,
    still_for: f64,
}

impl InactivityDetector {
    /// Detector with the default threshold and timeout.
    pub fn new() -> Self {
        Self::with_threshold(INACTIVITY_SPEED, INACTIVITY_TIMEOUT)
    }

    /// Detector with a custom threshold and timeout.
    pub fn with_threshold(speed_threshold: f64, timeout: Duration) -> Self {
        Self {
            speed_threshold,
            timeout: timeout.as_secs_f64(),
            still_for: 0.0,
        }
    }

    /// Feed one cycle of stylus velocity. Returns whether the operator is
    /// inactive after this cycle.
    pub fn update(&mut self, velocity: Vec3, dt: f64) -> bool {
        let speed = velocity.norm();
        if speed.is_finite() && speed < self.speed_threshold {
            if dt.is_finite() && dt > 0.0 {
                self.still_for += dt;
            }
        } else {
            self.still_for = 0.0;
        }
        self.is_inactive()
    }

    /// Current verdict.
    #[inline]
    pub fn is_inactive(&self) -> bool {
        self.still_for >= self.timeout
    }

    /// Time spent still so far.
    pub fn still_for(&self) -> Duration {
        Duration::from_secs_f64(self.still_for)
    }

    /// Forget the accumulated still time.
    pub fn reset(&mut self) {
        self.still_for = 0.0;
    }
}

impl Default for InactivityDetector {
    fn default() -> Self {
        Self::new()
    }
}
