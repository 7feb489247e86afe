//! Display-cadence monitor.
//!
//! Stands in for the graphics loop: every refresh it reads the shared
//! state, traces the full snapshot and emits an `info` status line about
//! once per second and whenever the sphere reaches a destination.

use tiltboard_haptics::DisplaySnapshot;
use tracing::{info, trace};

/// Refresh bookkeeping of the monitor.
#[derive(Debug, Clone)]
pub struct DisplayMonitor {
    status_every: u64,
    refreshes: u64,
    last_destination: Option<usize>,
}

impl DisplayMonitor {
    /// Monitor refreshed at `display_hz`.
    pub fn new(display_hz: u32) -> Self {
        Self {
            status_every: u64::from(display_hz.max(1)),
            refreshes: 0,
            last_destination: None,
        }
    }

    /// Refreshes seen so far.
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Take one snapshot. Returns whether a status line was emitted.
    pub fn refresh(&mut self, snap: &DisplaySnapshot) -> bool {
        self.refreshes = self.refreshes.saturating_add(1);
        trace!(
            snapshot = %serde_json::to_string(snap).unwrap_or_default(),
            "display refresh"
        );

        let progressed = self
            .last_destination
            .is_some_and(|last| snap.destination_index > last);
        self.last_destination = Some(snap.destination_index);

        if !progressed && !self.refreshes.is_multiple_of(self.status_every) {
            return false;
        }
        info!(
            scene = %snap.scene.map(|s| s.to_string()).unwrap_or_default(),
            destination = snap.destination_index,
            destinations = snap.destination_total,
            alpha = snap.alpha,
            damping = snap.damping_gain,
            prediction = %snap.prediction,
            ball_x = snap.ball[0],
            ball_y = snap.ball[1],
            paused = snap.paused,
            cycles = snap.counters.cycles,
            "status"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiltboard_haptics::SharedState;

    #[test]
    fn status_once_per_second() {
        let shared = SharedState::new();
        let mut monitor = DisplayMonitor::new(10);
        let emitted = (0..30).filter(|_| monitor.refresh(&shared.snapshot())).count();
        assert_eq!(emitted, 3);
        assert_eq!(monitor.refreshes(), 30);
    }

    #[test]
    fn status_on_destination_progress() {
        let shared = SharedState::new();
        let mut monitor = DisplayMonitor::new(1000);
        let mut snap = shared.snapshot();
        assert!(!monitor.refresh(&snap));
        snap.destination_index = 1;
        assert!(monitor.refresh(&snap));
        assert!(!monitor.refresh(&snap));
    }
}
