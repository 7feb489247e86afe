//! Per-cycle trajectory records and the sink they are handed to.
//!
//! The haptic thread never blocks on a sink: [`TelemetrySink::record`]
//! returns `false` when a row had to be dropped, and the loop counts it.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tiltboard_errors::TelemetryError;

use crate::Vec3;
use crate::scene::WallId;

/// Milliseconds since the Unix epoch.
#[inline]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// One cycle of trajectory data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    /// Wall-clock time of the cycle (ms since epoch).
    pub timestamp_ms: i64,
    /// Sphere position.
    pub ball: Vec3,
    /// Scaled stylus position.
    pub human_input: Vec3,
    /// Guidance target.
    pub guidance: Vec3,
    /// Alpha-blended target.
    pub negotiated: Vec3,
    /// Operator share of the attraction.
    pub human_force: Vec3,
    /// Guidance share of the attraction.
    pub guidance_force: Vec3,
}

/// What the loop hands to a sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryEvent {
    /// Regular per-cycle row.
    Sample(TelemetryRecord),
    /// The sphere hit a wall.
    Collision {
        /// Wall-clock time (ms since epoch).
        timestamp_ms: i64,
        /// Wall that was hit.
        wall: WallId,
    },
}

/// Destination of telemetry events.
pub trait TelemetrySink: Send {
    /// Hand over one event without blocking. Returns `false` if it was
    /// dropped.
    fn record(&mut self, event: TelemetryEvent) -> bool;

    /// Flush and release the sink. Called once when the loop exits.
    fn close(&mut self) -> Result<(), TelemetryError>;
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&mut self, _event: TelemetryEvent) -> bool {
        true
    }

    fn close(&mut self) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Sink that keeps events in memory, for tests and short offline runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    closed: Arc<Mutex<bool>>,
    capacity: Option<usize>,
}

impl MemorySink {
    /// Unbounded sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that drops events once `capacity` are held.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Copy of the recorded events.
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }

    /// `close` has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }
}

impl TelemetrySink for MemorySink {
    fn record(&mut self, event: TelemetryEvent) -> bool {
        let mut events = self.events.lock();
        if self.capacity.is_some_and(|cap| events.len() >= cap) {
            return false;
        }
        events.push(event);
        true
    }

    fn close(&mut self) -> Result<(), TelemetryError> {
        *self.closed.lock() = true;
        Ok(())
    }
}
