//! Atomic counters updated from the haptic thread.
//!
//! Every `inc_*` call is a single relaxed fetch-add and returns the new
//! value, so the caller can decide to log the first occurrence and every
//! thousandth without a second load.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use serde::Serialize;
use tiltboard_errors::RTError;

/// Counter values at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CounterSnapshot {
    /// Cycles executed, paused ones included
    pub cycles: u64,
    /// Ticks that started after their deadline
    pub late_ticks: u64,
    /// Ticks whose jitter exceeded the threshold
    pub timing_violations: u64,
    /// Failed device samples
    pub device_read_errors: u64,
    /// Failed force commands
    pub device_write_errors: u64,
    /// Force commands checked for saturation
    pub saturation_samples: u64,
    /// Force commands clipped to the device limit
    pub saturation_count: u64,
    /// Telemetry rows dropped on a full queue
    pub telemetry_dropped: u64,
    /// Prediction polls that produced nothing
    pub prediction_misses: u64,
    /// Wall collisions reported by the scene
    pub collisions: u64,
    /// [`RTError::code`] of the latest real-time fault, zero if none
    pub last_rt_error_code: u8,
}

impl CounterSnapshot {
    /// Fraction of force commands that were clipped.
    pub fn saturation_ratio(&self) -> f64 {
        if self.saturation_samples == 0 {
            0.0
        } else {
            self.saturation_count as f64 / self.saturation_samples as f64
        }
    }

    /// Latest real-time fault.
    pub fn last_rt_error(&self) -> Option<RTError> {
        RTError::from_code(self.last_rt_error_code)
    }
}

/// Loop counters shared between the haptic thread and readers.
#[derive(Debug, Default)]
pub struct LoopCounters {
    cycles: AtomicU64,
    late_ticks: AtomicU64,
    timing_violations: AtomicU64,
    device_read_errors: AtomicU64,
    device_write_errors: AtomicU64,
    saturation_samples: AtomicU64,
    saturation_count: AtomicU64,
    telemetry_dropped: AtomicU64,
    prediction_misses: AtomicU64,
    collisions: AtomicU64,
    last_rt_error: AtomicU8,
}

#[inline]
fn bump(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
}

impl LoopCounters {
    /// All counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cycles: AtomicU64::new(0),
            late_ticks: AtomicU64::new(0),
            timing_violations: AtomicU64::new(0),
            device_read_errors: AtomicU64::new(0),
            device_write_errors: AtomicU64::new(0),
            saturation_samples: AtomicU64::new(0),
            saturation_count: AtomicU64::new(0),
            telemetry_dropped: AtomicU64::new(0),
            prediction_misses: AtomicU64::new(0),
            collisions: AtomicU64::new(0),
            last_rt_error: AtomicU8::new(0),
        }
    }

    /// Count one cycle.
    #[inline]
    pub fn inc_cycle(&self) -> u64 {
        bump(&self.cycles)
    }

    /// Count a late tick.
    #[inline]
    pub fn inc_late_tick(&self) -> u64 {
        bump(&self.late_ticks)
    }

    /// Count a timing violation.
    #[inline]
    pub fn inc_timing_violation(&self) -> u64 {
        bump(&self.timing_violations)
    }

    /// Count a failed device sample.
    #[inline]
    pub fn inc_device_read_error(&self) -> u64 {
        bump(&self.device_read_errors)
    }

    /// Count a failed force command.
    #[inline]
    pub fn inc_device_write_error(&self) -> u64 {
        bump(&self.device_write_errors)
    }

    /// Record whether a force command was clipped.
    #[inline]
    pub fn record_saturation(&self, saturated: bool) {
        bump(&self.saturation_samples);
        if saturated {
            bump(&self.saturation_count);
        }
    }

    /// Count a dropped telemetry row.
    #[inline]
    pub fn inc_telemetry_dropped(&self) -> u64 {
        bump(&self.telemetry_dropped)
    }

    /// Count an empty prediction poll.
    #[inline]
    pub fn inc_prediction_miss(&self) -> u64 {
        bump(&self.prediction_misses)
    }

    /// Count a wall collision.
    #[inline]
    pub fn inc_collision(&self) -> u64 {
        bump(&self.collisions)
    }

    /// Remember `err` as the latest real-time fault.
    #[inline]
    pub fn note_rt_error(&self, err: RTError) {
        self.last_rt_error.store(err.code(), Ordering::Relaxed);
    }

    /// Read every counter.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            late_ticks: self.late_ticks.load(Ordering::Relaxed),
            timing_violations: self.timing_violations.load(Ordering::Relaxed),
            device_read_errors: self.device_read_errors.load(Ordering::Relaxed),
            device_write_errors: self.device_write_errors.load(Ordering::Relaxed),
            saturation_samples: self.saturation_samples.load(Ordering::Relaxed),
            saturation_count: self.saturation_count.load(Ordering::Relaxed),
            telemetry_dropped: self.telemetry_dropped.load(Ordering::Relaxed),
            prediction_misses: self.prediction_misses.load(Ordering::Relaxed),
            collisions: self.collisions.load(Ordering::Relaxed),
            last_rt_error_code: self.last_rt_error.load(Ordering::Relaxed),
        }
    }
}

/// First occurrence and every thousandth after it.
#[inline]
pub(crate) fn should_log(count: u64) -> bool {
    count == 1 || count.is_multiple_of(1000)
}
