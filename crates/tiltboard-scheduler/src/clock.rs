//! Absolute-deadline clock for the haptic loop.

use std::time::{Duration, Instant};

use tiltboard_errors::RTResult;

use crate::drift::DriftCorrector;
use crate::jitter::JitterStats;

#[cfg(target_os = "linux")]
use crate::linux::PlatformSleep;

#[cfg(not(target_os = "linux"))]
use crate::fallback::PlatformSleep;

/// One wake-up of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Tick number, starting at 1.
    pub index: u64,
    /// Wall-clock time since the previous wake-up.
    pub interval: Duration,
    /// Distance between the deadline and the moment `wait` was entered.
    pub jitter_ns: u64,
    /// The previous cycle overran its deadline.
    pub late: bool,
    /// Jitter exceeded [`crate::MAX_JITTER_NS`].
    pub timing_violation: bool,
}

/// Absolute-deadline 1 kHz clock.
///
/// Deadlines advance by the drift-corrected period from the previous
/// deadline, not from the wake-up time, so a slow cycle does not push every
/// later cycle back. A cycle that overruns its deadline returns immediately.
pub struct HapticClock {
    period_ns: u64,
    deadline: Instant,
    last_wake: Instant,
    ticks: u64,
    drift: DriftCorrector,
    jitter: JitterStats,
    max_jitter_ns: u64,
    sleeper: PlatformSleep,
}

impl HapticClock {
    /// Clock at the haptic rate.
    pub fn new_1khz() -> Self {
        Self::with_period(crate::HAPTIC_PERIOD_NS)
    }

    /// Clock with a custom period. A zero period is raised to 1 ns.
    pub fn with_period(period_ns: u64) -> Self {
        let period_ns = period_ns.max(1);
        let now = Instant::now();
        Self {
            period_ns,
            deadline: now + Duration::from_nanos(period_ns),
            last_wake: now,
            ticks: 0,
            drift: DriftCorrector::new(period_ns),
            jitter: JitterStats::default(),
            max_jitter_ns: crate::MAX_JITTER_NS,
            sleeper: PlatformSleep,
        }
    }

    /// Override the violation threshold (tests run on loaded CI machines).
    pub fn with_max_jitter_ns(mut self, max_jitter_ns: u64) -> Self {
        self.max_jitter_ns = max_jitter_ns;
        self
    }

    /// Sleep until the next deadline and report how the cycle went.
    ///
    /// # Errors
    ///
    /// Returns [`tiltboard_errors::RTError::TimingViolation`] only if the
    /// platform sleep call itself fails. Late wake-ups are reported through
    /// [`Tick::timing_violation`] and do not fail.
    pub fn wait(&mut self) -> RTResult<Tick> {
        let entered = Instant::now();
        let late = entered >= self.deadline;
        let jitter_ns = if late {
            duration_ns(entered.saturating_duration_since(self.deadline))
        } else {
            duration_ns(self.deadline.saturating_duration_since(entered))
        };
        self.jitter.record(jitter_ns, late);

        if !late {
            self.sleeper.sleep_until(self.deadline)?;
        }

        let woke = Instant::now();
        let interval = woke.saturating_duration_since(self.last_wake);
        self.last_wake = woke;

        // An overrun interval says nothing about clock drift.
        let corrected = if late {
            Duration::from_nanos(self.period_ns)
        } else {
            self.drift.update(duration_ns(interval))
        };
        self.deadline += corrected;
        if self.deadline <= woke {
            // Re-anchor so one long stall does not cause a burst of
            // back-to-back catch-up ticks.
            self.deadline = woke + corrected;
        }
        self.ticks = self.ticks.saturating_add(1);

        Ok(Tick {
            index: self.ticks,
            interval,
            jitter_ns,
            late,
            timing_violation: jitter_ns > self.max_jitter_ns,
        })
    }

    /// Restart deadlines from now. Call right before entering the loop.
    pub fn restart(&mut self) {
        let now = Instant::now();
        self.deadline = now + Duration::from_nanos(self.period_ns);
        self.last_wake = now;
        self.ticks = 0;
        self.drift.reset();
        self.jitter.reset();
    }

    /// Number of ticks since construction or the last restart.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Nominal period in nanoseconds.
    #[inline]
    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }

    /// Wake-up error statistics.
    #[inline]
    pub fn jitter(&self) -> &JitterStats {
        &self.jitter
    }

    /// Mutable access for percentile queries.
    #[inline]
    pub fn jitter_mut(&mut self) -> &mut JitterStats {
        &mut self.jitter
    }

    /// Accumulated drift error in nanoseconds.
    #[inline]
    pub fn drift_error_ns(&self) -> f64 {
        self.drift.accumulated_error_ns()
    }
}

impl Default for HapticClock {
    fn default() -> Self {
        Self::new_1khz()
    }
}

fn duration_ns(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
