//! Period drift correction.

use std::time::Duration;

/// Proportional-integral period corrector.
///
/// Feeds on the measured interval of each on-time tick and shortens or
/// lengthens the next period so the long-run average rate matches the
/// target. The corrected period never leaves ±10% of the target.
#[derive(Debug, Clone)]
pub struct DriftCorrector {
    target_ns: u64,
    period_ns: f64,
    kp: f64,
    ki: f64,
    accumulated_error_ns: f64,
    samples: u64,
}

impl DriftCorrector {
    /// Corrector with the default gains (kp = 0.01, ki = 0.001).
    pub fn new(target_ns: u64) -> Self {
        Self::with_gains(target_ns, 0.01, 0.001)
    }

    /// Corrector with explicit gains, each clamped to `[0, 1]`.
    pub fn with_gains(target_ns: u64, kp: f64, ki: f64) -> Self {
        let target_ns = target_ns.max(1);
        Self {
            target_ns,
            period_ns: target_ns as f64,
            kp: kp.clamp(0.0, 1.0),
            ki: ki.clamp(0.0, 1.0),
            accumulated_error_ns: 0.0,
            samples: 0,
        }
    }

    /// Fold in one measured interval and return the next period.
    pub fn update(&mut self, measured_ns: u64) -> Duration {
        let target = self.target_ns as f64;
        let error = measured_ns as f64 - target;
        self.accumulated_error_ns += error;
        self.samples = self.samples.saturating_add(1);

        let correction = self.kp * error + self.ki * self.accumulated_error_ns;
        self.period_ns = (target - correction).clamp(target * 0.9, target * 1.1);
        Duration::from_nanos(self.period_ns as u64)
    }

    /// Sum of interval errors since the last reset.
    #[inline]
    pub fn accumulated_error_ns(&self) -> f64 {
        self.accumulated_error_ns
    }

    /// Mean interval error since the last reset.
    pub fn mean_error_ns(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.accumulated_error_ns / self.samples as f64
        }
    }

    /// Period currently scheduled, in nanoseconds.
    #[inline]
    pub fn period_ns(&self) -> u64 {
        self.period_ns as u64
    }

    /// Target period in nanoseconds.
    #[inline]
    pub fn target_ns(&self) -> u64 {
        self.target_ns
    }

    /// Forget accumulated error.
    pub fn reset(&mut self) {
        self.period_ns = self.target_ns as f64;
        self.accumulated_error_ns = 0.0;
        self.samples = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_corrector_uses_target() {
        let drift = DriftCorrector::new(1_000_000);
        assert_eq!(drift.period_ns(), 1_000_000);
        assert_eq!(drift.target_ns(), 1_000_000);
    }

    #[test]
    fn test_slow_interval_shortens_period() {
        let mut drift = DriftCorrector::new(1_000_000);
        let next = drift.update(1_020_000);
        assert!(next < Duration::from_nanos(1_000_000));
    }

    #[test]
    fn test_fast_interval_lengthens_period() {
        let mut drift = DriftCorrector::new(1_000_000);
        let next = drift.update(980_000);
        assert!(next > Duration::from_nanos(1_000_000));
    }

    #[test]
    fn test_huge_error_is_clamped() {
        let mut drift = DriftCorrector::new(1_000_000);
        let next = drift.update(50_000_000);
        assert_eq!(next, Duration::from_nanos(900_000));
    }

    #[test]
    fn test_reset() {
        let mut drift = DriftCorrector::new(1_000_000);
        let _ = drift.update(1_100_000);
        drift.reset();
        assert_eq!(drift.period_ns(), 1_000_000);
        assert!(drift.accumulated_error_ns().abs() < f64::EPSILON);
        assert!(drift.mean_error_ns().abs() < f64::EPSILON);
    }
}
