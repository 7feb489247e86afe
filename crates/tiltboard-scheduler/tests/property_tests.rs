//! Property-based tests for the drift corrector and jitter statistics.

use quickcheck_macros::quickcheck;
use tiltboard_scheduler::{DriftCorrector, JitterStats};

#[quickcheck]
fn drift_period_stays_within_ten_percent(target: u64, intervals: Vec<u64>) {
    let target = target.clamp(1_000, 10_000_000_000);
    let mut drift = DriftCorrector::new(target);
    let min = (target as f64 * 0.9) as u64;
    let max = (target as f64 * 1.1) as u64;

    for interval in intervals {
        let next = drift.update(interval.min(10_000_000_000));
        let ns = u64::try_from(next.as_nanos()).unwrap_or(u64::MAX);
        assert!(ns >= min, "period {ns} below {min}");
        assert!(ns <= max, "period {ns} above {max}");
    }
}

#[quickcheck]
fn on_target_intervals_leave_period_alone(count: u8) {
    let mut drift = DriftCorrector::new(1_000_000);
    for _ in 0..count {
        let next = drift.update(1_000_000);
        assert_eq!(next.as_nanos(), 1_000_000);
    }
}

#[quickcheck]
fn percentiles_are_ordered(samples: Vec<u64>) {
    let mut stats = JitterStats::with_window(samples.len().clamp(1, 10_000));
    for &sample in &samples {
        stats.record(sample % 10_000_000, false);
    }
    let p50 = stats.percentile_ns(0.50);
    let p95 = stats.percentile_ns(0.95);
    let p99 = stats.percentile_ns(0.99);
    assert!(p50 <= p95, "p50 {p50} > p95 {p95}");
    assert!(p95 <= p99, "p95 {p95} > p99 {p99}");
}

#[quickcheck]
fn max_bounds_every_percentile(samples: Vec<u64>) {
    let mut stats = JitterStats::default();
    for &sample in &samples {
        stats.record(sample, false);
    }
    assert!(stats.percentile_ns(1.0) <= stats.max_ns());
    assert_eq!(stats.total(), samples.len() as u64);
}

#[quickcheck]
fn missed_rate_is_a_fraction(flags: Vec<bool>) {
    let mut stats = JitterStats::with_window(64);
    for &late in &flags {
        stats.record(1_000, late);
    }
    let rate = stats.missed_rate();
    assert!((0.0..=1.0).contains(&rate));
    let expected = flags.iter().filter(|&&late| late).count() as u64;
    assert_eq!(stats.missed(), expected);
}

mod summary {
    use proptest::prelude::*;
    use tiltboard_scheduler::JitterStats;

    proptest! {
        #[test]
        fn summary_is_consistent(samples in prop::collection::vec((0u64..5_000_000, any::<bool>()), 1..500)) {
            let mut stats = JitterStats::with_window(1_000);
            for &(ns, late) in &samples {
                stats.record(ns, late);
            }
            let summary = stats.summary();
            prop_assert_eq!(summary.total, samples.len() as u64);
            prop_assert!(summary.missed <= summary.total);
            prop_assert!(summary.p50_ns <= summary.p99_ns);
            prop_assert!(summary.p99_ns <= summary.max_ns);
            let max = samples.iter().map(|&(ns, _)| ns).max().unwrap_or(0);
            prop_assert_eq!(summary.max_ns, max);
        }
    }
}
