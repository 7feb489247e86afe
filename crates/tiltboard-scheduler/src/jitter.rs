//! Wake-up jitter statistics.

/// Samples kept for percentile estimates (ten seconds at 1 kHz).
const DEFAULT_WINDOW: usize = 10_000;

/// Snapshot of the jitter statistics, cheap to copy into a log line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JitterSummary {
    /// Ticks observed.
    pub total: u64,
    /// Ticks that started after their deadline.
    pub missed: u64,
    /// Mean jitter in nanoseconds.
    pub mean_ns: f64,
    /// Median jitter in nanoseconds.
    pub p50_ns: u64,
    /// 99th percentile jitter in nanoseconds.
    pub p99_ns: u64,
    /// Worst jitter seen in nanoseconds.
    pub max_ns: u64,
}

/// Jitter statistics over a bounded window.
///
/// Recording is O(1) and never allocates: the window and the percentile
/// scratch buffer are sized on construction.
#[derive(Debug, Clone)]
pub struct JitterStats {
    total: u64,
    missed: u64,
    max_ns: u64,
    sum_ns: u128,
    window: Vec<u64>,
    capacity: usize,
    cursor: usize,
    scratch: Vec<u64>,
}

impl Default for JitterStats {
    fn default() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }
}

impl JitterStats {
    /// Statistics keeping the last `capacity` samples for percentiles.
    pub fn with_window(capacity: usize) -> Self {
        Self {
            total: 0,
            missed: 0,
            max_ns: 0,
            sum_ns: 0,
            window: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
            scratch: Vec::with_capacity(capacity),
        }
    }

    /// Record one tick.
    pub fn record(&mut self, jitter_ns: u64, missed: bool) {
        self.total = self.total.saturating_add(1);
        if missed {
            self.missed = self.missed.saturating_add(1);
        }
        self.max_ns = self.max_ns.max(jitter_ns);
        self.sum_ns = self.sum_ns.saturating_add(u128::from(jitter_ns));

        if self.capacity == 0 {
            return;
        }
        if self.window.len() < self.capacity {
            self.window.push(jitter_ns);
        } else if let Some(slot) = self.window.get_mut(self.cursor) {
            *slot = jitter_ns;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    /// Percentile over the window, `q` in `[0, 1]`. Zero when empty.
    pub fn percentile_ns(&mut self, q: f64) -> u64 {
        if self.window.is_empty() {
            return 0;
        }
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.window);
        let len = self.scratch.len();
        let rank = ((len as f64 * q.clamp(0.0, 1.0)) as usize).min(len - 1);
        let (_, value, _) = self.scratch.select_nth_unstable(rank);
        *value
    }

    /// Mean jitter over every recorded tick.
    pub fn mean_ns(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.sum_ns as f64 / self.total as f64
        }
    }

    /// Fraction of ticks that started late.
    pub fn missed_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.missed as f64 / self.total as f64
        }
    }

    /// Ticks recorded.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Late ticks recorded.
    #[inline]
    pub fn missed(&self) -> u64 {
        self.missed
    }

    /// Worst jitter recorded.
    #[inline]
    pub fn max_ns(&self) -> u64 {
        self.max_ns
    }

    /// Samples currently in the window.
    #[inline]
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Summarise for logging.
    pub fn summary(&mut self) -> JitterSummary {
        JitterSummary {
            total: self.total,
            missed: self.missed,
            mean_ns: self.mean_ns(),
            p50_ns: self.percentile_ns(0.50),
            p99_ns: self.percentile_ns(0.99),
            max_ns: self.max_ns,
        }
    }

    /// Clear everything.
    pub fn reset(&mut self) {
        self.total = 0;
        self.missed = 0;
        self.max_ns = 0;
        self.sum_ns = 0;
        self.window.clear();
        self.cursor = 0;
        self.scratch.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts() {
        let mut stats = JitterStats::default();
        stats.record(100_000, false);
        stats.record(300_000, true);
        assert_eq!(stats.total(), 2);
        assert_eq!(stats.missed(), 1);
        assert_eq!(stats.max_ns(), 300_000);
        assert!((stats.mean_ns() - 200_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_keeps_latest() {
        let mut stats = JitterStats::with_window(3);
        for i in 1..=5u64 {
            stats.record(i * 1_000, false);
        }
        assert_eq!(stats.window_len(), 3);
        let mut kept = stats.window.clone();
        kept.sort_unstable();
        assert_eq!(kept, vec![3_000, 4_000, 5_000]);
    }

    #[test]
    fn test_percentiles() {
        let mut stats = JitterStats::default();
        for i in 0..100u64 {
            stats.record(i * 1_000, false);
        }
        let p99 = stats.percentile_ns(0.99);
        assert!((97_000..=99_000).contains(&p99), "p99 was {p99}");
        assert_eq!(stats.percentile_ns(0.0), 0);
    }

    #[test]
    fn test_zero_window() {
        let mut stats = JitterStats::with_window(0);
        stats.record(10, false);
        assert_eq!(stats.total(), 1);
        assert_eq!(stats.window_len(), 0);
        assert_eq!(stats.percentile_ns(0.5), 0);
    }

    #[test]
    fn test_summary_and_reset() {
        let mut stats = JitterStats::default();
        for _ in 0..10 {
            stats.record(50_000, false);
        }
        let summary = stats.summary();
        assert_eq!(summary.total, 10);
        assert_eq!(summary.p50_ns, 50_000);
        assert_eq!(summary.p99_ns, 50_000);

        stats.reset();
        assert_eq!(stats.summary(), JitterSummary::default());
    }
}
