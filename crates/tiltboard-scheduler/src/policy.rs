//! Real-time policy for the haptic thread.

use tiltboard_errors::RTResult;

#[cfg(target_os = "linux")]
use crate::linux as platform;

#[cfg(not(target_os = "linux"))]
use crate::fallback as platform;

/// Scheduling policy applied by the haptic thread to itself on start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtPolicy {
    /// `SCHED_FIFO` priority, `None` leaves the default scheduler.
    pub fifo_priority: Option<i32>,
    /// Lock current and future pages to avoid page faults mid-cycle.
    pub lock_memory: bool,
    /// Pin the thread to one CPU.
    pub cpu: Option<usize>,
}

impl Default for RtPolicy {
    fn default() -> Self {
        Self {
            fifo_priority: Some(80),
            lock_memory: true,
            cpu: None,
        }
    }
}

impl RtPolicy {
    /// Leave the thread exactly as the OS created it.
    pub fn none() -> Self {
        Self {
            fifo_priority: None,
            lock_memory: false,
            cpu: None,
        }
    }

    /// Set the FIFO priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.fifo_priority = Some(priority);
        self
    }

    /// Pin to a CPU.
    pub fn with_cpu(mut self, cpu: usize) -> Self {
        self.cpu = Some(cpu);
        self
    }

    /// Check if the policy changes anything.
    pub fn is_active(&self) -> bool {
        self.fifo_priority.is_some() || self.lock_memory || self.cpu.is_some()
    }

    /// Apply to the calling thread.
    ///
    /// Every step is attempted even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns [`tiltboard_errors::RTError::RTSetupFailed`] if any step was
    /// refused, typically for lack of `CAP_SYS_NICE` or `RLIMIT_MEMLOCK`.
    /// The thread still runs correctly, just with more jitter.
    pub fn apply_to_current_thread(&self) -> RTResult {
        if !self.is_active() {
            return Ok(());
        }
        platform::apply(self)
    }
}
