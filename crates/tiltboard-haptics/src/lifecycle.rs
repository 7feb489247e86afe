//! Running and finished flags shared by the haptic thread and its owner.
//!
//! The owner clears `running` to ask the loop to stop; the loop sets
//! `finished` after it has closed every resource it holds. Waiting on
//! `finished` blocks on a condition variable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Lifecycle flags of one haptic session.
#[derive(Debug, Default)]
pub struct Lifecycle {
    running: AtomicBool,
    finished: Mutex<bool>,
    finished_cv: Condvar,
}

impl Lifecycle {
    /// Flags for a session that has not started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the loop when its first cycle is about to run.
    pub fn mark_running(&self) {
        *self.finished.lock() = false;
        self.running.store(true, Ordering::Release);
    }

    /// Ask the loop to stop at the top of its next cycle.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Loop should keep cycling.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Called by the loop once its resources are released.
    pub fn mark_finished(&self) {
        self.running.store(false, Ordering::Release);
        let mut finished = self.finished.lock();
        *finished = true;
        self.finished_cv.notify_all();
    }

    /// Loop has released its resources.
    pub fn is_finished(&self) -> bool {
        *self.finished.lock()
    }

    /// Block until the loop has finished, or until `timeout` elapses.
    ///
    /// Returns whether the loop finished.
    pub fn wait_finished(&self, timeout: Option<Duration>) -> bool {
        let mut finished = self.finished.lock();
        match timeout {
            None => {
                while !*finished {
                    self.finished_cv.wait(&mut finished);
                }
                true
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while !*finished {
                    if self
                        .finished_cv
                        .wait_until(&mut finished, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
                *finished
            }
        }
    }
}
