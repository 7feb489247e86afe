//! Fixed-period timing for the haptic loop.
//!
//! The haptic thread targets 1 kHz. This crate provides:
//!
//! - [`HapticClock`]: absolute-deadline ticking, returning the measured
//!   interval of every cycle so the integrator can clamp it
//! - [`DriftCorrector`]: proportional-integral correction of the period so
//!   long sessions do not drift
//! - [`JitterStats`]: bounded ring of wake-up errors with percentiles
//! - [`RtPolicy`]: priority, memory locking and CPU pinning for the calling
//!   thread
//!
//! Nothing in the tick path allocates once the clock is built.
//!
//! # Example
//!
//! ```no_run
//! use tiltboard_scheduler::{HapticClock, RtPolicy};
//!
//! # fn main() -> Result<(), tiltboard_errors::RTError> {
//! RtPolicy::default().apply_to_current_thread()?;
//! let mut clock = HapticClock::new_1khz();
//! for _ in 0..1000 {
//!     let tick = clock.wait()?;
//!     let _dt = tick.interval;
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]

pub mod clock;
pub mod drift;
pub mod jitter;
pub mod policy;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(target_os = "linux"))]
mod fallback;

pub mod prelude;

pub use clock::{HapticClock, Tick};
pub use drift::DriftCorrector;
pub use jitter::{JitterStats, JitterSummary};
pub use policy::RtPolicy;
pub use tiltboard_errors::{RTError, RTResult};

/// Haptic period at 1 kHz in nanoseconds.
pub const HAPTIC_PERIOD_NS: u64 = 1_000_000;

/// Wake-up error above which a tick is flagged as a timing violation (0.25 ms).
pub const MAX_JITTER_NS: u64 = 250_000;
