//! Common scheduler imports.

pub use crate::clock::{HapticClock, Tick};
pub use crate::drift::DriftCorrector;
pub use crate::jitter::{JitterStats, JitterSummary};
pub use crate::policy::RtPolicy;
pub use crate::{HAPTIC_PERIOD_NS, MAX_JITTER_NS};
pub use tiltboard_errors::{RTError, RTResult};
