//! Portable sleep for platforms without a dedicated backend.

use std::time::Instant;

use tiltboard_errors::RTResult;
use tracing::debug;

use crate::policy::RtPolicy;

/// `std::thread::sleep` with no spin tail.
pub(crate) struct PlatformSleep;

impl PlatformSleep {
    pub(crate) fn sleep_until(&mut self, deadline: Instant) -> RTResult {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
        Ok(())
    }
}

pub(crate) fn apply(policy: &RtPolicy) -> RTResult {
    debug!(?policy, "real-time policy not supported on this platform, ignoring");
    Ok(())
}
