//! Linux sleep and thread policy.
#![expect(unsafe_code, reason = "libc scheduling, locking and sleep calls")]

use std::time::{Duration, Instant};

use libc::{
    CLOCK_MONOTONIC, MCL_CURRENT, MCL_FUTURE, SCHED_FIFO, clock_nanosleep, cpu_set_t, mlockall,
    sched_param, sched_setaffinity, sched_setscheduler, timespec,
};
use tiltboard_errors::{RTError, RTResult};
use tracing::warn;

use crate::policy::RtPolicy;

const CPU_SETSIZE: usize = libc::CPU_SETSIZE as usize;

/// Busy-spin this long before the deadline instead of trusting the kernel.
const SPIN_TAIL: Duration = Duration::from_micros(80);

/// `clock_nanosleep` followed by a short busy-spin.
pub(crate) struct PlatformSleep;

impl PlatformSleep {
    pub(crate) fn sleep_until(&mut self, deadline: Instant) -> RTResult {
        let now = Instant::now();
        if deadline <= now {
            return Ok(());
        }
        let remaining = deadline.saturating_duration_since(now);

        if remaining > SPIN_TAIL {
            let coarse = remaining.saturating_sub(SPIN_TAIL);
            let ts = timespec {
                tv_sec: coarse.as_secs().try_into().unwrap_or(libc::time_t::MAX),
                tv_nsec: libc::c_long::try_from(coarse.subsec_nanos()).unwrap_or(0),
            };
            // SAFETY: `ts` is a valid timespec on the stack and the remainder
            // pointer may be null for a relative sleep.
            let rc = unsafe { clock_nanosleep(CLOCK_MONOTONIC, 0, &ts, std::ptr::null_mut()) };
            if rc != 0 && rc != libc::EINTR {
                return Err(RTError::TimingViolation);
            }
        }

        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
        Ok(())
    }
}

pub(crate) fn apply(policy: &RtPolicy) -> RTResult {
    let mut ok = true;

    if let Some(priority) = policy.fifo_priority {
        let param = sched_param {
            sched_priority: priority,
        };
        // SAFETY: pid 0 is the calling thread and `param` outlives the call.
        let rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
        if rc != 0 {
            warn!(
                priority,
                error = %std::io::Error::last_os_error(),
                "SCHED_FIFO refused"
            );
            ok = false;
        }
    }

    if policy.lock_memory {
        // SAFETY: mlockall takes only flags.
        let rc = unsafe { mlockall(MCL_CURRENT | MCL_FUTURE) };
        if rc != 0 {
            warn!(error = %std::io::Error::last_os_error(), "mlockall refused");
            ok = false;
        }
    }

    if let Some(cpu) = policy.cpu.filter(|&cpu| cpu >= CPU_SETSIZE) {
        warn!(cpu, "CPU index outside the affinity mask, not pinning");
        ok = false;
    } else if let Some(cpu) = policy.cpu {
        // SAFETY: cpu_set_t is plain data and all-zero is the empty set.
        let mut set: cpu_set_t = unsafe { std::mem::zeroed() };
        // SAFETY: `cpu` was checked against CPU_SETSIZE above.
        unsafe { libc::CPU_SET(cpu, &mut set) };
        // SAFETY: `set` is initialised and its size is passed alongside.
        let rc = unsafe { sched_setaffinity(0, std::mem::size_of::<cpu_set_t>(), &set) };
        if rc != 0 {
            warn!(cpu, error = %std::io::Error::last_os_error(), "CPU pinning refused");
            ok = false;
        }
    }

    if ok {
        Ok(())
    } else {
        Err(RTError::RTSetupFailed)
    }
}
