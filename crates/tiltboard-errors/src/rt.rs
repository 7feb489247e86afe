//! Real-time error codes.
//!
//! These are raised on the haptic thread, so they are `Copy`, carry no heap
//! data, and map to a fixed `u8` code that can be stored in an atomic.

use core::fmt;

use crate::common::ErrorSeverity;

/// Real-time error codes.
///
/// # Examples
///
/// ```
/// use tiltboard_errors::{ErrorSeverity, RTError};
///
/// let err = RTError::TimingViolation;
/// assert_eq!(err.code(), 1);
/// assert_eq!(err.severity(), ErrorSeverity::Warning);
/// assert_eq!(RTError::from_code(err.code()), Some(err));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RTError {
    /// Tick jitter exceeded the threshold, or the clock could not sleep
    TimingViolation = 1,
    /// Priority, memory locking or affinity could not be applied
    RTSetupFailed = 2,
    /// A bounded queue on the RT path was full
    BufferOverflow = 3,
    /// A tick started after its deadline
    DeadlineMissed = 4,
}

impl RTError {
    /// Get the numeric error code. Zero is never used, so it can mean
    /// "no error" in an atomic.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Get the error severity.
    pub fn severity(self) -> ErrorSeverity {
        match self {
            RTError::TimingViolation => ErrorSeverity::Warning,
            RTError::RTSetupFailed => ErrorSeverity::Warning,
            RTError::BufferOverflow => ErrorSeverity::Warning,
            RTError::DeadlineMissed => ErrorSeverity::Info,
        }
    }

    /// Create an error from a code.
    ///
    /// Returns `None` if the code does not correspond to a known error.
    ///
    /// ```
    /// use tiltboard_errors::RTError;
    ///
    /// assert_eq!(RTError::from_code(4), Some(RTError::DeadlineMissed));
    /// assert_eq!(RTError::from_code(0), None);
    /// ```
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(RTError::TimingViolation),
            2 => Some(RTError::RTSetupFailed),
            3 => Some(RTError::BufferOverflow),
            4 => Some(RTError::DeadlineMissed),
            _ => None,
        }
    }
}

impl fmt::Display for RTError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RTError::TimingViolation => "Real-time timing violation",
            RTError::RTSetupFailed => "Failed to apply real-time setup",
            RTError::BufferOverflow => "Real-time queue full",
            RTError::DeadlineMissed => "Haptic deadline missed",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for RTError {}
