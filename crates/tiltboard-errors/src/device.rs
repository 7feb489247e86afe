//! Haptic device errors.

use crate::common::ErrorSeverity;

/// Haptic device errors.
///
/// Read and write failures are the common case at 1 kHz and are retried on
/// the next cycle. Open and calibration failures happen before the loop
/// starts producing force.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeviceError {
    /// No device available
    #[error("Haptic device not found: {0}")]
    NotFound(String),

    /// Device could not be opened
    #[error("Failed to open haptic device {device}: {reason}")]
    OpenFailed {
        /// Device identifier
        device: String,
        /// Failure reason
        reason: String,
    },

    /// Calibration did not complete
    #[error("Calibration failed on {device}: {reason}")]
    CalibrationFailed {
        /// Device identifier
        device: String,
        /// Failure reason
        reason: String,
    },

    /// State sample could not be read
    #[error("Failed to read from {device}: {message}")]
    Read {
        /// Device identifier
        device: String,
        /// Error message
        message: String,
    },

    /// Force command could not be written
    #[error("Failed to write force to {device}: {message}")]
    Write {
        /// Device identifier
        device: String,
        /// Error message
        message: String,
    },

    /// Operation attempted on a closed device
    #[error("Haptic device {0} is not open")]
    NotOpen(String),

    /// Device went away
    #[error("Haptic device disconnected: {0}")]
    Disconnected(String),
}

impl DeviceError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DeviceError::NotFound(_) | DeviceError::OpenFailed { .. } => ErrorSeverity::Critical,
            DeviceError::CalibrationFailed { .. } => ErrorSeverity::Error,
            DeviceError::Read { .. } | DeviceError::Write { .. } => ErrorSeverity::Warning,
            DeviceError::NotOpen(_) => ErrorSeverity::Error,
            DeviceError::Disconnected(_) => ErrorSeverity::Critical,
        }
    }

    /// Check if retrying on the next cycle might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeviceError::Read { .. } | DeviceError::Write { .. })
    }

    /// Create a not found error.
    pub fn not_found(device: impl Into<String>) -> Self {
        DeviceError::NotFound(device.into())
    }

    /// Create a read error.
    pub fn read(device: impl Into<String>, message: impl Into<String>) -> Self {
        DeviceError::Read {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create a write error.
    pub fn write(device: impl Into<String>, message: impl Into<String>) -> Self {
        DeviceError::Write {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create a disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        DeviceError::Disconnected(device.into())
    }

    /// Create a not-open error.
    pub fn not_open(device: impl Into<String>) -> Self {
        DeviceError::NotOpen(device.into())
    }
}
