//! Top-level error type and classification shared by every crate.

use core::fmt;

use crate::{DeviceError, RTError, SettingsError, TelemetryError};

/// Top-level error wrapping every sub-error of the workspace.
#[derive(Debug, thiserror::Error)]
pub enum TiltBoardError {
    /// Real-time scheduling errors
    #[error("RT error: {0}")]
    RT(#[from] RTError),

    /// Haptic device errors
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Experiment settings errors
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Telemetry sink errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),


    /// A worker thread panicked
    #[error("{0} thread panicked")]
    ThreadPanicked(String),
}

impl TiltBoardError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            TiltBoardError::RT(_) => ErrorCategory::RT,
            TiltBoardError::Device(_) => ErrorCategory::Device,
            TiltBoardError::Settings(_) => ErrorCategory::Settings,
            TiltBoardError::Telemetry(_) => ErrorCategory::Telemetry,
            TiltBoardError::Io(_) => ErrorCategory::IO,
            TiltBoardError::ThreadPanicked(_) => ErrorCategory::RT,
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TiltBoardError::RT(e) => e.severity(),
            TiltBoardError::Device(e) => e.severity(),
            TiltBoardError::Settings(e) => e.severity(),
            TiltBoardError::Telemetry(e) => e.severity(),
            TiltBoardError::Io(_) => ErrorSeverity::Error,
            TiltBoardError::ThreadPanicked(_) => ErrorSeverity::Critical,
        }
    }
}

impl From<std::io::Error> for TiltBoardError {
    fn from(e: std::io::Error) -> Self {
        TiltBoardError::Io(e)
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Real-time scheduling errors
    RT = 0,
    /// Haptic device errors
    Device = 1,
    /// Experiment settings errors
    Settings = 2,
    /// I/O errors
    IO = 3,
    /// Telemetry errors
    Telemetry = 4,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::RT => "RT",
            ErrorCategory::Device => "Device",
            ErrorCategory::Settings => "Settings",
            ErrorCategory::IO => "IO",
            ErrorCategory::Telemetry => "Telemetry",
        };
        f.write_str(name)
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, the loop continues
    Warning = 1,
    /// Error, the operation failed
    Error = 2,
    /// Critical, the session cannot continue
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARN",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}
