//! Telemetry sink errors.

use std::path::PathBuf;

use crate::common::ErrorSeverity;

/// Errors raised by the CSV telemetry writer.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A stream file or directory could not be created or written
    #[error("Telemetry I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The writer thread is gone
    #[error("Telemetry sink closed")]
    SinkClosed,
}

impl TelemetryError {
    /// Telemetry loss never stops the haptic loop.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TelemetryError::Io { .. } => ErrorSeverity::Error,
            TelemetryError::SinkClosed => ErrorSeverity::Warning,
        }
    }

    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TelemetryError::Io {
            path: path.into(),
            source,
        }
    }
}
