//! Experiment settings errors.

use std::path::{Path, PathBuf};

use crate::common::ErrorSeverity;

/// Errors raised while loading experiment settings.
///
/// All of these abort startup before the haptic loop is created.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file does not exist
    #[error("Settings file not found: {}", path.display())]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// File ended before a field was read
    #[error("Missing settings field '{0}'")]
    MissingField(&'static str),

    /// Field present but unusable
    #[error("Invalid settings field '{field}' = '{value}': {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Raw token
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Settings file could not be read
    #[error("Failed to read settings from {}: {source}", path.display())]
    Io {
        /// Path being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl SettingsError {
    /// Settings errors always stop the session.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Critical
    }

    /// Create a not found error.
    pub fn not_found(path: impl AsRef<Path>) -> Self {
        SettingsError::NotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create an invalid field error.
    pub fn invalid(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SettingsError::InvalidField {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }
}
