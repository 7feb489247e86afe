//! Exit codes.

use tiltboard_errors::{DeviceError, ErrorCategory, ErrorSeverity, SettingsError, TiltBoardError};

/// Settings could not be loaded.
pub const EXIT_SETTINGS: u8 = 2;
/// Haptic device could not be opened or calibrated.
pub const EXIT_DEVICE: u8 = 3;
/// Anything else.
pub const EXIT_FAILURE: u8 = 1;

/// Category and severity of the first workspace error in the chain.
pub fn classify(err: &anyhow::Error) -> Option<(ErrorCategory, ErrorSeverity)> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<TiltBoardError>() {
            return Some((e.category(), e.severity()));
        }
        if let Some(e) = cause.downcast_ref::<SettingsError>() {
            return Some((ErrorCategory::Settings, e.severity()));
        }
        cause
            .downcast_ref::<DeviceError>()
            .map(|e| (ErrorCategory::Device, e.severity()))
    })
}

/// Exit code for a failed session.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match classify(err) {
        Some((ErrorCategory::Settings, _)) => EXIT_SETTINGS,
        Some((ErrorCategory::Device, _)) => EXIT_DEVICE,
        _ => EXIT_FAILURE,
    }
}
