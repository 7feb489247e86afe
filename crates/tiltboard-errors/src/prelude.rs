//! Convenient imports for error handling.
//!
//! ```
//! use tiltboard_errors::prelude::*;
//!
//! fn open() -> Result<()> {
//!     Err(DeviceError::not_found("virtual").into())
//! }
//!
//! assert_eq!(open().map_err(|e| e.category()).err(), Some(ErrorCategory::Device));
//! ```

pub use crate::{
    RTResult, Result,
    common::{ErrorCategory, ErrorSeverity, TiltBoardError},
    device::DeviceError,
    rt::RTError,
    settings::SettingsError,
    telemetry::TelemetryError,
};
