//! Error types for the tilt board haptics workspace.
//!
//! Errors are split by the part of the system that raises them:
//!
//! - [`common`]: the top-level [`TiltBoardError`] plus category and severity
//!   classification
//! - [`rt`]: `Copy` error codes used on the haptic thread
//! - [`device`]: haptic device open/calibrate/read/write failures
//! - [`settings`]: experiment settings loading
//! - [`telemetry`]: CSV sink failures
//!
//! Only [`SettingsError`] is fatal by contract. Device and telemetry errors
//! raised inside the haptic loop are counted and logged, then the loop carries
//! on with the previous sample or a zero force.
//!
//! # Example
//!
//! ```
//! use tiltboard_errors::prelude::*;
//!
//! fn mode_selector(token: &str) -> Result<u8> {
//!     token
//!         .parse::<u8>()
//!         .map_err(|e| SettingsError::invalid("control_mode", token, e.to_string()).into())
//! }
//!
//! assert!(mode_selector("2").is_ok());
//! assert!(mode_selector("two").is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod device;
pub mod prelude;
pub mod rt;
pub mod settings;
pub mod telemetry;

pub use common::{ErrorCategory, ErrorSeverity, TiltBoardError};
pub use device::DeviceError;
pub use rt::RTError;
pub use settings::SettingsError;
pub use telemetry::TelemetryError;

/// A specialized `Result` type for tilt board operations.
pub type Result<T> = std::result::Result<T, TiltBoardError>;

/// A specialized `Result` type for real-time operations.
pub type RTResult<T = ()> = std::result::Result<T, RTError>;
