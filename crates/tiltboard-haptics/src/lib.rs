//! Haptic core of the tilt board.
//!
//! One cycle of the haptic loop reads the stylus, lets the
//! [`ControlArbiter`] decide how much authority the operator holds, pulls the
//! controlled sphere toward the blended target, integrates it and renders
//! the reaction force back to the stylus.
//!
//! ## Modules
//!
//! - [`device`]: the [`HapticDevice`] boundary and its data types
//! - [`virtual_device`]: deterministic software device
//! - [`forces`]: spring, ground contact, damping and force-field terms
//! - [`dynamics`]: explicit-Euler sphere integrator
//! - [`arbiter`]: the authority blending state machine
//! - [`inactivity`]: stillness detection feeding the arbiter
//! - [`scene`]: scene interface, mazes and collision events
//! - [`shared`]: state published to the display side
//! - [`haptic_loop`]: the fixed-period loop tying it together
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tiltboard_haptics::prelude::*;
//!
//! let shared = Arc::new(SharedState::new());
//! let mut haptic = HapticLoop::new(
//!     Box::new(VirtualDevice::still()),
//!     SceneId::Sandbox.build(),
//!     ControlArbiter::new(ControlMode::Shared),
//!     Arc::clone(&shared),
//!     LoopConfig::default(),
//! );
//! haptic.start()?;
//! for _ in 0..10 {
//!     haptic.step(Duration::from_millis(1));
//! }
//! haptic.finish();
//! assert!(shared.lifecycle().is_finished());
//! # Ok::<(), tiltboard_errors::TiltBoardError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod arbiter;
pub mod constants;
pub mod counters;
pub mod device;
pub mod dynamics;
pub mod forces;
pub mod haptic_loop;
pub mod inactivity;
pub mod lifecycle;
pub mod prediction;
pub mod prelude;
pub mod scene;
pub mod shared;
pub mod telemetry;
pub mod virtual_device;

/// Three-component vector in workspace or device coordinates.
pub type Vec3 = nalgebra::Vector3<f64>;

/// Rotation matrix of the stylus.
pub type Rot3 = nalgebra::Rotation3<f64>;

pub use arbiter::{ArbiterInputs, Authority, ControlArbiter, ControlMode, ControlState};
pub use counters::{CounterSnapshot, LoopCounters};
pub use device::{Buttons, DeviceOutput, DeviceSample, DeviceSpecifications, HapticDevice};
pub use dynamics::{ControlledSphere, SphereDynamics};
pub use forces::{DeviceGains, ForceModel, OutputOptions, SphereForces};
pub use haptic_loop::{
    CycleOutcome, HapticLoop, HapticLoopHandle, LoopCommand, LoopCommandError, LoopConfig,
    LoopSummary,
};
pub use inactivity::InactivityDetector;
pub use lifecycle::Lifecycle;
pub use prediction::{Prediction, PredictionSource, StaticPrediction};
pub use scene::{Scene, SceneEvent, SceneId, Wall, WallId};
pub use shared::{DisplaySnapshot, SharedState};
pub use telemetry::{MemorySink, NullSink, TelemetryEvent, TelemetryRecord, TelemetrySink};
pub use virtual_device::{Motion, VirtualDevice, VirtualDeviceHandle};
