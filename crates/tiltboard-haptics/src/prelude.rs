//! Common imports for building and driving a haptic session.

pub use crate::arbiter::{ArbiterInputs, Authority, ControlArbiter, ControlMode, ControlState};
pub use crate::device::{Buttons, DeviceOutput, DeviceSample, DeviceSpecifications, HapticDevice};
pub use crate::dynamics::{ControlledSphere, SphereDynamics};
pub use crate::forces::{ForceModel, OutputOptions};
pub use crate::haptic_loop::{
    CycleOutcome, HapticLoop, HapticLoopHandle, LoopCommand, LoopConfig, LoopSummary,
};
pub use crate::prediction::{Prediction, PredictionSource};
pub use crate::scene::{Scene, SceneEvent, SceneId};
pub use crate::shared::{DisplaySnapshot, SharedState};
pub use crate::telemetry::{TelemetryEvent, TelemetryRecord, TelemetrySink};
pub use crate::virtual_device::{Motion, VirtualDevice, VirtualDeviceHandle};
pub use crate::Vec3;
