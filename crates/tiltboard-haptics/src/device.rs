//! Haptic device boundary.
//!
//! The loop talks to hardware only through [`HapticDevice`]. A device is
//! opened and calibrated once before the first cycle and closed once after
//! the last; in between it is sampled and commanded once per cycle.

use tiltboard_errors::DeviceError;

use crate::{Rot3, Vec3};

/// Buttons reported by the stylus.
pub const MAX_BUTTONS: usize = 4;

/// Pressed state of the device buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Buttons([bool; MAX_BUTTONS]);

impl Buttons {
    /// Nothing pressed.
    pub const NONE: Buttons = Buttons([false; MAX_BUTTONS]);

    /// Build from raw states.
    pub const fn new(states: [bool; MAX_BUTTONS]) -> Self {
        Self(states)
    }

    /// State of button `index`; out-of-range indices read as released.
    #[inline]
    pub fn is_pressed(self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    /// Copy with button `index` set.
    pub fn with(mut self, index: usize, pressed: bool) -> Self {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = pressed;
        }
        self
    }

    /// Button 0, hands authority to the operator.
    #[inline]
    pub fn primary(self) -> bool {
        self.is_pressed(0)
    }

    /// Button 1, hands authority to the guidance controller.
    #[inline]
    pub fn secondary(self) -> bool {
        self.is_pressed(1)
    }

    /// Any button down.
    pub fn any(self) -> bool {
        self.0.iter().any(|&b| b)
    }
}

/// One reading of the device state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSample {
    /// Stylus tip position in device coordinates (m).
    pub position: Vec3,
    /// Stylus orientation, if the device reports one.
    pub orientation: Option<Rot3>,
    /// Linear velocity (m/s).
    pub linear_velocity: Vec3,
    /// Angular velocity (rad/s).
    pub angular_velocity: Vec3,
    /// Gripper opening angle (rad).
    pub gripper_angle: f64,
    /// Gripper angular velocity (rad/s).
    pub gripper_angular_velocity: f64,
    /// Button states.
    pub buttons: Buttons,
}

impl DeviceSample {
    /// A motionless sample at `position` with nothing pressed.
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            position,
            orientation: None,
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            gripper_angle: 0.0,
            gripper_angular_velocity: 0.0,
            buttons: Buttons::NONE,
        }
    }
}

impl Default for DeviceSample {
    fn default() -> Self {
        Self::at_rest(Vec3::zeros())
    }
}

/// Static capabilities of a device, read once after opening.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSpecifications {
    /// Model name for logs.
    pub model: String,
    /// Largest force the device can render (N).
    pub max_linear_force: f64,
    /// Largest stable linear damping (N·s/m).
    pub max_linear_damping: f64,
    /// Largest stable angular damping (Nm·s/rad).
    pub max_angular_damping: f64,
    /// Largest stable gripper damping (N·s/rad).
    pub max_gripper_angular_damping: f64,
}

/// Force, torque and gripper force sent to the device in one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceOutput {
    /// Force at the stylus tip (N).
    pub force: Vec3,
    /// Torque about the stylus (Nm).
    pub torque: Vec3,
    /// Gripper force (N).
    pub gripper_force: f64,
}

impl DeviceOutput {
    /// No force at all.
    pub fn zero() -> Self {
        Self {
            force: Vec3::zeros(),
            torque: Vec3::zeros(),
            gripper_force: 0.0,
        }
    }
}

impl Default for DeviceOutput {
    fn default() -> Self {
        Self::zero()
    }
}

/// Capability interface of a haptic device.
pub trait HapticDevice: Send {
    /// Identifier for logs and errors.
    fn name(&self) -> &str;

    /// Connect to the device.
    fn open(&mut self) -> Result<(), DeviceError>;

    /// Run the device calibration routine.
    fn calibrate(&mut self) -> Result<(), DeviceError>;

    /// Release the device. Output is zeroed before closing.
    fn close(&mut self) -> Result<(), DeviceError>;

    /// Read the current state.
    fn sample(&mut self) -> Result<DeviceSample, DeviceError>;

    /// Command force, torque and gripper force.
    fn apply_force(
        &mut self,
        force: Vec3,
        torque: Vec3,
        gripper_force: f64,
    ) -> Result<(), DeviceError>;

    /// Static capabilities.
    fn specifications(&self) -> &DeviceSpecifications;
}
