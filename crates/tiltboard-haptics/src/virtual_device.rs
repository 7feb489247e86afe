//! Software stand-in for a haptic stylus.
//!
//! The virtual device replays a deterministic motion, one step per
//! [`HapticDevice::sample`] call, so runs are reproducible regardless of
//! wall-clock jitter. A [`VirtualDeviceHandle`] lets the operator side or a
//! test press buttons, inject faults and inspect what the loop commanded.

use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::sync::Arc;

use parking_lot::Mutex;
use tiltboard_errors::DeviceError;
use tracing::{debug, info};

use crate::device::{Buttons, DeviceOutput, DeviceSample, DeviceSpecifications, HapticDevice};
use crate::Vec3;

/// Commanded outputs kept for inspection.
const OUTPUT_HISTORY: usize = 1024;

/// Simulated time advanced by each sample (s).
const SAMPLE_STEP: f64 = 0.001;

/// How the virtual stylus moves.
#[derive(Debug, Clone, PartialEq)]
pub enum Motion {
    /// Held still at a point.
    Still(Vec3),
    /// Lissajous sweep of the horizontal plane around the origin.
    Lissajous {
        /// Peak excursion on each axis (m).
        amplitude: f64,
        /// Frequency on X (Hz).
        fx: f64,
        /// Frequency on Y (Hz).
        fy: f64,
    },
}

impl Motion {
    fn sample_at(&self, t: f64) -> (Vec3, Vec3) {
        match *self {
            Motion::Still(p) => (p, Vec3::zeros()),
            Motion::Lissajous { amplitude, fx, fy } => {
                let (wx, wy) = (TAU * fx, TAU * fy);
                let position = Vec3::new(
                    amplitude * (wx * t).sin(),
                    amplitude * (wy * t + TAU / 4.0).sin(),
                    0.0,
                );
                let velocity = Vec3::new(
                    amplitude * wx * (wx * t).cos(),
                    amplitude * wy * (wy * t + TAU / 4.0).cos(),
                    0.0,
                );
                (position, velocity)
            }
        }
    }
}

#[derive(Debug)]
struct VirtualState {
    open: bool,
    connected: bool,
    calibrated: bool,
    motion: Motion,
    elapsed: f64,
    samples: u64,
    buttons: Buttons,
    fail_reads: u32,
    fail_writes: u32,
    outputs: VecDeque<DeviceOutput>,
    writes: u64,
    closes: u32,
}

/// Virtual haptic device.
pub struct VirtualDevice {
    name: String,
    specs: DeviceSpecifications,
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualDevice {
    /// Device following `motion`.
    pub fn new(name: impl Into<String>, motion: Motion) -> Self {
        let name = name.into();
        Self {
            specs: DeviceSpecifications {
                model: format!("virtual:{name}"),
                max_linear_force: 8.0,
                max_linear_damping: 15.0,
                max_angular_damping: 0.04,
                max_gripper_angular_damping: 0.01,
            },
            name,
            state: Arc::new(Mutex::new(VirtualState {
                open: false,
                connected: true,
                calibrated: false,
                motion,
                elapsed: 0.0,
                samples: 0,
                buttons: Buttons::NONE,
                fail_reads: 0,
                fail_writes: 0,
                outputs: VecDeque::with_capacity(OUTPUT_HISTORY),
                writes: 0,
                closes: 0,
            })),
        }
    }

    /// Device resting at the workspace origin.
    pub fn still() -> Self {
        Self::new("virtual-stylus", Motion::Still(Vec3::zeros()))
    }

    /// Override the reported capabilities.
    pub fn with_specifications(mut self, specs: DeviceSpecifications) -> Self {
        self.specs = specs;
        self
    }

    /// Handle for driving the device from another thread.
    pub fn handle(&self) -> VirtualDeviceHandle {
        VirtualDeviceHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl HapticDevice for VirtualDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        state.open = true;
        info!(device = %self.name, "virtual device opened");
        Ok(())
    }

    fn calibrate(&mut self) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(DeviceError::not_open(self.name.clone()));
        }
        state.calibrated = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        state.open = false;
        state.closes = state.closes.saturating_add(1);
        debug!(device = %self.name, writes = state.writes, "virtual device closed");
        Ok(())
    }

    fn sample(&mut self) -> Result<DeviceSample, DeviceError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(DeviceError::not_open(self.name.clone()));
        }
        if !state.connected {
            return Err(DeviceError::disconnected(self.name.clone()));
        }
        state.elapsed += SAMPLE_STEP;
        state.samples = state.samples.saturating_add(1);
        if state.fail_reads > 0 {
            state.fail_reads -= 1;
            return Err(DeviceError::read(self.name.clone(), "injected read fault"));
        }
        let (position, linear_velocity) = state.motion.sample_at(state.elapsed);
        Ok(DeviceSample {
            position,
            linear_velocity,
            buttons: state.buttons,
            ..DeviceSample::default()
        })
    }

    fn apply_force(
        &mut self,
        force: Vec3,
        torque: Vec3,
        gripper_force: f64,
    ) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(DeviceError::not_open(self.name.clone()));
        }
        if !state.connected {
            return Err(DeviceError::disconnected(self.name.clone()));
        }
        if state.fail_writes > 0 {
            state.fail_writes -= 1;
            return Err(DeviceError::write(self.name.clone(), "injected write fault"));
        }
        if state.outputs.len() == OUTPUT_HISTORY {
            state.outputs.pop_front();
        }
        state.outputs.push_back(DeviceOutput {
            force,
            torque,
            gripper_force,
        });
        state.writes = state.writes.saturating_add(1);
        Ok(())
    }

    fn specifications(&self) -> &DeviceSpecifications {
        &self.specs
    }
}

/// Remote control for a [`VirtualDevice`] owned by the haptic thread.
#[derive(Clone)]
pub struct VirtualDeviceHandle {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualDeviceHandle {
    /// Replace every button state.
    pub fn set_buttons(&self, buttons: Buttons) {
        self.state.lock().buttons = buttons;
    }

    /// Press or release one button.
    pub fn set_button(&self, index: usize, pressed: bool) {
        let mut state = self.state.lock();
        state.buttons = state.buttons.with(index, pressed);
    }

    /// Change the motion from the next sample on.
    pub fn set_motion(&self, motion: Motion) {
        self.state.lock().motion = motion;
    }

    /// Make the next `n` samples fail.
    pub fn fail_next_reads(&self, n: u32) {
        self.state.lock().fail_reads = n;
    }

    /// Make the next `n` force commands fail.
    pub fn fail_next_writes(&self, n: u32) {
        self.state.lock().fail_writes = n;
    }

    /// Unplug or replug the stylus. While unplugged every sample and force
    /// command fails with [`DeviceError::Disconnected`].
    pub fn set_connected(&self, connected: bool) {
        self.state.lock().connected = connected;
    }

    /// Device currently open.
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Calibration has run since the device was created.
    pub fn is_calibrated(&self) -> bool {
        self.state.lock().calibrated
    }

    /// Number of times the device was closed.
    pub fn close_count(&self) -> u32 {
        self.state.lock().closes
    }

    /// Sample calls so far, failed ones included.
    pub fn sample_count(&self) -> u64 {
        self.state.lock().samples
    }

    /// Successful force commands so far.
    pub fn write_count(&self) -> u64 {
        self.state.lock().writes
    }

    /// Most recent successful command.
    pub fn last_output(&self) -> Option<DeviceOutput> {
        self.state.lock().outputs.back().copied()
    }

    /// Up to the last 1024 successful commands, oldest first.
    pub fn recent_outputs(&self) -> Vec<DeviceOutput> {
        self.state.lock().outputs.iter().copied().collect()
    }
}
