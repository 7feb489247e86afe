//! State shared between the haptic thread and the display side.
//!
//! Every field has exactly one writer. The haptic thread publishes the
//! per-cycle values; the operator side writes the hooks. Readers take
//! whatever is there: a vector may mix components from two consecutive
//! cycles, which the display tolerates.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicUsize, Ordering};

use portable_atomic::AtomicF64;
use serde::Serialize;

use crate::Vec3;
use crate::arbiter::{Authority, ControlMode, ControlState};
use crate::counters::{CounterSnapshot, LoopCounters};
use crate::forces::OutputOptions;
use crate::lifecycle::Lifecycle;
use crate::prediction::Prediction;
use crate::scene::SceneId;

/// Three independently atomic components.
#[derive(Debug, Default)]
pub struct AtomicVec3([AtomicF64; 3]);

impl AtomicVec3 {
    /// Read the vector.
    #[inline]
    pub fn load(&self) -> Vec3 {
        let [x, y, z] = &self.0;
        Vec3::new(
            x.load(Ordering::Relaxed),
            y.load(Ordering::Relaxed),
            z.load(Ordering::Relaxed),
        )
    }

    /// Replace the vector.
    #[inline]
    pub fn store(&self, v: &Vec3) {
        let [x, y, z] = &self.0;
        x.store(v.x, Ordering::Relaxed);
        y.store(v.y, Ordering::Relaxed);
        z.store(v.z, Ordering::Relaxed);
    }
}

fn mode_code(mode: ControlMode) -> u8 {
    mode.selector()
}

fn mode_from_code(code: u8) -> Option<ControlMode> {
    ControlMode::from_selector(i64::from(code))
}

fn scene_code(scene: SceneId) -> u8 {
    match scene {
        SceneId::Sandbox => 1,
        SceneId::Scene1 => 2,
        SceneId::Scene2 => 3,
        SceneId::Scene3 => 4,
    }
}

fn scene_from_code(code: u8) -> Option<SceneId> {
    match code {
        1 => Some(SceneId::Sandbox),
        2 => Some(SceneId::Scene1),
        3 => Some(SceneId::Scene2),
        4 => Some(SceneId::Scene3),
        _ => None,
    }
}

fn prediction_code(prediction: Prediction) -> u8 {
    match prediction {
        Prediction::Human => 0,
        Prediction::Negotiate => 1,
        Prediction::Autonomous => 2,
    }
}

fn prediction_from_code(code: u8) -> Prediction {
    match code {
        1 => Prediction::Negotiate,
        2 => Prediction::Autonomous,
        _ => Prediction::Human,
    }
}

/// Values the haptic thread publishes once per cycle.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CyclePublication<'a> {
    pub ball: &'a Vec3,
    pub device_position: &'a Vec3,
    pub human_target: &'a Vec3,
    pub guidance_target: &'a Vec3,
    pub negotiated_target: &'a Vec3,
    pub human_force: &'a Vec3,
    pub guidance_force: &'a Vec3,
    pub device_force: &'a Vec3,
    pub control: &'a ControlState,
    pub prediction: Prediction,
    pub destination_index: usize,
}

/// Shared handle between the haptic thread and everyone else.
#[derive(Debug)]
pub struct SharedState {
    lifecycle: Lifecycle,
    counters: LoopCounters,

    ball: AtomicVec3,
    device_position: AtomicVec3,
    human_target: AtomicVec3,
    guidance_target: AtomicVec3,
    negotiated_target: AtomicVec3,
    human_force: AtomicVec3,
    guidance_force: AtomicVec3,
    device_force: AtomicVec3,
    authority: AtomicU16,
    damping_gain: AtomicF64,
    mode: AtomicU8,
    prediction: AtomicU8,
    scene: AtomicU8,
    destination_index: AtomicUsize,
    destination_total: AtomicUsize,

    force_field: AtomicBool,
    damping: AtomicBool,
    paused: AtomicBool,
}

impl SharedState {
    /// Fresh state with every hook off.
    pub fn new() -> Self {
        Self::with_hooks(OutputOptions::default())
    }

    /// Fresh state with the given initial hook settings.
    pub fn with_hooks(options: OutputOptions) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            counters: LoopCounters::new(),
            ball: AtomicVec3::default(),
            device_position: AtomicVec3::default(),
            human_target: AtomicVec3::default(),
            guidance_target: AtomicVec3::default(),
            negotiated_target: AtomicVec3::default(),
            human_force: AtomicVec3::default(),
            guidance_force: AtomicVec3::default(),
            device_force: AtomicVec3::default(),
            authority: AtomicU16::new(Authority::EQUAL.millis()),
            damping_gain: AtomicF64::new(0.0),
            mode: AtomicU8::new(0),
            prediction: AtomicU8::new(0),
            scene: AtomicU8::new(0),
            destination_index: AtomicUsize::new(0),
            destination_total: AtomicUsize::new(0),
            force_field: AtomicBool::new(options.force_field),
            damping: AtomicBool::new(options.damping),
            paused: AtomicBool::new(false),
        }
    }

    /// Running and finished flags.
    #[inline]
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Loop counters.
    #[inline]
    pub fn counters(&self) -> &LoopCounters {
        &self.counters
    }

    /// Flip the force-field hook; returns the new setting.
    pub fn toggle_force_field(&self) -> bool {
        !self.force_field.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flip the damping hook; returns the new setting.
    pub fn toggle_damping(&self) -> bool {
        !self.damping.fetch_xor(true, Ordering::Relaxed)
    }

    /// Set the force-field hook.
    pub fn set_force_field(&self, enabled: bool) {
        self.force_field.store(enabled, Ordering::Relaxed);
    }

    /// Set the damping hook.
    pub fn set_damping(&self, enabled: bool) {
        self.damping.store(enabled, Ordering::Relaxed);
    }

    /// Freeze the simulation; the device output is zeroed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    /// Resume after [`Self::pause`].
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    /// Simulation frozen.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// Current hook settings.
    #[inline]
    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            force_field: self.force_field.load(Ordering::Relaxed),
            damping: self.damping.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn publish_scene(&self, scene: SceneId, destinations: usize) {
        self.scene.store(scene_code(scene), Ordering::Relaxed);
        self.destination_total.store(destinations, Ordering::Relaxed);
        self.destination_index.store(0, Ordering::Relaxed);
    }

    pub(crate) fn publish_device_force(&self, force: &Vec3) {
        self.device_force.store(force);
    }

    pub(crate) fn publish_cycle(&self, cycle: &CyclePublication<'_>) {
        self.ball.store(cycle.ball);
        self.device_position.store(cycle.device_position);
        self.human_target.store(cycle.human_target);
        self.guidance_target.store(cycle.guidance_target);
        self.negotiated_target.store(cycle.negotiated_target);
        self.human_force.store(cycle.human_force);
        self.guidance_force.store(cycle.guidance_force);
        self.device_force.store(cycle.device_force);
        self.authority
            .store(cycle.control.authority.millis(), Ordering::Relaxed);
        self.damping_gain
            .store(cycle.control.damping_gain, Ordering::Relaxed);
        self.mode
            .store(mode_code(cycle.control.mode), Ordering::Relaxed);
        self.prediction
            .store(prediction_code(cycle.prediction), Ordering::Relaxed);
        self.destination_index
            .store(cycle.destination_index, Ordering::Relaxed);
    }

    /// Copy of everything, for display and logging.
    pub fn snapshot(&self) -> DisplaySnapshot {
        let v = |a: &AtomicVec3| -> [f64; 3] {
            let p = a.load();
            [p.x, p.y, p.z]
        };
        DisplaySnapshot {
            ball: v(&self.ball),
            device_position: v(&self.device_position),
            human_target: v(&self.human_target),
            guidance_target: v(&self.guidance_target),
            negotiated_target: v(&self.negotiated_target),
            human_force: v(&self.human_force),
            guidance_force: v(&self.guidance_force),
            device_force: v(&self.device_force),
            alpha: Authority::from_millis(self.authority.load(Ordering::Relaxed)).as_f64(),
            damping_gain: self.damping_gain.load(Ordering::Relaxed),
            mode: mode_from_code(self.mode.load(Ordering::Relaxed)),
            prediction: prediction_from_code(self.prediction.load(Ordering::Relaxed)),
            scene: scene_from_code(self.scene.load(Ordering::Relaxed)),
            destination_index: self.destination_index.load(Ordering::Relaxed),
            destination_total: self.destination_total.load(Ordering::Relaxed),
            force_field: self.force_field.load(Ordering::Relaxed),
            damping: self.damping.load(Ordering::Relaxed),
            paused: self.is_paused(),
            running: self.lifecycle.is_running(),
            counters: self.counters.snapshot(),
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`SharedState`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySnapshot {
    /// Sphere position.
    pub ball: [f64; 3],
    /// Raw stylus position.
    pub device_position: [f64; 3],
    /// Scaled stylus position.
    pub human_target: [f64; 3],
    /// Guidance target.
    pub guidance_target: [f64; 3],
    /// Alpha-blended target.
    pub negotiated_target: [f64; 3],
    /// Operator share of the attraction.
    pub human_force: [f64; 3],
    /// Guidance share of the attraction.
    pub guidance_force: [f64; 3],
    /// Force last commanded to the stylus.
    pub device_force: [f64; 3],
    /// Operator authority.
    pub alpha: f64,
    /// Sphere velocity damping gain.
    pub damping_gain: f64,
    /// Session mode, once the loop has run.
    pub mode: Option<ControlMode>,
    /// Prediction in force.
    pub prediction: Prediction,
    /// Active scene, once the loop has started.
    pub scene: Option<SceneId>,
    /// Destinations reached.
    pub destination_index: usize,
    /// Destinations in the scene.
    pub destination_total: usize,
    /// Force-field hook.
    pub force_field: bool,
    /// Damping hook.
    pub damping: bool,
    /// Simulation frozen.
    pub paused: bool,
    /// Loop running.
    pub running: bool,
    /// Loop counters.
    pub counters: CounterSnapshot,
}
