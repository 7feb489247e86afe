//! The fixed-period haptic loop.
//!
//! One cycle: sample the stylus, update the arbiter, compute forces,
//! integrate the sphere, advance the scene, command the stylus, publish and
//! record. [`HapticLoop::step`] runs exactly one cycle with an explicit
//! step; [`HapticLoop::run`] drives it from the 1 kHz clock;
//! [`HapticLoop::spawn`] does so on a dedicated thread.
//!
//! Device failures never stop the loop. A failed sample reuses the previous
//! one and a failed command is dropped; both are counted, and the first
//! occurrence and every thousandth are logged.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use tiltboard_errors::{RTError, TiltBoardError};
use tiltboard_scheduler::{HAPTIC_PERIOD_NS, HapticClock, JitterSummary, RtPolicy, Tick};
use tracing::{debug, error, info, warn};

use crate::Vec3;
use crate::arbiter::{ArbiterInputs, ControlArbiter, ControlMode, ControlState};
use crate::constants::WORKSPACE_SCALE;
use crate::counters::{CounterSnapshot, should_log};
use crate::device::{DeviceOutput, DeviceSample, HapticDevice};
use crate::dynamics::{ControlledSphere, SphereDynamics, clamp_dt};
use crate::forces::{DeviceGains, ForceModel};
use crate::inactivity::InactivityDetector;
use crate::prediction::PredictionSource;
use crate::scene::{Scene, SceneEvent, SceneId};
use crate::shared::{CyclePublication, SharedState};
use crate::telemetry::{NullSink, TelemetryEvent, TelemetryRecord, TelemetrySink, now_millis};

/// Scene events expected per cycle before the buffer has to grow.
const EVENT_CAPACITY: usize = 16;

/// Haptic loop settings.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Cycle period in nanoseconds.
    pub period_ns: u64,
    /// Policy applied to the haptic thread by [`HapticLoop::run`].
    pub rt_policy: RtPolicy,
    /// Stylus-to-workspace position scale.
    pub workspace_scale: f64,
    /// Name of the spawned thread.
    pub thread_name: String,
    /// Capacity of the command queue.
    pub command_capacity: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            period_ns: HAPTIC_PERIOD_NS,
            rt_policy: RtPolicy::default(),
            workspace_scale: WORKSPACE_SCALE,
            thread_name: "tiltboard-haptics".to_string(),
            command_capacity: 16,
        }
    }
}

impl LoopConfig {
    /// Default settings without any real-time thread setup.
    pub fn without_rt() -> Self {
        Self {
            rt_policy: RtPolicy::none(),
            ..Self::default()
        }
    }
}

/// Commands applied at the next cycle boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCommand {
    /// Swap the active scene and put the sphere back at its start.
    SelectScene(SceneId),
    /// Stop after the current cycle.
    Shutdown,
}

/// A command could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoopCommandError {
    /// Queue full, retry later.
    #[error("haptic command queue is full")]
    Full,
    /// Loop already gone.
    #[error("haptic loop has stopped")]
    Stopped,
}

impl<T> From<TrySendError<T>> for LoopCommandError {
    fn from(e: TrySendError<T>) -> Self {
        match e {
            TrySendError::Full(_) => LoopCommandError::Full,
            TrySendError::Disconnected(_) => LoopCommandError::Stopped,
        }
    }
}

/// Result of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Cycle ran; keep going.
    Continue,
    /// Simulation frozen; zero force was written.
    Paused,
    /// No stylus sample has been read yet; zero force was written.
    NoSample,
    /// Every destination of the scene has been reached.
    SceneComplete,
    /// Stop requested.
    Stopped,
}

/// What a finished loop reports.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSummary {
    /// Cycles executed.
    pub cycles: u64,
    /// The loop ended because the scene was completed.
    pub completed: bool,
    /// Scene active at the end.
    pub scene: SceneId,
    /// Destinations reached in that scene.
    pub destination_index: usize,
    /// Final counter values.
    pub counters: CounterSnapshot,
    /// Clock jitter, when driven by [`HapticLoop::run`].
    pub jitter: Option<JitterSummary>,
}

/// The haptic loop and everything it owns.
pub struct HapticLoop {
    device: Box<dyn HapticDevice>,
    scene: Box<dyn Scene>,
    arbiter: ControlArbiter,
    shared: Arc<SharedState>,
    config: LoopConfig,
    prediction: Option<Box<dyn PredictionSource>>,
    telemetry: Box<dyn TelemetrySink>,
    commands_tx: Sender<LoopCommand>,
    commands_rx: Receiver<LoopCommand>,
    model: ForceModel,
    gains: DeviceGains,
    sphere: ControlledSphere,
    inactivity: InactivityDetector,
    last_sample: Option<DeviceSample>,
    events: Vec<SceneEvent>,
    started: bool,
    finished: bool,
    completed: bool,
}

impl HapticLoop {
    /// Assemble a loop. Nothing is opened until [`Self::start`].
    pub fn new(
        device: Box<dyn HapticDevice>,
        scene: Box<dyn Scene>,
        arbiter: ControlArbiter,
        shared: Arc<SharedState>,
        config: LoopConfig,
    ) -> Self {
        let (commands_tx, commands_rx) = channel::bounded(config.command_capacity.max(1));
        let gains = DeviceGains::from_specs(device.specifications());
        let sphere = ControlledSphere::at(scene.start_position());
        Self {
            device,
            scene,
            arbiter,
            shared,
            config,
            prediction: None,
            telemetry: Box::new(NullSink),
            commands_tx,
            commands_rx,
            model: ForceModel::default(),
            gains,
            sphere,
            inactivity: InactivityDetector::new(),
            last_sample: None,
            events: Vec::with_capacity(EVENT_CAPACITY),
            started: false,
            finished: false,
            completed: false,
        }
    }

    /// Poll `source` every cycle in physiology-driven mode.
    pub fn with_prediction_source(mut self, source: Box<dyn PredictionSource>) -> Self {
        self.prediction = Some(source);
        self
    }

    /// Record every cycle to `sink`.
    pub fn with_telemetry(mut self, sink: Box<dyn TelemetrySink>) -> Self {
        self.telemetry = sink;
        self
    }

    /// Replace the force model.
    pub fn with_force_model(mut self, model: ForceModel) -> Self {
        self.model = model;
        self
    }

    /// Replace the inactivity detector.
    pub fn with_inactivity_detector(mut self, detector: InactivityDetector) -> Self {
        self.inactivity = detector;
        self
    }

    /// Sender for commands applied at cycle boundaries.
    pub fn command_sender(&self) -> Sender<LoopCommand> {
        self.commands_tx.clone()
    }

    /// Shared state handle.
    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Current sphere state.
    pub fn sphere(&self) -> &ControlledSphere {
        &self.sphere
    }

    /// Current control state.
    pub fn control_state(&self) -> &ControlState {
        self.arbiter.state()
    }

    /// Arbiter, for inspection.
    pub fn arbiter(&self) -> &ControlArbiter {
        &self.arbiter
    }

    /// Active scene.
    pub fn scene(&self) -> &dyn Scene {
        self.scene.as_ref()
    }

    /// Open and calibrate the device, initialise the scene and mark the
    /// session running.
    ///
    /// # Errors
    ///
    /// Returns the device error if opening or calibration fails. The device
    /// is closed again after a failed calibration.
    pub fn start(&mut self) -> Result<(), TiltBoardError> {
        if self.started {
            return Ok(());
        }
        self.device.open()?;
        if let Err(e) = self.device.calibrate() {
            if let Err(close_err) = self.device.close() {
                warn!(error = %close_err, "closing device after failed calibration");
            }
            return Err(e.into());
        }

        let specs = self.device.specifications();
        self.gains = DeviceGains::from_specs(specs);
        info!(
            device = self.device.name(),
            model = %specs.model,
            max_force_n = specs.max_linear_force,
            mode = %self.arbiter.mode(),
            scene = %self.scene.id(),
            "haptic device ready"
        );

        self.reset_scene();
        self.shared.lifecycle().mark_running();
        self.started = true;
        Ok(())
    }

    fn reset_scene(&mut self) {
        self.scene.init();
        self.sphere = ControlledSphere::at(self.scene.start_position());
        self.inactivity.reset();
        self.completed = false;
        self.shared
            .publish_scene(self.scene.id(), self.scene.destinations().len());
    }

    /// Apply queued commands. Returns `false` on shutdown.
    fn process_commands(&mut self) -> bool {
        while let Ok(command) = self.commands_rx.try_recv() {
            match command {
                LoopCommand::SelectScene(id) => {
                    info!(from = %self.scene.id(), to = %id, "switching scene");
                    self.scene = id.build();
                    self.reset_scene();
                }
                LoopCommand::Shutdown => {
                    self.shared.lifecycle().request_stop();
                    return false;
                }
            }
        }
        true
    }

    /// Latest sample, or the previous one after a transient read failure.
    /// `None` until the first successful read and after the device reports
    /// a fault that retrying will not clear.
    fn read_device(&mut self) -> Option<DeviceSample> {
        match self.device.sample() {
            Ok(sample) => self.last_sample = Some(sample),
            Err(e) => {
                let count = self.shared.counters().inc_device_read_error();
                if !e.is_retryable() {
                    if self.last_sample.take().is_some() || should_log(count) {
                        error!(error = %e, count, "device unavailable, holding zero force");
                    }
                } else if should_log(count) {
                    if self.last_sample.is_some() {
                        warn!(error = %e, count, "device read failed, reusing previous sample");
                    } else {
                        warn!(error = %e, count, "device read failed before any sample, holding zero force");
                    }
                }
            }
        }
        self.last_sample
    }

    fn hold_zero_force(&mut self) {
        let zero = DeviceOutput::zero();
        self.write_device(&zero);
        self.shared.publish_device_force(&zero.force);
    }

    fn write_device(&mut self, output: &DeviceOutput) {
        if let Err(e) = self
            .device
            .apply_force(output.force, output.torque, output.gripper_force)
        {
            let count = self.shared.counters().inc_device_write_error();
            if should_log(count) {
                if e.is_retryable() {
                    warn!(error = %e, count, "device write failed");
                } else {
                    error!(error = %e, count, "device rejected force command");
                }
            }
        }
    }

    fn record(&mut self, event: TelemetryEvent) {
        if !self.telemetry.record(event) {
            self.shared.counters().note_rt_error(RTError::BufferOverflow);
            let count = self.shared.counters().inc_telemetry_dropped();
            if should_log(count) {
                warn!(count, "telemetry queue full, dropping rows");
            }
        }
    }

    /// Run one cycle with integration step `dt`, clamped to 1 ms.
    pub fn step(&mut self, dt: Duration) -> CycleOutcome {
        if !self.shared.lifecycle().is_running() || !self.process_commands() {
            return CycleOutcome::Stopped;
        }
        self.shared.counters().inc_cycle();

        let sample = self.read_device();

        if self.shared.is_paused() {
            self.hold_zero_force();
            return CycleOutcome::Paused;
        }
        let Some(sample) = sample else {
            self.hold_zero_force();
            return CycleOutcome::NoSample;
        };

        let dt = clamp_dt(dt.as_secs_f64());
        let human_target = sample.position * self.config.workspace_scale;
        let user_inactive = self.inactivity.update(sample.linear_velocity, dt);

        if self.arbiter.mode() == ControlMode::PhysiologyDriven
            && let Some(source) = self.prediction.as_mut()
        {
            let prediction = source.poll();
            if prediction.is_none() {
                self.shared.counters().inc_prediction_miss();
            }
            self.arbiter.observe_prediction(prediction);
        }

        let control = self.arbiter.update(&ArbiterInputs {
            buttons: sample.buttons,
            user_inactive,
        });

        let guidance_target = self.scene.guidance_target();
        let forces =
            self.model
                .sphere_forces(&self.sphere, human_target, guidance_target, &control);
        self.sphere = SphereDynamics::integrate(&self.sphere, forces.net, dt);

        self.events.clear();
        self.scene.update_haptics(&self.sphere, dt, &mut self.events);

        let (output, saturated) = self.model.device_output(
            &sample,
            forces.attraction,
            self.shared.output_options(),
            &self.gains,
        );
        self.shared.counters().record_saturation(saturated);
        self.write_device(&output);

        let alpha = control.alpha();
        let negotiated = alpha * human_target + (1.0 - alpha) * guidance_target;
        self.shared.publish_cycle(&CyclePublication {
            ball: &self.sphere.position,
            device_position: &sample.position,
            human_target: &human_target,
            guidance_target: &guidance_target,
            negotiated_target: &negotiated,
            human_force: &forces.human,
            guidance_force: &forces.guidance,
            device_force: &output.force,
            control: &control,
            prediction: self.arbiter.prediction(),
            destination_index: self.scene.destination_index(),
        });

        let timestamp_ms = now_millis();
        self.record(TelemetryEvent::Sample(TelemetryRecord {
            timestamp_ms,
            ball: self.sphere.position,
            human_input: human_target,
            guidance: guidance_target,
            negotiated,
            human_force: forces.human,
            guidance_force: forces.guidance,
        }));

        let events = std::mem::take(&mut self.events);
        for &event in &events {
            match event {
                SceneEvent::Collision { wall } => {
                    let count = self.shared.counters().inc_collision();
                    debug!(%wall, count, "collision");
                    self.record(TelemetryEvent::Collision { timestamp_ms, wall });
                }
                SceneEvent::DestinationReached { index } => {
                    info!(
                        scene = %self.scene.id(),
                        index,
                        total = self.scene.destinations().len(),
                        "destination reached"
                    );
                }
            }
        }
        self.events = events;

        if self.scene.is_complete() {
            self.completed = true;
            info!(scene = %self.scene.id(), "all destinations reached");
            return CycleOutcome::SceneComplete;
        }
        CycleOutcome::Continue
    }

    fn note_tick(&self, tick: &Tick) {
        let counters = self.shared.counters();
        if tick.late {
            counters.note_rt_error(RTError::DeadlineMissed);
            let count = counters.inc_late_tick();
            if should_log(count) {
                debug!(count, jitter_ns = tick.jitter_ns, "haptic tick late");
            }
        }
        if tick.timing_violation {
            counters.note_rt_error(RTError::TimingViolation);
            let count = counters.inc_timing_violation();
            if should_log(count) {
                warn!(count, jitter_ns = tick.jitter_ns, "haptic timing violation");
            }
        }
    }

    /// Drive [`Self::step`] from the 1 kHz clock until the scene completes
    /// or a stop is requested, then [`Self::finish`].
    ///
    /// # Errors
    ///
    /// Returns the device error if [`Self::start`] fails. The session is
    /// still marked finished so waiters wake up.
    pub fn run(&mut self) -> Result<LoopSummary, TiltBoardError> {
        if let Err(e) = self.start() {
            error!(error = %e, "haptic loop failed to start");
            self.shared.lifecycle().mark_finished();
            self.finished = true;
            return Err(e);
        }

        if let Err(e) = self.config.rt_policy.apply_to_current_thread() {
            self.shared.counters().note_rt_error(e);
            warn!(error = %e, "running haptic loop without real-time setup");
        }

        let mut clock = HapticClock::with_period(self.config.period_ns);
        let fallback = Duration::from_nanos(self.config.period_ns);
        clock.restart();
        info!(period_ns = self.config.period_ns, "haptic loop running");

        loop {
            let dt = match clock.wait() {
                Ok(tick) => {
                    self.note_tick(&tick);
                    tick.interval
                }
                Err(e) => {
                    self.shared.counters().note_rt_error(e);
                    let count = self.shared.counters().inc_timing_violation();
                    if should_log(count) {
                        warn!(error = %e, count, "haptic clock sleep failed");
                    }
                    fallback
                }
            };
            match self.step(dt) {
                CycleOutcome::Continue | CycleOutcome::Paused | CycleOutcome::NoSample => {}
                CycleOutcome::SceneComplete | CycleOutcome::Stopped => break,
            }
        }

        let jitter = clock.jitter_mut().summary();
        Ok(self.finish_with(Some(jitter)))
    }

    /// Close telemetry, zero and close the device, then signal completion.
    /// Safe to call more than once.
    pub fn finish(&mut self) -> LoopSummary {
        self.finish_with(None)
    }

    fn finish_with(&mut self, jitter: Option<JitterSummary>) -> LoopSummary {
        if !self.finished {
            self.finished = true;
            if let Err(e) = self.telemetry.close() {
                warn!(error = %e, "closing telemetry");
            }
            if self.started {
                if let Err(e) = self
                    .device
                    .apply_force(Vec3::zeros(), Vec3::zeros(), 0.0)
                {
                    debug!(error = %e, "zeroing device before close");
                }
                if let Err(e) = self.device.close() {
                    warn!(error = %e, "closing device");
                }
            }
            self.shared.lifecycle().mark_finished();
        }

        let summary = LoopSummary {
            cycles: self.shared.counters().snapshot().cycles,
            completed: self.completed,
            scene: self.scene.id(),
            destination_index: self.scene.destination_index(),
            counters: self.shared.counters().snapshot(),
            jitter,
        };
        info!(
            cycles = summary.cycles,
            completed = summary.completed,
            read_errors = summary.counters.device_read_errors,
            write_errors = summary.counters.device_write_errors,
            telemetry_dropped = summary.counters.telemetry_dropped,
            "haptic loop finished"
        );
        summary
    }

    /// Run on a dedicated thread named after [`LoopConfig::thread_name`].
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the thread cannot be created.
    pub fn spawn(self) -> Result<HapticLoopHandle, TiltBoardError> {
        let shared = Arc::clone(&self.shared);
        let commands = self.command_sender();
        let name = self.config.thread_name.clone();
        let guard_shared = Arc::clone(&shared);
        let thread = thread::Builder::new().name(name.clone()).spawn(move || {
            let _finished = FinishGuard(guard_shared);
            let mut haptic = self;
            haptic.run()
        })?;
        Ok(HapticLoopHandle {
            shared,
            commands,
            name,
            thread: Some(thread),
        })
    }
}

/// Marks the session finished even if the haptic thread unwinds.
struct FinishGuard(Arc<SharedState>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        if !self.0.lifecycle().is_finished() {
            self.0.lifecycle().mark_finished();
        }
    }
}

/// Owner side of a spawned [`HapticLoop`].
///
/// Dropping the handle stops the loop and joins the thread.
pub struct HapticLoopHandle {
    shared: Arc<SharedState>,
    commands: Sender<LoopCommand>,
    name: String,
    thread: Option<JoinHandle<Result<LoopSummary, TiltBoardError>>>,
}

impl HapticLoopHandle {
    /// Shared state of the session.
    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Ask the loop to stop at the top of its next cycle.
    pub fn request_stop(&self) {
        self.shared.lifecycle().request_stop();
        if self.commands.try_send(LoopCommand::Shutdown).is_err() {
            debug!("shutdown command not queued, relying on the stop flag");
        }
    }

    /// Switch scenes at the next cycle boundary.
    ///
    /// # Errors
    ///
    /// Fails if the queue is full or the loop has exited.
    pub fn select_scene(&self, scene: SceneId) -> Result<(), LoopCommandError> {
        Ok(self.commands.try_send(LoopCommand::SelectScene(scene))?)
    }

    /// Block until the loop has released its resources, or `timeout`
    /// elapses. Returns whether it finished.
    pub fn wait_finished(&self, timeout: Option<Duration>) -> bool {
        self.shared.lifecycle().wait_finished(timeout)
    }

    /// Loop has released its resources.
    pub fn is_finished(&self) -> bool {
        self.shared.lifecycle().is_finished()
    }

    /// Wait for the thread and return its summary.
    ///
    /// # Errors
    ///
    /// Returns the loop's start-up error, or
    /// [`TiltBoardError::ThreadPanicked`] if the thread panicked.
    pub fn join(mut self) -> Result<LoopSummary, TiltBoardError> {
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_panic| TiltBoardError::ThreadPanicked(self.name.clone()))?,
            None => Err(TiltBoardError::ThreadPanicked(self.name.clone())),
        }
    }
}

impl Drop for HapticLoopHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.request_stop();
            if thread.join().is_err() {
                error!(thread = %self.name, "haptic thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Buttons;
    use crate::telemetry::MemorySink;
    use crate::virtual_device::VirtualDevice;

    const MS: Duration = Duration::from_millis(1);

    fn build(mode: ControlMode, scene: SceneId) -> (HapticLoop, Arc<SharedState>) {
        let shared = Arc::new(SharedState::new());
        let haptic = HapticLoop::new(
            Box::new(VirtualDevice::still()),
            scene.build(),
            ControlArbiter::new(mode),
            Arc::clone(&shared),
            LoopConfig::without_rt(),
        );
        (haptic, shared)
    }

    #[test]
    fn test_step_before_start_is_stopped() {
        let (mut haptic, _) = build(ControlMode::Shared, SceneId::Sandbox);
        assert_eq!(haptic.step(MS), CycleOutcome::Stopped);
    }

    #[test]
    fn test_step_publishes_and_records() -> Result<(), TiltBoardError> {
        let sink = MemorySink::new();
        let (haptic, shared) = build(ControlMode::Human, SceneId::Sandbox);
        let mut haptic = haptic.with_telemetry(Box::new(sink.clone()));
        haptic.start()?;
        for _ in 0..10 {
            assert_eq!(haptic.step(MS), CycleOutcome::Continue);
        }
        let snap = shared.snapshot();
        assert_eq!(snap.counters.cycles, 10);
        assert_eq!(snap.alpha, 1.0);
        assert_eq!(snap.mode, Some(ControlMode::Human));
        assert_eq!(sink.events().len(), 10);

        let summary = haptic.finish();
        assert!(sink.is_closed());
        assert_eq!(summary.cycles, 10);
        assert!(!summary.completed);
        Ok(())
    }

    #[test]
    fn test_shutdown_command() -> Result<(), TiltBoardError> {
        let (mut haptic, shared) = build(ControlMode::Shared, SceneId::Sandbox);
        haptic.start()?;
        assert!(haptic.command_sender().send(LoopCommand::Shutdown).is_ok());
        assert_eq!(haptic.step(MS), CycleOutcome::Stopped);
        assert!(!shared.lifecycle().is_running());
        Ok(())
    }

    #[test]
    fn test_scene_switch_resets_sphere() -> Result<(), TiltBoardError> {
        let (mut haptic, shared) = build(ControlMode::Shared, SceneId::Sandbox);
        haptic.start()?;
        haptic.step(MS);
        assert!(
            haptic
                .command_sender()
                .send(LoopCommand::SelectScene(SceneId::Scene2))
                .is_ok()
        );
        haptic.step(MS);
        assert_eq!(haptic.scene().id(), SceneId::Scene2);
        assert_eq!(shared.snapshot().scene, Some(SceneId::Scene2));
        assert_eq!(shared.snapshot().destination_total, 5);
        let start = haptic.scene().start_position();
        assert!((haptic.sphere().position - start).norm() < 0.01);
        Ok(())
    }

    #[test]
    fn test_pause_freezes_sphere_and_arbiter() -> Result<(), TiltBoardError> {
        let device = VirtualDevice::still();
        let handle = device.handle();
        let shared = Arc::new(SharedState::new());
        let mut haptic = HapticLoop::new(
            Box::new(device),
            SceneId::Sandbox.build(),
            ControlArbiter::new(ControlMode::Shared),
            Arc::clone(&shared),
            LoopConfig::without_rt(),
        );
        haptic.start()?;
        handle.set_buttons(Buttons::NONE.with(0, true));
        haptic.step(MS);
        let before = (*haptic.sphere(), *haptic.control_state());

        shared.pause();
        for _ in 0..5 {
            assert_eq!(haptic.step(MS), CycleOutcome::Paused);
        }
        assert_eq!((*haptic.sphere(), *haptic.control_state()), before);
        assert_eq!(handle.last_output(), Some(DeviceOutput::zero()));

        shared.resume();
        assert_eq!(haptic.step(MS), CycleOutcome::Continue);
        assert_eq!(haptic.control_state().authority.millis(), 502);
        Ok(())
    }

    #[test]
    fn test_finish_is_idempotent() -> Result<(), TiltBoardError> {
        let device = VirtualDevice::still();
        let handle = device.handle();
        let shared = Arc::new(SharedState::new());
        let mut haptic = HapticLoop::new(
            Box::new(device),
            SceneId::Sandbox.build(),
            ControlArbiter::new(ControlMode::Ideal),
            shared,
            LoopConfig::without_rt(),
        );
        haptic.start()?;
        haptic.finish();
        haptic.finish();
        assert_eq!(handle.close_count(), 1);
        Ok(())
    }
}
