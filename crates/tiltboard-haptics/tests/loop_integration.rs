//! End-to-end tests of the haptic loop against the virtual device.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tiltboard_errors::{DeviceError, RTError, TiltBoardError};
use tiltboard_haptics::prelude::*;
use tiltboard_haptics::{MemorySink, StaticPrediction};

const MS: Duration = Duration::from_millis(1);

/// Upper bound on cycles for an autonomous run through a maze.
const MAZE_CYCLE_LIMIT: usize = 20_000;

fn assemble(
    device: VirtualDevice,
    scene: SceneId,
    mode: ControlMode,
) -> (HapticLoop, Arc<SharedState>) {
    let shared = Arc::new(SharedState::new());
    let haptic = HapticLoop::new(
        Box::new(device),
        scene.build(),
        ControlArbiter::new(mode),
        Arc::clone(&shared),
        LoopConfig::without_rt(),
    );
    (haptic, shared)
}

#[test]
fn read_failures_reuse_previous_sample() -> Result<(), TiltBoardError> {
    let device = VirtualDevice::new("stylus", Motion::Still(Vec3::new(0.01, -0.02, 0.0)));
    let handle = device.handle();
    let (mut haptic, shared) = assemble(device, SceneId::Sandbox, ControlMode::Human);
    haptic.start()?;

    assert_eq!(haptic.step(MS), CycleOutcome::Continue);
    let good = shared.snapshot().device_position;

    handle.fail_next_reads(5);
    for _ in 0..5 {
        assert_eq!(haptic.step(MS), CycleOutcome::Continue);
        assert_eq!(shared.snapshot().device_position, good);
    }
    assert_eq!(haptic.step(MS), CycleOutcome::Continue);

    let counters = shared.snapshot().counters;
    assert_eq!(counters.cycles, 7);
    assert_eq!(counters.device_read_errors, 5);
    assert_eq!(handle.write_count(), 7);
    haptic.finish();
    Ok(())
}

#[test]
fn read_failure_before_any_sample_holds_zero_force() -> Result<(), TiltBoardError> {
    let device = VirtualDevice::new("stylus", Motion::Still(Vec3::new(0.01, -0.02, 0.0)));
    let handle = device.handle();
    let sink = MemorySink::new();
    let (haptic, shared) = assemble(device, SceneId::Scene1, ControlMode::Human);
    let mut haptic = haptic.with_telemetry(Box::new(sink.clone()));
    haptic.start()?;
    let start = haptic.sphere().position;

    handle.fail_next_reads(1);
    assert_eq!(haptic.step(MS), CycleOutcome::NoSample);

    let output = handle.last_output();
    assert_eq!(output.map(|o| o.force), Some(Vec3::zeros()));
    assert_eq!(output.map(|o| o.torque), Some(Vec3::zeros()));
    assert_eq!(haptic.sphere().position, start);
    assert!(sink.events().is_empty());
    let counters = shared.snapshot().counters;
    assert_eq!(counters.cycles, 1);
    assert_eq!(counters.device_read_errors, 1);

    assert_eq!(haptic.step(MS), CycleOutcome::Continue);
    assert_eq!(sink.events().len(), 1);
    let target = shared.snapshot().human_target;
    assert!((target[0] - 0.1).abs() < 1e-12 && (target[1] + 0.2).abs() < 1e-12);
    haptic.finish();
    Ok(())
}

#[test]
fn unplugged_device_drops_held_sample() -> Result<(), TiltBoardError> {
    let device = VirtualDevice::new("stylus", Motion::Still(Vec3::new(0.01, -0.02, 0.0)));
    let handle = device.handle();
    let (mut haptic, shared) = assemble(device, SceneId::Sandbox, ControlMode::Human);
    haptic.start()?;
    assert_eq!(haptic.step(MS), CycleOutcome::Continue);
    let writes = handle.write_count();

    handle.set_connected(false);
    assert_eq!(haptic.step(MS), CycleOutcome::NoSample);
    assert_eq!(haptic.step(MS), CycleOutcome::NoSample);
    assert_eq!(handle.write_count(), writes);

    handle.set_connected(true);
    assert_eq!(haptic.step(MS), CycleOutcome::Continue);
    let counters = shared.snapshot().counters;
    assert_eq!(counters.device_read_errors, 2);
    assert_eq!(counters.device_write_errors, 2);
    haptic.finish();
    Ok(())
}

#[test]
fn write_failures_are_counted_and_skipped() -> Result<(), TiltBoardError> {
    let device = VirtualDevice::still();
    let handle = device.handle();
    let (mut haptic, shared) = assemble(device, SceneId::Sandbox, ControlMode::Shared);
    haptic.start()?;

    handle.fail_next_writes(3);
    for _ in 0..10 {
        assert_eq!(haptic.step(MS), CycleOutcome::Continue);
    }
    assert_eq!(shared.snapshot().counters.device_write_errors, 3);
    assert_eq!(handle.write_count(), 7);
    haptic.finish();
    Ok(())
}

#[test]
fn autonomous_run_completes_scene_and_releases_device() -> Result<(), TiltBoardError> {
    let device = VirtualDevice::still();
    let handle = device.handle();
    let sink = MemorySink::new();
    let (haptic, shared) = assemble(device, SceneId::Scene1, ControlMode::Ideal);
    let mut haptic = haptic.with_telemetry(Box::new(sink.clone()));
    haptic.start()?;
    assert!(handle.is_open());
    assert!(handle.is_calibrated());

    let mut outcome = CycleOutcome::Continue;
    for _ in 0..MAZE_CYCLE_LIMIT {
        outcome = haptic.step(MS);
        if outcome != CycleOutcome::Continue {
            break;
        }
    }
    assert_eq!(outcome, CycleOutcome::SceneComplete);
    assert_eq!(shared.snapshot().alpha, 0.0);

    let summary = haptic.finish();
    assert!(summary.completed);
    assert_eq!(summary.scene, SceneId::Scene1);
    assert_eq!(
        summary.destination_index,
        SceneId::Scene1.build().destinations().len()
    );

    assert!(!handle.is_open());
    assert_eq!(handle.close_count(), 1);
    assert_eq!(handle.last_output(), Some(DeviceOutput::zero()));
    assert!(sink.is_closed());
    assert!(shared.lifecycle().is_finished());

    let samples = sink
        .events()
        .iter()
        .filter(|e| matches!(e, TelemetryEvent::Sample(_)))
        .count();
    assert_eq!(samples as u64, summary.cycles);
    Ok(())
}

#[test]
fn physiology_mode_keeps_rule_when_prediction_missing() -> Result<(), TiltBoardError> {
    let (haptic, shared) = assemble(
        VirtualDevice::still(),
        SceneId::Sandbox,
        ControlMode::PhysiologyDriven,
    );
    let mut haptic = haptic.with_prediction_source(Box::new(StaticPrediction(None)));
    haptic.start()?;
    for _ in 0..100 {
        haptic.step(MS);
    }
    // Initial prediction is Human, so authority keeps rising.
    assert_eq!(haptic.arbiter().prediction(), Prediction::Human);
    assert_eq!(haptic.control_state().authority.millis(), 600);
    assert_eq!(shared.snapshot().counters.prediction_misses, 100);
    haptic.finish();
    Ok(())
}

#[test]
fn physiology_mode_follows_autonomous_prediction() -> Result<(), TiltBoardError> {
    let (haptic, shared) = assemble(
        VirtualDevice::still(),
        SceneId::Sandbox,
        ControlMode::PhysiologyDriven,
    );
    let mut haptic = haptic
        .with_prediction_source(Box::new(StaticPrediction(Some(Prediction::Autonomous))));
    haptic.start()?;
    for _ in 0..200 {
        haptic.step(MS);
    }
    assert_eq!(haptic.control_state().authority.millis(), 300);
    assert_eq!(shared.snapshot().prediction, Prediction::Autonomous);
    assert_eq!(shared.snapshot().counters.prediction_misses, 0);
    haptic.finish();
    Ok(())
}

#[test]
fn prediction_source_ignored_outside_physiology_mode() -> Result<(), TiltBoardError> {
    let (haptic, shared) = assemble(VirtualDevice::still(), SceneId::Sandbox, ControlMode::Shared);
    let mut haptic = haptic.with_prediction_source(Box::new(StaticPrediction(None)));
    haptic.start()?;
    for _ in 0..10 {
        haptic.step(MS);
    }
    assert_eq!(shared.snapshot().counters.prediction_misses, 0);
    haptic.finish();
    Ok(())
}

#[test]
fn full_telemetry_sink_counts_drops() -> Result<(), TiltBoardError> {
    let (haptic, shared) = assemble(VirtualDevice::still(), SceneId::Sandbox, ControlMode::Human);
    let mut haptic = haptic.with_telemetry(Box::new(MemorySink::bounded(4)));
    haptic.start()?;
    for _ in 0..10 {
        assert_eq!(haptic.step(MS), CycleOutcome::Continue);
    }
    let counters = shared.snapshot().counters;
    assert_eq!(counters.telemetry_dropped, 6);
    assert_eq!(counters.last_rt_error(), Some(RTError::BufferOverflow));
    haptic.finish();
    Ok(())
}

#[test]
fn operator_force_is_reflected_and_clipped() -> Result<(), TiltBoardError> {
    // Stylus far from the sphere so the reaction exceeds the device limit.
    let device = VirtualDevice::new("stylus", Motion::Still(Vec3::new(0.5, 0.0, 0.0)))
        .with_specifications(DeviceSpecifications {
            model: "weak".to_string(),
            max_linear_force: 1.0,
            max_linear_damping: 15.0,
            max_angular_damping: 0.04,
            max_gripper_angular_damping: 0.01,
        });
    let handle = device.handle();
    let (mut haptic, shared) = assemble(device, SceneId::Sandbox, ControlMode::Human);
    haptic.start()?;
    haptic.step(MS);

    let force = handle.last_output().map(|o| o.force).unwrap_or_default();
    assert!((force.norm() - 1.0).abs() < 1e-9);
    assert!(force.x < 0.0);
    let counters = shared.snapshot().counters;
    assert_eq!(counters.saturation_count, 1);
    haptic.finish();
    Ok(())
}

#[test]
fn spawned_loop_stops_on_request() -> Result<(), TiltBoardError> {
    let device = VirtualDevice::still();
    let handle = device.handle();
    let (haptic, shared) = assemble(device, SceneId::Scene2, ControlMode::Shared);
    let loop_handle = haptic.spawn()?;

    let deadline = Instant::now() + Duration::from_secs(5);
    while shared.snapshot().counters.cycles < 20 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(shared.snapshot().counters.cycles >= 20);
    assert!(loop_handle.select_scene(SceneId::Scene3).is_ok());

    loop_handle.request_stop();
    assert!(loop_handle.wait_finished(Some(Duration::from_secs(5))));
    assert!(loop_handle.is_finished());

    let summary = loop_handle.join()?;
    assert!(!summary.completed);
    assert!(summary.jitter.is_some());
    assert!(!handle.is_open());
    assert_eq!(handle.close_count(), 1);
    Ok(())
}

#[test]
fn dropping_handle_stops_the_loop() -> Result<(), TiltBoardError> {
    let device = VirtualDevice::still();
    let handle = device.handle();
    let (haptic, shared) = assemble(device, SceneId::Sandbox, ControlMode::Human);
    let loop_handle = haptic.spawn()?;
    thread::sleep(Duration::from_millis(20));
    drop(loop_handle);
    assert!(shared.lifecycle().is_finished());
    assert_eq!(handle.close_count(), 1);
    Ok(())
}

/// Device whose `open` always fails.
struct Unplugged {
    specs: DeviceSpecifications,
}

impl HapticDevice for Unplugged {
    fn name(&self) -> &str {
        "unplugged"
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        Err(DeviceError::not_found("unplugged"))
    }

    fn calibrate(&mut self) -> Result<(), DeviceError> {
        Err(DeviceError::not_open("unplugged"))
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn sample(&mut self) -> Result<DeviceSample, DeviceError> {
        Err(DeviceError::not_open("unplugged"))
    }

    fn apply_force(&mut self, _: Vec3, _: Vec3, _: f64) -> Result<(), DeviceError> {
        Err(DeviceError::not_open("unplugged"))
    }

    fn specifications(&self) -> &DeviceSpecifications {
        &self.specs
    }
}

#[test]
fn failed_open_is_reported_and_waiters_released() -> Result<(), TiltBoardError> {
    let shared = Arc::new(SharedState::new());
    let haptic = HapticLoop::new(
        Box::new(Unplugged {
            specs: DeviceSpecifications {
                model: "none".to_string(),
                max_linear_force: 0.0,
                max_linear_damping: 0.0,
                max_angular_damping: 0.0,
                max_gripper_angular_damping: 0.0,
            },
        }),
        SceneId::Scene1.build(),
        ControlArbiter::new(ControlMode::Shared),
        Arc::clone(&shared),
        LoopConfig::without_rt(),
    );
    let loop_handle = haptic.spawn()?;
    assert!(loop_handle.wait_finished(Some(Duration::from_secs(5))));
    let result = loop_handle.join();
    assert!(matches!(
        result,
        Err(TiltBoardError::Device(DeviceError::NotFound(_)))
    ));
    assert_eq!(shared.snapshot().counters.cycles, 0);
    Ok(())
}
