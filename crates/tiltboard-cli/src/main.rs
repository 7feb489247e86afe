//! tiltboard - headless tilt board session runner
//!
//! Loads the experiment settings, runs the haptic loop on its own thread
//! against the virtual stylus, logs trajectories to CSV and serves the
//! operator console until the scene is completed, the run limit expires,
//! the operator quits or Ctrl+C arrives.

#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod args;
mod console;
mod error;
mod logging;
mod monitor;

use std::future;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tiltboard_haptics::prelude::*;
use tiltboard_telemetry::{CsvTelemetryWriter, ExperimentSettings, FilePredictionSource, TelemetryLayout};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{error, info, warn};

use crate::args::Cli;
use crate::console::Flow;
use crate::monitor::DisplayMonitor;

/// Stylus sweep of the virtual device: slow enough to follow on screen,
/// wide enough to reach every corner of the board after scaling.
const STYLUS_MOTION: Motion = Motion::Lissajous {
    amplitude: 0.025,
    fx: 0.05,
    fy: 0.07,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Finished,
    RunLimit,
    Interrupted,
    Operator,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.verbose, cli.log_json) {
        eprintln!("tiltboard: logging unavailable: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let class = error::classify(&e);
            error!(
                error = %format!("{e:#}"),
                category = ?class.map(|(category, _)| category),
                severity = ?class.map(|(_, severity)| severity),
                "session failed"
            );
            ExitCode::from(error::exit_code(&e))
        }
    }
}

fn build_session(cli: &Cli, settings: &ExperimentSettings) -> Result<HapticLoop> {
    let layout = TelemetryLayout::new(&cli.output_dir, settings);
    let writer = CsvTelemetryWriter::create(&layout)
        .with_context(|| format!("creating telemetry under {}", layout.subject_dir().display()))?;

    let shared = Arc::new(SharedState::with_hooks(OutputOptions {
        force_field: cli.force_field,
        damping: cli.damping,
    }));
    let config = if cli.no_rt {
        LoopConfig::without_rt()
    } else {
        LoopConfig::default()
    };

    let mut haptic = HapticLoop::new(
        Box::new(VirtualDevice::new("virtual-stylus", STYLUS_MOTION)),
        settings.scene().build(),
        ControlArbiter::new(settings.mode),
        shared,
        config,
    )
    .with_telemetry(Box::new(writer));

    if settings.mode == ControlMode::PhysiologyDriven {
        let source = FilePredictionSource::new(layout.prediction_path());
        info!(path = %source.path().display(), "reading physiology predictions");
        haptic = haptic.with_prediction_source(Box::new(source));
    }
    Ok(haptic)
}

/// Resolves on Ctrl+C. The listener is installed on first poll and keeps
/// every signal delivered after that, polled or not. Never resolves if no
/// listener can be installed.
fn interrupt_signal() -> impl Future<Output = ()> {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C unavailable, use the console or the run limit to stop");
            future::pending::<()>().await;
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = ExperimentSettings::load(&cli.settings)
        .with_context(|| format!("loading experiment settings from {}", cli.settings.display()))?;
    info!(
        settings = %settings.to_json(),
        scene = %settings.scene(),
        mode = %settings.mode,
        "experiment settings"
    );

    let session = build_session(&cli, &settings)?.spawn()?;
    let shared = Arc::clone(session.shared());

    let finished = {
        let shared = Arc::clone(&shared);
        tokio::task::spawn_blocking(move || shared.lifecycle().wait_finished(None))
    };
    tokio::pin!(finished);

    let run_limit = cli.duration();
    let deadline = async move {
        match run_limit {
            Some(limit) => sleep(limit).await,
            None => future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let interrupt = interrupt_signal();
    tokio::pin!(interrupt);

    let mut display = interval(cli.display_period());
    display.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut monitor = DisplayMonitor::new(cli.display_hz);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = true;

    let reason = loop {
        tokio::select! {
            _ = &mut finished => break StopReason::Finished,
            () = &mut deadline => break StopReason::RunLimit,
            () = &mut interrupt => break StopReason::Interrupted,
            _ = display.tick() => {
                monitor.refresh(&shared.snapshot());
            }
            line = lines.next_line(), if console_open => match line {
                Ok(Some(line)) => match console::parse_line(&line) {
                    Ok(Some(command)) => {
                        if console::apply(command, &session) == Flow::Quit {
                            break StopReason::Operator;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "console"),
                },
                Ok(None) => {
                    info!("console closed, session keeps running");
                    console_open = false;
                }
                Err(e) => {
                    warn!(error = %e, "console read failed, disabling console");
                    console_open = false;
                }
            },
        }
    };
    info!(?reason, "stopping session");

    session.request_stop();
    let summary = tokio::task::spawn_blocking(move || session.join())
        .await
        .context("joining haptic thread")??;

    info!(
        cycles = summary.cycles,
        completed = summary.completed,
        scene = %summary.scene,
        destinations = summary.destination_index,
        saturation = summary.counters.saturation_ratio(),
        counters = %serde_json::to_string(&summary.counters).unwrap_or_default(),
        "session summary"
    );
    if let Some(jitter) = summary.jitter {
        info!(
            p50_ns = jitter.p50_ns,
            p99_ns = jitter.p99_ns,
            max_ns = jitter.max_ns,
            "haptic timing"
        );
    }
    if summary.counters.telemetry_dropped > 0 {
        warn!(
            dropped = summary.counters.telemetry_dropped,
            "telemetry rows were dropped"
        );
    }
    Ok(())
}
