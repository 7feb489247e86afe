//! Buffered CSV trajectory writer.
//!
//! The haptic thread hands events to a bounded channel with `try_send`; a
//! dedicated thread owns the six stream files and formats rows as
//! `timestamp_ms, x, y, z`. Collisions go to the ball stream as
//! `timestamp_ms, Collision`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use tiltboard_errors::TelemetryError;
use tiltboard_haptics::telemetry::{TelemetryEvent, TelemetryRecord, TelemetrySink};
use tiltboard_haptics::Vec3;
use tracing::{debug, info, warn};

use crate::layout::{Stream, TelemetryLayout};

/// Rows buffered between the haptic thread and the writer, about four
/// seconds at 1 kHz.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// What the writer thread wrote before it exited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Sample events written (one row per stream each).
    pub samples: u64,
    /// Collision markers written.
    pub collisions: u64,
    /// Rows that failed to write.
    pub write_errors: u64,
}

struct StreamFile {
    path: PathBuf,
    out: BufWriter<File>,
}

impl StreamFile {
    fn create(path: PathBuf) -> Result<Self, TelemetryError> {
        let file = File::create(&path).map_err(|e| TelemetryError::io(&path, e))?;
        Ok(Self {
            path,
            out: BufWriter::new(file),
        })
    }

    fn row(&mut self, timestamp_ms: i64, v: &Vec3) -> Result<(), TelemetryError> {
        writeln!(self.out, "{timestamp_ms}, {}, {}, {}", v.x, v.y, v.z)
            .map_err(|e| TelemetryError::io(&self.path, e))
    }

    fn marker(&mut self, timestamp_ms: i64, label: &str) -> Result<(), TelemetryError> {
        writeln!(self.out, "{timestamp_ms}, {label}").map_err(|e| TelemetryError::io(&self.path, e))
    }

    fn flush(&mut self) -> Result<(), TelemetryError> {
        self.out
            .flush()
            .map_err(|e| TelemetryError::io(&self.path, e))
    }
}

struct StreamFiles {
    ball: StreamFile,
    human_input: StreamFile,
    guidance: StreamFile,
    negotiated: StreamFile,
    human_force: StreamFile,
    guidance_force: StreamFile,
}

impl StreamFiles {
    fn create(layout: &TelemetryLayout) -> Result<Self, TelemetryError> {
        Ok(Self {
            ball: StreamFile::create(layout.stream_path(Stream::Ball))?,
            human_input: StreamFile::create(layout.stream_path(Stream::HumanInput))?,
            guidance: StreamFile::create(layout.stream_path(Stream::Guidance))?,
            negotiated: StreamFile::create(layout.stream_path(Stream::Negotiated))?,
            human_force: StreamFile::create(layout.stream_path(Stream::HumanForce))?,
            guidance_force: StreamFile::create(layout.stream_path(Stream::GuidanceForce))?,
        })
    }

    fn sample(&mut self, r: &TelemetryRecord) -> Result<(), TelemetryError> {
        let ts = r.timestamp_ms;
        self.ball.row(ts, &r.ball)?;
        self.human_input.row(ts, &r.human_input)?;
        self.guidance.row(ts, &r.guidance)?;
        self.negotiated.row(ts, &r.negotiated)?;
        self.human_force.row(ts, &r.human_force)?;
        self.guidance_force.row(ts, &r.guidance_force)
    }

    fn all_mut(&mut self) -> [&mut StreamFile; 6] {
        [
            &mut self.ball,
            &mut self.human_input,
            &mut self.guidance,
            &mut self.negotiated,
            &mut self.human_force,
            &mut self.guidance_force,
        ]
    }
}

fn writer_loop(
    mut files: StreamFiles,
    rx: Receiver<TelemetryEvent>,
) -> Result<WriterStats, TelemetryError> {
    let mut stats = WriterStats::default();
    let mut first_error: Option<TelemetryError> = None;

    for event in rx.iter() {
        let written = match event {
            TelemetryEvent::Sample(record) => {
                stats.samples += 1;
                files.sample(&record)
            }
            TelemetryEvent::Collision { timestamp_ms, wall } => {
                stats.collisions += 1;
                debug!(%wall, "collision marker");
                files.ball.marker(timestamp_ms, "Collision")
            }
        };
        if let Err(e) = written {
            stats.write_errors += 1;
            if first_error.is_none() {
                warn!(error = %e, "telemetry row not written");
                first_error = Some(e);
            }
        }
    }

    for file in files.all_mut() {
        if let Err(e) = file.flush()
            && first_error.is_none()
        {
            first_error = Some(e);
        }
    }

    info!(
        samples = stats.samples,
        collisions = stats.collisions,
        write_errors = stats.write_errors,
        "telemetry writer finished"
    );
    match first_error {
        Some(e) => Err(e),
        None => Ok(stats),
    }
}

/// [`TelemetrySink`] writing the session's CSV streams.
pub struct CsvTelemetryWriter {
    tx: Option<Sender<TelemetryEvent>>,
    worker: Option<JoinHandle<Result<WriterStats, TelemetryError>>>,
    stats: Option<WriterStats>,
}

impl CsvTelemetryWriter {
    /// Create the directories and files of `layout` and start the writer
    /// thread with [`DEFAULT_QUEUE_CAPACITY`].
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Io`] if a directory or file cannot be
    /// created or the thread cannot be spawned.
    pub fn create(layout: &TelemetryLayout) -> Result<Self, TelemetryError> {
        Self::with_capacity(layout, DEFAULT_QUEUE_CAPACITY)
    }

    /// As [`Self::create`] with a custom queue capacity.
    ///
    /// # Errors
    ///
    /// See [`Self::create`].
    pub fn with_capacity(layout: &TelemetryLayout, capacity: usize) -> Result<Self, TelemetryError> {
        layout.create_dirs()?;
        let files = StreamFiles::create(layout)?;
        let (tx, rx) = channel::bounded(capacity.max(1));
        let worker = thread::Builder::new()
            .name("tiltboard-telemetry".to_string())
            .spawn(move || writer_loop(files, rx))
            .map_err(|e| TelemetryError::io(layout.subject_dir(), e))?;
        info!(
            dir = %layout.subject_dir().display(),
            stem = layout.stem(),
            capacity,
            "telemetry writer started"
        );
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            stats: None,
        })
    }

    /// Totals of a closed writer.
    pub fn stats(&self) -> Option<WriterStats> {
        self.stats
    }
}

impl TelemetrySink for CsvTelemetryWriter {
    fn record(&mut self, event: TelemetryEvent) -> bool {
        match self.tx.as_ref().map(|tx| tx.try_send(event)) {
            Some(Ok(())) => true,
            Some(Err(TrySendError::Full(_) | TrySendError::Disconnected(_))) | None => false,
        }
    }

    fn close(&mut self) -> Result<(), TelemetryError> {
        // Dropping the sender ends the writer's receive loop.
        self.tx = None;
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let stats = worker.join().map_err(|_panic| TelemetryError::SinkClosed)??;
        self.stats = Some(stats);
        Ok(())
    }
}

impl Drop for CsvTelemetryWriter {
    fn drop(&mut self) {
        if self.worker.is_some()
            && let Err(e) = self.close()
        {
            warn!(error = %e, "telemetry writer closed with errors");
        }
    }
}
