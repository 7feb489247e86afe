//! Experiment files around a tilt board session.
//!
//! - [`ExperimentSettings`]: the five whitespace-separated fields read at
//!   startup
//! - [`TelemetryLayout`]: where each per-subject stream lives on disk
//! - [`FilePredictionSource`]: the live physiology label written by an
//!   external classifier
//! - [`CsvTelemetryWriter`]: a [`TelemetrySink`](tiltboard_haptics::TelemetrySink)
//!   that hands rows to a writer thread and never blocks the haptic loop

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod csv_writer;
pub mod layout;
pub mod prediction_file;
pub mod settings;

pub use csv_writer::{CsvTelemetryWriter, DEFAULT_QUEUE_CAPACITY, WriterStats};
pub use layout::{Stream, TelemetryLayout};
pub use prediction_file::{FilePredictionSource, PREDICTION_POLL_INTERVAL};
pub use settings::{DEFAULT_SETTINGS_FILE, ExperimentSettings};
