//! On-disk layout of a session's files.
//!
//! Everything lives under `S{id}/` in the output directory, one
//! subdirectory per stream family, with file names built from
//! [`ExperimentSettings::stem`].

use std::fs;
use std::path::{Path, PathBuf};

use tiltboard_errors::TelemetryError;

use crate::settings::ExperimentSettings;

/// Output streams written once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Sphere position, plus collision markers.
    Ball,
    /// Scaled stylus position.
    HumanInput,
    /// Guidance target.
    Guidance,
    /// Alpha-blended target.
    Negotiated,
    /// Operator share of the attraction force.
    HumanForce,
    /// Guidance share of the attraction force.
    GuidanceForce,
}

impl Stream {
    /// Every stream, in file-opening order.
    pub const ALL: [Stream; 6] = [
        Stream::Ball,
        Stream::HumanInput,
        Stream::Guidance,
        Stream::Negotiated,
        Stream::HumanForce,
        Stream::GuidanceForce,
    ];

    fn dir(self) -> &'static str {
        match self {
            Stream::Ball => "ball",
            Stream::HumanInput | Stream::HumanForce => "HIP",
            Stream::Guidance | Stream::GuidanceForce => "CIP",
            Stream::Negotiated => "NIP",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Stream::HumanForce | Stream::GuidanceForce => "_force",
            _ => "",
        }
    }
}

/// Paths of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryLayout {
    subject_dir: PathBuf,
    stem: String,
}

impl TelemetryLayout {
    /// Layout for `settings` under `output_dir`.
    pub fn new(output_dir: impl AsRef<Path>, settings: &ExperimentSettings) -> Self {
        Self {
            subject_dir: output_dir
                .as_ref()
                .join(format!("S{}", settings.subject_id)),
            stem: settings.stem(),
        }
    }

    /// `S{id}` directory.
    pub fn subject_dir(&self) -> &Path {
        &self.subject_dir
    }

    /// Common file stem.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// CSV file of `stream`.
    pub fn stream_path(&self, stream: Stream) -> PathBuf {
        self.subject_dir
            .join(stream.dir())
            .join(format!("{}{}.csv", self.stem, stream.suffix()))
    }

    /// File the physiology classifier writes its label to.
    pub fn prediction_path(&self) -> PathBuf {
        self.subject_dir
            .join("prediction")
            .join(format!("{}_live.csv", self.stem))
    }

    /// Create every directory the session writes to or reads from.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Io`] naming the directory that could not
    /// be created.
    pub fn create_dirs(&self) -> Result<(), TelemetryError> {
        let dirs = ["ball", "HIP", "CIP", "NIP", "prediction"];
        for dir in dirs {
            let path = self.subject_dir.join(dir);
            fs::create_dir_all(&path).map_err(|e| TelemetryError::io(&path, e))?;
        }
        Ok(())
    }
}
