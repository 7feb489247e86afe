//! Live physiology label read from a file.
//!
//! An external classifier overwrites the file with a single token. The
//! haptic loop polls every cycle; the file is re-read at most once per
//! interval and the last result is returned in between.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tiltboard_haptics::{Prediction, PredictionSource};
use tracing::{debug, info};

/// Minimum time between two reads of the prediction file.
pub const PREDICTION_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// [`PredictionSource`] backed by the classifier's output file.
#[derive(Debug)]
pub struct FilePredictionSource {
    path: PathBuf,
    interval: Duration,
    last_read: Option<Instant>,
    cached: Option<Prediction>,
    available: bool,
    reads: u64,
}

impl FilePredictionSource {
    /// Source reading `path` every [`PREDICTION_POLL_INTERVAL`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            interval: PREDICTION_POLL_INTERVAL,
            last_read: None,
            cached: None,
            available: false,
            reads: 0,
        }
    }

    /// Change the minimum interval between reads. Zero reads every poll.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File reads performed so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    fn read(&mut self) -> Option<Prediction> {
        self.reads = self.reads.saturating_add(1);
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                if !self.available {
                    info!(path = %self.path.display(), "prediction file available");
                    self.available = true;
                }
                text.split_whitespace().next().and_then(Prediction::from_token)
            }
            Err(e) => {
                if self.available || self.reads == 1 {
                    let reason = if e.kind() == io::ErrorKind::NotFound {
                        "missing"
                    } else {
                        "unreadable"
                    };
                    debug!(
                        path = %self.path.display(),
                        error = %e,
                        reason,
                        "prediction file not read, keeping previous label"
                    );
                }
                self.available = false;
                None
            }
        }
    }
}

impl PredictionSource for FilePredictionSource {
    fn poll(&mut self) -> Option<Prediction> {
        let now = Instant::now();
        let due = self
            .last_read
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if due {
            self.last_read = Some(now);
            self.cached = self.read();
        }
        self.cached
    }
}
