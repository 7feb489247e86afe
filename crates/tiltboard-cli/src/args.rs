//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tiltboard_telemetry::DEFAULT_SETTINGS_FILE;

/// Tilt board session runner.
#[derive(Debug, Parser)]
#[command(name = "tiltboard", version)]
#[command(about = "Run a tilt board session with the shared-authority haptic loop")]
#[command(long_about = "
Runs one experiment session: reads the experiment settings, drives the
1 kHz haptic loop on a dedicated thread and writes per-cycle trajectories
as CSV under S<id>/ in the output directory.

Operator console on stdin:
  1          toggle force field
  2          toggle damping
  p / r      pause / resume
  scene <n>  switch scene (1-3 or sandbox)
  q          quit
")]
pub struct Cli {
    /// Experiment settings file
    #[arg(long, env = "TILTBOARD_SETTINGS", default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Directory the S<id>/ tree is written under
    #[arg(long, env = "TILTBOARD_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Display refresh rate of the status monitor
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub display_hz: u32,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Skip real-time priority, memory locking and CPU pinning
    #[arg(long)]
    pub no_rt: bool,

    /// Start with the force field enabled
    #[arg(long)]
    pub force_field: bool,

    /// Start with device damping enabled
    #[arg(long)]
    pub damping: bool,

    /// Log JSON lines instead of text
    #[arg(long)]
    pub log_json: bool,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Interval between two monitor refreshes.
    pub fn display_period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.display_hz.max(1)))
    }

    /// Run limit, if any.
    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["tiltboard"])?;
        assert_eq!(cli.display_hz, 60);
        assert_eq!(cli.duration(), None);
        assert!(!cli.no_rt);
        assert!(!cli.force_field);
        assert!(!cli.damping);
        assert_eq!(cli.verbose, 0);
        Ok(())
    }

    #[test]
    fn parse_full_command_line() -> TestResult {
        let cli = Cli::try_parse_from([
            "tiltboard",
            "--settings",
            "session.txt",
            "--output-dir",
            "/tmp/out",
            "--display-hz",
            "30",
            "--duration-secs",
            "90",
            "--no-rt",
            "--force-field",
            "--damping",
            "--log-json",
            "-vv",
        ])?;
        assert_eq!(cli.settings, PathBuf::from("session.txt"));
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cli.display_hz, 30);
        assert_eq!(cli.duration(), Some(Duration::from_secs(90)));
        assert!(cli.no_rt && cli.force_field && cli.damping && cli.log_json);
        assert_eq!(cli.verbose, 2);
        Ok(())
    }

    #[test]
    fn display_rate_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["tiltboard", "--display-hz", "0"]).is_err());
        assert!(Cli::try_parse_from(["tiltboard", "--display-hz", "5000"]).is_err());
    }

    #[test]
    fn display_period_matches_rate() -> TestResult {
        let cli = Cli::try_parse_from(["tiltboard", "--display-hz", "50"])?;
        assert_eq!(cli.display_period(), Duration::from_millis(20));
        Ok(())
    }
}
