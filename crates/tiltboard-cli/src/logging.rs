//! Subscriber setup.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose level follows `-v`.
const CRATES: [&str; 5] = [
    "tiltboard",
    "tiltboard_haptics",
    "tiltboard_telemetry",
    "tiltboard_scheduler",
    "tiltboard_errors",
];

fn default_directives(verbose: u8) -> String {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let mut directives = vec!["warn".to_string()];
    directives.extend(CRATES.iter().map(|c| format!("{c}={level}")));
    directives.join(",")
}

/// Install the global subscriber. `RUST_LOG` overrides the `-v` level.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init(verbose: u8, json: bool) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    }
}
