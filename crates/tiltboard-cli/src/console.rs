//! Operator console: one command per stdin line.

use std::str::FromStr;

use tiltboard_haptics::scene::UnknownScene;
use tiltboard_haptics::{HapticLoopHandle, SceneId};
use tracing::{info, warn};

/// A parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `1`
    ToggleForceField,
    /// `2`
    ToggleDamping,
    /// `p`
    Pause,
    /// `r`
    Resume,
    /// `scene <n>`
    SelectScene(SceneId),
    /// `q`
    Quit,
}

/// Line that is not a console command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    /// Not a known command word.
    #[error("unknown command '{0}' (expected 1, 2, p, r, scene <n> or q)")]
    Unknown(String),
    /// `scene` without an argument.
    #[error("'scene' needs a scene number or 'sandbox'")]
    MissingScene,
    /// `scene` with an argument that names no scene.
    #[error(transparent)]
    Scene(#[from] UnknownScene),
}

impl FromStr for ConsoleCommand {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        match command {
            "1" => Ok(ConsoleCommand::ToggleForceField),
            "2" => Ok(ConsoleCommand::ToggleDamping),
            "p" | "pause" => Ok(ConsoleCommand::Pause),
            "r" | "resume" => Ok(ConsoleCommand::Resume),
            "q" | "quit" => Ok(ConsoleCommand::Quit),
            "scene" => {
                let arg = words.next().ok_or(ConsoleError::MissingScene)?;
                Ok(ConsoleCommand::SelectScene(arg.parse()?))
            }
            other => Err(ConsoleError::Unknown(other.to_string())),
        }
    }
}

/// Parse a stdin line. Blank lines are ignored.
///
/// # Errors
///
/// Returns [`ConsoleError`] for anything that is not a command.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    line.parse().map(Some)
}

/// Whether the session should keep going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep running.
    Continue,
    /// Operator asked to quit.
    Quit,
}

/// Apply `command` to the running session.
pub fn apply(command: ConsoleCommand, session: &HapticLoopHandle) -> Flow {
    let shared = session.shared();
    match command {
        ConsoleCommand::ToggleForceField => {
            let enabled = shared.toggle_force_field();
            info!(enabled, "force field");
        }
        ConsoleCommand::ToggleDamping => {
            let enabled = shared.toggle_damping();
            info!(enabled, "device damping");
        }
        ConsoleCommand::Pause => {
            shared.pause();
            info!("simulation paused");
        }
        ConsoleCommand::Resume => {
            shared.resume();
            info!("simulation resumed");
        }
        ConsoleCommand::SelectScene(scene) => match session.select_scene(scene) {
            Ok(()) => info!(%scene, "scene requested"),
            Err(e) => warn!(%scene, error = %e, "scene switch not queued"),
        },
        ConsoleCommand::Quit => {
            info!("quit requested from console");
            return Flow::Quit;
        }
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), ConsoleError>;

    #[test]
    fn parse_simple_commands() -> TestResult {
        assert_eq!(parse_line("1")?, Some(ConsoleCommand::ToggleForceField));
        assert_eq!(parse_line(" 2 ")?, Some(ConsoleCommand::ToggleDamping));
        assert_eq!(parse_line("p")?, Some(ConsoleCommand::Pause));
        assert_eq!(parse_line("resume")?, Some(ConsoleCommand::Resume));
        assert_eq!(parse_line("q\n")?, Some(ConsoleCommand::Quit));
        assert_eq!(parse_line("   ")?, None);
        Ok(())
    }

    #[test]
    fn parse_scene_selection() -> TestResult {
        assert_eq!(
            parse_line("scene 2")?,
            Some(ConsoleCommand::SelectScene(SceneId::Scene2))
        );
        assert_eq!(
            parse_line("scene 0")?,
            Some(ConsoleCommand::SelectScene(SceneId::Scene1))
        );
        assert_eq!(
            parse_line("scene sandbox")?,
            Some(ConsoleCommand::SelectScene(SceneId::Sandbox))
        );
        Ok(())
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse_line("scene"), Err(ConsoleError::MissingScene));
        assert!(matches!(parse_line("scene 9"), Err(ConsoleError::Scene(_))));
        let message = parse_line("x").err().map(|e| e.to_string()).unwrap_or_default();
        insta::assert_snapshot!(
            message,
            @"unknown command 'x' (expected 1, 2, p, r, scene <n> or q)"
        );
    }
}
