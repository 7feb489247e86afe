//! Experiment settings file.
//!
//! The file holds five whitespace-separated tokens in order: subject id,
//! sex, age, scene selector and control-mode selector. Anything after the
//! fifth token is ignored.

use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tiltboard_errors::SettingsError;
use tiltboard_haptics::{ControlMode, SceneId};
use tracing::debug;

/// File name looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "ExperimentSettings.txt";

/// Parameters of one experiment session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperimentSettings {
    /// Subject identifier, used in every output path.
    pub subject_id: String,
    /// Subject sex as entered by the experimenter.
    pub sex: String,
    /// Subject age in years.
    pub age: u32,
    /// Raw scene selector, kept for file names.
    pub scene_selector: u8,
    /// Control mode of the session.
    pub mode: ControlMode,
}

impl ExperimentSettings {
    /// Read and parse the settings file at `path`.
    ///
    /// # Errors
    ///
    /// [`SettingsError::NotFound`] if the file does not exist,
    /// [`SettingsError::Io`] if it cannot be read, and the parse errors of
    /// [`ExperimentSettings::parse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                SettingsError::not_found(path)
            } else {
                SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let settings = Self::parse(&text)?;
        debug!(path = %path.display(), subject = %settings.subject_id, "settings loaded");
        Ok(settings)
    }

    /// Parse settings from the file contents.
    ///
    /// # Errors
    ///
    /// [`SettingsError::MissingField`] when the text ends early and
    /// [`SettingsError::InvalidField`] for a non-numeric age or selector, a
    /// scene selector outside `0..=3` or a mode selector outside `1..=4`.
    pub fn parse(text: &str) -> Result<Self, SettingsError> {
        let mut tokens = text.split_whitespace();
        let mut next = |field: &'static str| tokens.next().ok_or(SettingsError::MissingField(field));

        let subject_id = next("subject_id")?.to_string();
        let sex = next("sex")?.to_string();
        let age_token = next("age")?;
        let scene_token = next("scene")?;
        let mode_token = next("control_mode")?;

        let age = age_token
            .parse::<u32>()
            .map_err(|e| SettingsError::invalid("age", age_token, e.to_string()))?;

        let scene_selector = scene_token
            .parse::<u8>()
            .ok()
            .filter(|s| SceneId::from_selector(i64::from(*s)).is_some())
            .ok_or_else(|| SettingsError::invalid("scene", scene_token, "expected 0 to 3"))?;

        let mode = mode_token
            .parse::<i64>()
            .ok()
            .and_then(ControlMode::from_selector)
            .ok_or_else(|| SettingsError::invalid("control_mode", mode_token, "expected 1 to 4"))?;

        Ok(Self {
            subject_id,
            sex,
            age,
            scene_selector,
            mode,
        })
    }

    /// Scene of the session.
    pub fn scene(&self) -> SceneId {
        SceneId::from_selector(i64::from(self.scene_selector)).unwrap_or(SceneId::Scene1)
    }

    /// Common file stem of every stream: `S{id}_{sex}{age}_{scene}_{mode}`.
    pub fn stem(&self) -> String {
        format!(
            "S{}_{}{}_{}_{}",
            self.subject_id,
            self.sex,
            self.age,
            self.scene_selector,
            self.mode.selector()
        )
    }

    /// Settings as one line of JSON, for the startup log.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

impl FromStr for ExperimentSettings {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
