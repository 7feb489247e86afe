//! Scenes the sphere moves through.
//!
//! The haptic loop only needs a handful of capabilities from a scene: where
//! the sphere starts, where the guidance controller wants it, which
//! destinations remain, and which walls it touched. Rendering lives
//! elsewhere.

mod layout;
mod maze;
mod sandbox;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::Vec3;
use crate::dynamics::ControlledSphere;

pub use layout::{BOARD_HALF_EXTENT, Layout, WALL_HALF_THICKNESS, Wall, WallId};
pub use maze::{GUIDANCE_SPEED, Maze, REACH_RADII};
pub use sandbox::Sandbox;

/// Something that happened in the scene during one haptic update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneEvent {
    /// The sphere entered the contact band of a wall.
    Collision {
        /// Wall that was hit.
        wall: WallId,
    },
    /// The sphere reached a destination; `index` is the one just reached.
    DestinationReached {
        /// Index into [`Scene::destinations`].
        index: usize,
    },
}

/// Available scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SceneId {
    /// Free board without destinations.
    Sandbox,
    /// Loop around a central block.
    Scene1,
    /// Switchback between two offset walls.
    Scene2,
    /// Inward spiral.
    Scene3,
}

impl SceneId {
    /// Scene for a settings selector. Selectors 0 and 1 both pick
    /// [`SceneId::Scene1`].
    pub fn from_selector(selector: i64) -> Option<Self> {
        match selector {
            0 | 1 => Some(SceneId::Scene1),
            2 => Some(SceneId::Scene2),
            3 => Some(SceneId::Scene3),
            _ => None,
        }
    }

    /// Instantiate the scene.
    pub fn build(self) -> Box<dyn Scene> {
        match self {
            SceneId::Sandbox => Box::new(Sandbox::new()),
            SceneId::Scene1 => Box::new(Maze::new(self, Layout::scene1())),
            SceneId::Scene2 => Box::new(Maze::new(self, Layout::scene2())),
            SceneId::Scene3 => Box::new(Maze::new(self, Layout::scene3())),
        }
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SceneId::Sandbox => "sandbox",
            SceneId::Scene1 => "scene1",
            SceneId::Scene2 => "scene2",
            SceneId::Scene3 => "scene3",
        })
    }
}

/// Unknown scene name or selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scene '{0}'")]
pub struct UnknownScene(pub String);

impl FromStr for SceneId {
    type Err = UnknownScene;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("sandbox") {
            return Ok(SceneId::Sandbox);
        }
        let digits = s
            .strip_prefix("scene")
            .or_else(|| s.strip_prefix("Scene"))
            .unwrap_or(s);
        digits
            .parse::<i64>()
            .ok()
            .and_then(SceneId::from_selector)
            .ok_or_else(|| UnknownScene(s.to_string()))
    }
}

/// Capabilities the haptic loop needs from a scene.
pub trait Scene: Send {
    /// Which scene this is.
    fn id(&self) -> SceneId;

    /// Reset progress. Called before the first cycle and on every scene
    /// switch.
    fn init(&mut self);

    /// Where the sphere is placed on init.
    fn start_position(&self) -> Vec3;

    /// Advance scene state after the sphere moved. Events are appended to
    /// `events`, which the caller clears.
    fn update_haptics(&mut self, sphere: &ControlledSphere, dt: f64, events: &mut Vec<SceneEvent>);

    /// Adapt to a new viewport.
    fn update_graphics(&mut self, _width: u32, _height: u32) {}

    /// Where the guidance controller pulls the sphere.
    fn guidance_target(&self) -> Vec3;

    /// Ordered destinations.
    fn destinations(&self) -> &[Vec3];

    /// Index of the next destination; equals `destinations().len()` once all
    /// are reached.
    fn destination_index(&self) -> usize;

    /// All destinations reached. A scene without destinations never
    /// completes.
    fn is_complete(&self) -> bool {
        let total = self.destinations().len();
        total > 0 && self.destination_index() >= total
    }

    /// Static walls.
    fn walls(&self) -> &[Wall];
}
