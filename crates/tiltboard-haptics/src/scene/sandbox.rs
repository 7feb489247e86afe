//! Free board without destinations.

use super::layout::{ContactTracker, Wall, border};
use super::{Scene, SceneEvent, SceneId};
use crate::Vec3;
use crate::constants::SPHERE_RADIUS;
use crate::dynamics::ControlledSphere;

/// Bordered board; the guidance target rests at the centre.
#[derive(Debug, Clone)]
pub struct Sandbox {
    walls: Vec<Wall>,
    contacts: ContactTracker,
}

impl Sandbox {
    /// Empty board.
    pub fn new() -> Self {
        let walls = border();
        Self {
            contacts: ContactTracker::new(walls.len()),
            walls,
        }
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for Sandbox {
    fn id(&self) -> SceneId {
        SceneId::Sandbox
    }

    fn init(&mut self) {
        self.contacts.reset();
    }

    fn start_position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, SPHERE_RADIUS)
    }

    fn update_haptics(&mut self, sphere: &ControlledSphere, _dt: f64, events: &mut Vec<SceneEvent>) {
        self.contacts
            .update(&self.walls, &sphere.position, sphere.radius, events);
    }

    fn guidance_target(&self) -> Vec3 {
        self.start_position()
    }

    fn destinations(&self) -> &[Vec3] {
        &[]
    }

    fn destination_index(&self) -> usize {
        0
    }

    fn walls(&self) -> &[Wall] {
        &self.walls
    }
}
