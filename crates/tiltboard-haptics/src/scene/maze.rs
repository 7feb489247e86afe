//! Tilt-board mazes with ordered destinations.

use tracing::debug;

use super::layout::{ContactTracker, Layout, Wall};
use super::{Scene, SceneEvent, SceneId};
use crate::Vec3;
use crate::dynamics::{ControlledSphere, clamp_dt};

/// Speed at which the guidance target travels toward the next destination
/// (m/s).
pub const GUIDANCE_SPEED: f64 = 0.25;

/// A destination counts as reached within this many sphere radii.
pub const REACH_RADII: f64 = 2.0;

fn planar_distance(a: &Vec3, b: &Vec3) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Maze scene driven by a [`Layout`].
#[derive(Debug, Clone)]
pub struct Maze {
    id: SceneId,
    layout: Layout,
    guidance: Vec3,
    index: usize,
    contacts: ContactTracker,
}

impl Maze {
    /// Maze `id` with the given layout.
    pub fn new(id: SceneId, layout: Layout) -> Self {
        let contacts = ContactTracker::new(layout.walls.len());
        Self {
            id,
            guidance: layout.start,
            index: 0,
            layout,
            contacts,
        }
    }

    fn advance_guidance(&mut self, dt: f64) {
        let Some(target) = self
            .layout
            .waypoints
            .get(self.index)
            .or_else(|| self.layout.waypoints.last())
        else {
            return;
        };
        let delta = target - self.guidance;
        let distance = delta.norm();
        let reach = GUIDANCE_SPEED * clamp_dt(dt);
        if distance <= reach {
            self.guidance = *target;
        } else {
            self.guidance += delta * (reach / distance);
        }
    }
}

impl Scene for Maze {
    fn id(&self) -> SceneId {
        self.id
    }

    fn init(&mut self) {
        self.guidance = self.layout.start;
        self.index = 0;
        self.contacts.reset();
    }

    fn start_position(&self) -> Vec3 {
        self.layout.start
    }

    fn update_haptics(&mut self, sphere: &ControlledSphere, dt: f64, events: &mut Vec<SceneEvent>) {
        self.contacts
            .update(&self.layout.walls, &sphere.position, sphere.radius, events);

        if let Some(destination) = self.layout.waypoints.get(self.index)
            && planar_distance(&sphere.position, destination) < REACH_RADII * sphere.radius
        {
            events.push(SceneEvent::DestinationReached { index: self.index });
            debug!(scene = %self.id, index = self.index, "destination reached");
            self.index += 1;
        }

        self.advance_guidance(dt);
    }

    fn guidance_target(&self) -> Vec3 {
        self.guidance
    }

    fn destinations(&self) -> &[Vec3] {
        &self.layout.waypoints
    }

    fn destination_index(&self) -> usize {
        self.index
    }

    fn walls(&self) -> &[Wall] {
        &self.layout.walls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SPHERE_RADIUS;

    fn sphere_at(x: f64, y: f64) -> ControlledSphere {
        ControlledSphere::at(Vec3::new(x, y, SPHERE_RADIUS))
    }

    #[test]
    fn test_guidance_speed_is_bounded() {
        let mut maze = Maze::new(SceneId::Scene1, Layout::scene1());
        maze.init();
        let start = maze.guidance_target();
        let mut events = Vec::new();
        maze.update_haptics(&sphere_at(-0.2, -0.2), 0.001, &mut events);
        let moved = (maze.guidance_target() - start).norm();
        assert!((moved - GUIDANCE_SPEED * 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_guidance_stops_at_destination() {
        let mut maze = Maze::new(SceneId::Scene1, Layout::scene1());
        maze.init();
        let mut events = Vec::new();
        for _ in 0..5_000 {
            maze.update_haptics(&sphere_at(-0.2, -0.2), 0.001, &mut events);
        }
        assert_eq!(maze.guidance_target(), maze.destinations()[0]);
        assert_eq!(maze.destination_index(), 0);
    }

    #[test]
    fn test_destinations_reached_in_order() {
        let mut maze = Maze::new(SceneId::Scene2, Layout::scene2());
        maze.init();
        let mut events = Vec::new();
        // Standing on the second destination does not skip the first.
        let second = maze.destinations()[1];
        maze.update_haptics(&sphere_at(second.x, second.y), 0.001, &mut events);
        assert_eq!(maze.destination_index(), 0);

        let destinations = maze.destinations().to_vec();
        for d in &destinations {
            maze.update_haptics(&sphere_at(d.x, d.y), 0.001, &mut events);
        }
        assert!(maze.is_complete());
        let reached: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SceneEvent::DestinationReached { index } => Some(*index),
                SceneEvent::Collision { .. } => None,
            })
            .collect();
        assert_eq!(reached, (0..destinations.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_init_resets_progress() {
        let mut maze = Maze::new(SceneId::Scene1, Layout::scene1());
        let d = maze.destinations()[0];
        let mut events = Vec::new();
        maze.update_haptics(&sphere_at(d.x, d.y), 0.001, &mut events);
        assert_eq!(maze.destination_index(), 1);
        maze.init();
        assert_eq!(maze.destination_index(), 0);
        assert_eq!(maze.guidance_target(), maze.start_position());
    }

    #[test]
    fn test_collision_reported_on_wall_entry() {
        let mut maze = Maze::new(SceneId::Scene1, Layout::scene1());
        maze.init();
        let mut events = Vec::new();
        maze.update_haptics(&sphere_at(0.0, -0.105), 0.001, &mut events);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, SceneEvent::Collision { .. }))
        );
    }
}
