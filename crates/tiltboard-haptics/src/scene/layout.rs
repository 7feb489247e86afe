//! Wall and waypoint layouts of the boards.
//!
//! Boards are 0.6 m square and centred on the origin. Walls are segments in
//! the board plane; heights are ignored.

use std::fmt;

use super::SceneEvent;
use crate::Vec3;
use crate::constants::SPHERE_RADIUS;

/// Half the board side (m).
pub const BOARD_HALF_EXTENT: f64 = 0.3;

/// Half the wall thickness (m).
pub const WALL_HALF_THICKNESS: f64 = 0.005;

/// Stable identifier of a wall within its scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WallId(pub u16);

impl fmt::Display for WallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wall-{}", self.0)
    }
}

/// Straight wall between two points of the board plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    /// Identifier reported in collision events.
    pub id: WallId,
    /// One end (x, y).
    pub start: (f64, f64),
    /// Other end (x, y).
    pub end: (f64, f64),
    /// Half thickness (m).
    pub half_thickness: f64,
}

impl Wall {
    /// Wall of the default thickness.
    pub fn new(id: u16, start: (f64, f64), end: (f64, f64)) -> Self {
        Self {
            id: WallId(id),
            start,
            end,
            half_thickness: WALL_HALF_THICKNESS,
        }
    }

    /// Distance from `point` to the wall centre line, in the board plane.
    pub fn planar_distance(&self, point: &Vec3) -> f64 {
        let (ax, ay) = self.start;
        let (bx, by) = self.end;
        let (dx, dy) = (bx - ax, by - ay);
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq > 0.0 {
            (((point.x - ax) * dx + (point.y - ay) * dy) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (cx, cy) = (ax + t * dx, ay + t * dy);
        (point.x - cx).hypot(point.y - cy)
    }

    /// A sphere of `radius` at `centre` overlaps the wall.
    pub fn touches(&self, centre: &Vec3, radius: f64) -> bool {
        self.planar_distance(centre) < radius + self.half_thickness
    }
}

/// Edge-triggered wall contact: one collision per entry into a wall's band.
#[derive(Debug, Clone, Default)]
pub(crate) struct ContactTracker {
    touching: Vec<bool>,
}

impl ContactTracker {
    pub(crate) fn new(walls: usize) -> Self {
        Self {
            touching: vec![false; walls],
        }
    }

    pub(crate) fn reset(&mut self) {
        self.touching.iter_mut().for_each(|t| *t = false);
    }

    pub(crate) fn update(
        &mut self,
        walls: &[Wall],
        centre: &Vec3,
        radius: f64,
        events: &mut Vec<SceneEvent>,
    ) {
        for (wall, was_touching) in walls.iter().zip(self.touching.iter_mut()) {
            let touching = wall.touches(centre, radius);
            if touching && !*was_touching {
                events.push(SceneEvent::Collision { wall: wall.id });
            }
            *was_touching = touching;
        }
    }
}

/// Walls, start and destinations of one board.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Sphere start position.
    pub start: Vec3,
    /// Destinations in visiting order.
    pub waypoints: Vec<Vec3>,
    /// Walls, border included.
    pub walls: Vec<Wall>,
}

fn on_board(x: f64, y: f64) -> Vec3 {
    Vec3::new(x, y, SPHERE_RADIUS)
}

/// The four border walls, ids 0 to 3.
pub(crate) fn border() -> Vec<Wall> {
    let e = BOARD_HALF_EXTENT;
    vec![
        Wall::new(0, (-e, -e), (e, -e)),
        Wall::new(1, (e, -e), (e, e)),
        Wall::new(2, (e, e), (-e, e)),
        Wall::new(3, (-e, e), (-e, -e)),
    ]
}

impl Layout {
    fn with_inner(start: Vec3, waypoints: Vec<Vec3>, inner: &[((f64, f64), (f64, f64))]) -> Self {
        let mut walls = border();
        let first_id = walls.len() as u16;
        walls.extend(
            inner
                .iter()
                .zip(first_id..)
                .map(|(&(a, b), id)| Wall::new(id, a, b)),
        );
        Self {
            start,
            waypoints,
            walls,
        }
    }

    /// Square loop around a central block.
    pub fn scene1() -> Self {
        Self::with_inner(
            on_board(-0.2, -0.2),
            vec![
                on_board(0.2, -0.2),
                on_board(0.2, 0.2),
                on_board(-0.2, 0.2),
                on_board(-0.2, -0.05),
            ],
            &[
                ((-0.1, -0.1), (0.1, -0.1)),
                ((0.1, -0.1), (0.1, 0.1)),
                ((0.1, 0.1), (-0.1, 0.1)),
                ((-0.1, 0.1), (-0.1, -0.1)),
            ],
        )
    }

    /// Switchback between two walls open on alternate sides.
    pub fn scene2() -> Self {
        Self::with_inner(
            on_board(-0.2, -0.2),
            vec![
                on_board(0.22, -0.2),
                on_board(0.22, 0.0),
                on_board(-0.22, 0.0),
                on_board(-0.22, 0.2),
                on_board(0.2, 0.2),
            ],
            &[((-0.3, -0.1), (0.15, -0.1)), ((-0.15, 0.1), (0.3, 0.1))],
        )
    }

    /// Inward spiral.
    pub fn scene3() -> Self {
        Self::with_inner(
            on_board(-0.25, -0.25),
            vec![
                on_board(0.25, -0.25),
                on_board(0.25, 0.25),
                on_board(-0.25, 0.25),
                on_board(-0.25, -0.1),
                on_board(0.1, -0.1),
                on_board(0.1, 0.1),
                on_board(-0.05, 0.1),
            ],
            &[
                ((-0.175, -0.175), (0.175, -0.175)),
                ((0.175, -0.175), (0.175, 0.175)),
                ((0.175, 0.175), (-0.175, 0.175)),
                ((-0.175, 0.175), (-0.175, -0.025)),
            ],
        )
    }
}
