//! Controlled sphere and its integrator.

use std::time::Duration;

use crate::Vec3;
use crate::constants::{
    GRAVITY_Z, GROUND_LEVEL, K_DAMPING, MAX_DT, SPHERE_MASS, SPHERE_RADIUS, SPHERE_STIFFNESS,
};

/// The sphere steered across the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlledSphere {
    /// Centre position (m).
    pub position: Vec3,
    /// Velocity (m/s).
    pub velocity: Vec3,
    /// Radius (m).
    pub radius: f64,
    /// Mass (kg).
    pub mass: f64,
    /// Ground contact stiffness (N/m).
    pub stiffness: f64,
}

impl ControlledSphere {
    /// Sphere with the default physical properties at rest on the origin.
    pub fn new() -> Self {
        Self::at(Vec3::new(0.0, 0.0, SPHERE_RADIUS))
    }

    /// Sphere at rest at `position`.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::zeros(),
            radius: SPHERE_RADIUS,
            mass: SPHERE_MASS,
            stiffness: SPHERE_STIFFNESS,
        }
    }

    /// Height of the centre when the sphere rests on the board.
    #[inline]
    pub fn ground_offset(&self) -> f64 {
        GROUND_LEVEL + self.radius
    }
}

impl Default for ControlledSphere {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp an integration step to `[0, MAX_DT]` seconds.
///
/// NaN maps to zero.
#[inline]
pub fn clamp_dt(dt: f64) -> f64 {
    if dt.is_nan() { 0.0 } else { dt.clamp(0.0, MAX_DT) }
}

/// Explicit-Euler integration with per-step velocity retention.
#[derive(Debug, Clone, Copy, Default)]
pub struct SphereDynamics;

impl SphereDynamics {
    /// Advance `sphere` by `dt` under `net_force`.
    ///
    /// ```text
    /// a  = F / m + g
    /// v' = K_DAMPING * (v + dt * a)
    /// p' = p + dt * v' + dt² * a
    /// ```
    #[must_use]
    pub fn integrate(sphere: &ControlledSphere, net_force: Vec3, dt: f64) -> ControlledSphere {
        let dt = clamp_dt(dt);
        let acceleration = net_force / sphere.mass + Vec3::new(0.0, 0.0, GRAVITY_Z);
        let velocity = K_DAMPING * (sphere.velocity + dt * acceleration);
        let position = sphere.position + dt * velocity + dt * dt * acceleration;
        ControlledSphere {
            position,
            velocity,
            ..*sphere
        }
    }

    /// [`Self::integrate`] with a [`Duration`] step.
    #[must_use]
    pub fn integrate_for(
        sphere: &ControlledSphere,
        net_force: Vec3,
        dt: Duration,
    ) -> ControlledSphere {
        Self::integrate(sphere, net_force, dt.as_secs_f64())
    }
}
