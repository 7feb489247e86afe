//! Physical constants of the tilt board simulation.
//!
//! Lengths are metres in the virtual workspace, masses kilograms, forces
//! newtons.

/// Radius of the controlled sphere.
pub const SPHERE_RADIUS: f64 = 0.007;

/// Mass of the controlled sphere.
pub const SPHERE_MASS: f64 = 0.04;

/// Contact stiffness of the sphere against the ground (N/m).
pub const SPHERE_STIFFNESS: f64 = 100.0;

/// Spring constant pulling the sphere toward its target (N/m).
pub const K_SPRING: f64 = 5.0;

/// Per-step velocity retention of the integrator.
pub const K_DAMPING: f64 = 0.98;

/// Gravity along Z (m/s²).
pub const GRAVITY_Z: f64 = -9.8;

/// Height of the board surface.
pub const GROUND_LEVEL: f64 = 0.0;

/// Largest integration step (s).
pub const MAX_DT: f64 = 0.001;

/// Device-to-workspace position scale.
pub const WORKSPACE_SCALE: f64 = 10.0;

/// Scale applied to the negated attraction force fed back to the operator.
pub const DEVICE_FORCE_SCALE: f64 = 2.0;

/// Force-field stiffness toward the home pose (N/m).
pub const FORCE_FIELD_KP: f64 = 25.0;

/// Force-field rotational stiffness toward the home orientation (Nm/rad).
pub const FORCE_FIELD_KR: f64 = 0.05;
