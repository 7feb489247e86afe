//! Force synthesis for the sphere and the stylus.
//!
//! Everything here is a pure function of its arguments. Non-finite inputs
//! contribute zero instead of propagating NaN into the integrator or the
//! device.

use crate::arbiter::ControlState;
use crate::constants::{DEVICE_FORCE_SCALE, FORCE_FIELD_KP, FORCE_FIELD_KR, K_SPRING};
use crate::device::{DeviceOutput, DeviceSample, DeviceSpecifications};
use crate::dynamics::ControlledSphere;
use crate::{Rot3, Vec3};

/// Unit vector of `v`, or zero for a zero-length or non-finite vector.
#[inline]
pub fn unit_or_zero(v: Vec3) -> Vec3 {
    let norm = v.norm();
    if norm > 0.0 && norm.is_finite() {
        v / norm
    } else {
        Vec3::zeros()
    }
}

#[inline]
fn finite_or_zero(v: Vec3) -> Vec3 {
    if v.iter().all(|c| c.is_finite()) {
        v
    } else {
        Vec3::zeros()
    }
}

/// Spring of stiffness `k` pulling `position` toward `target`.
#[inline]
pub fn spring_force(target: Vec3, position: Vec3, k: f64) -> Vec3 {
    let delta = target - position;
    finite_or_zero(k * delta.norm() * unit_or_zero(delta))
}

/// Board reaction on a sphere whose centre sits at height `z`.
///
/// Zero at or above `ground_offset`, pushing along +Z below it.
#[inline]
pub fn ground_contact_force(z: f64, ground_offset: f64, stiffness: f64) -> Vec3 {
    if z < ground_offset {
        Vec3::new(0.0, 0.0, stiffness * (ground_offset - z))
    } else {
        Vec3::zeros()
    }
}

/// Forces acting on the sphere in one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereForces {
    /// Operator share of the attraction.
    pub human: Vec3,
    /// Guidance share of the attraction.
    pub guidance: Vec3,
    /// Pull toward the negotiated target.
    pub attraction: Vec3,
    /// Board reaction.
    pub ground: Vec3,
    /// Velocity damping.
    pub damping: Vec3,
    /// Sum of the above. Gravity is added by the integrator.
    pub net: Vec3,
}

/// Operator toggles applied to the device output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// Pull the stylus toward its home pose.
    pub force_field: bool,
    /// Damp stylus motion.
    pub damping: bool,
}

/// Gains used for the device output, derived from the device capabilities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceGains {
    /// Force-field stiffness (N/m).
    pub kp: f64,
    /// Force-field rotational stiffness (Nm/rad).
    pub kr: f64,
    /// Linear damping (N·s/m).
    pub kv: f64,
    /// Angular damping (Nm·s/rad).
    pub kvr: f64,
    /// Gripper damping (N·s/rad).
    pub kvg: f64,
    /// Force magnitude limit (N). Zero or less disables clipping.
    pub max_force: f64,
}

impl DeviceGains {
    /// Gains for a device with the given capabilities.
    pub fn from_specs(specs: &DeviceSpecifications) -> Self {
        Self {
            kp: FORCE_FIELD_KP,
            kr: FORCE_FIELD_KR,
            kv: specs.max_linear_damping,
            kvr: specs.max_angular_damping,
            kvg: specs.max_gripper_angular_damping,
            max_force: specs.max_linear_force,
        }
    }
}

/// Force model of the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceModel {
    /// Attraction spring constant (N/m).
    pub k_spring: f64,
    /// Home position of the stylus for the force field.
    pub home_position: Vec3,
    /// Home orientation of the stylus for the force field.
    pub home_rotation: Rot3,
}

impl Default for ForceModel {
    fn default() -> Self {
        Self {
            k_spring: K_SPRING,
            home_position: Vec3::zeros(),
            home_rotation: Rot3::identity(),
        }
    }
}

impl ForceModel {
    /// Forces on `sphere` given both targets and the current control state.
    ///
    /// The operator and guidance shares are weighted by alpha so their sum
    /// is the attraction toward `alpha * human + (1 - alpha) * guidance`.
    pub fn sphere_forces(
        &self,
        sphere: &ControlledSphere,
        human_target: Vec3,
        guidance_target: Vec3,
        control: &ControlState,
    ) -> SphereForces {
        let alpha = control.alpha();
        let human = alpha * spring_force(human_target, sphere.position, self.k_spring);
        let guidance =
            (1.0 - alpha) * spring_force(guidance_target, sphere.position, self.k_spring);
        let attraction = human + guidance;
        let ground =
            ground_contact_force(sphere.position.z, sphere.ground_offset(), sphere.stiffness);
        let damping = finite_or_zero(-control.damping_gain * sphere.velocity);
        SphereForces {
            human,
            guidance,
            attraction,
            ground,
            damping,
            net: attraction + ground + damping,
        }
    }

    /// Output for the stylus, and whether the force had to be clipped.
    pub fn device_output(
        &self,
        sample: &DeviceSample,
        attraction: Vec3,
        options: OutputOptions,
        gains: &DeviceGains,
    ) -> (DeviceOutput, bool) {
        let mut force = finite_or_zero(-DEVICE_FORCE_SCALE * attraction);
        let mut torque = Vec3::zeros();
        let mut gripper_force = 0.0;

        if options.force_field {
            force += finite_or_zero(gains.kp * (self.home_position - sample.position));
            if let Some(rotation) = sample.orientation {
                torque += self.orientation_torque(&rotation, gains.kr);
            }
        }

        if options.damping {
            force -= finite_or_zero(gains.kv * sample.linear_velocity);
            torque -= finite_or_zero(gains.kvr * sample.angular_velocity);
            let gripper = gains.kvg * sample.gripper_angular_velocity;
            if gripper.is_finite() {
                gripper_force -= gripper;
            }
        }

        let mut saturated = false;
        let magnitude = force.norm();
        if gains.max_force > 0.0 && magnitude > gains.max_force {
            force *= gains.max_force / magnitude;
            saturated = true;
        }

        (
            DeviceOutput {
                force,
                torque,
                gripper_force,
            },
            saturated,
        )
    }

    fn orientation_torque(&self, rotation: &Rot3, kr: f64) -> Vec3 {
        let error = rotation.transpose() * self.home_rotation;
        match error.axis_angle() {
            Some((axis, angle)) => finite_or_zero(rotation * (kr * angle * axis.into_inner())),
            None => Vec3::zeros(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::{Authority, ControlMode};

    fn state(alpha: f64, damping: f64) -> ControlState {
        ControlState {
            authority: Authority::from_f64(alpha),
            damping_gain: damping,
            mode: ControlMode::Shared,
        }
    }

    fn gains() -> DeviceGains {
        DeviceGains {
            kp: FORCE_FIELD_KP,
            kr: FORCE_FIELD_KR,
            kv: 10.0,
            kvr: 0.02,
            kvg: 0.01,
            max_force: 8.0,
        }
    }

    #[test]
    fn test_spring_zero_distance_is_zero() {
        let p = Vec3::new(0.1, -0.2, 0.3);
        let f = spring_force(p, p, K_SPRING);
        assert_eq!(f, Vec3::zeros());
        assert!(f.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_spring_is_hookean() {
        let f = spring_force(Vec3::new(0.2, 0.0, 0.0), Vec3::zeros(), K_SPRING);
        assert!((f.x - 1.0).abs() < 1e-12);
        assert_eq!(f.y, 0.0);
    }

    #[test]
    fn test_spring_with_nan_target_is_zero() {
        let f = spring_force(Vec3::new(f64::NAN, 0.0, 0.0), Vec3::zeros(), K_SPRING);
        assert_eq!(f, Vec3::zeros());
    }

    #[test]
    fn test_ground_contact() {
        assert_eq!(ground_contact_force(0.01, 0.007, 100.0), Vec3::zeros());
        assert_eq!(ground_contact_force(0.007, 0.007, 100.0), Vec3::zeros());
        let f = ground_contact_force(0.005, 0.007, 100.0);
        assert!((f.z - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_shares_sum_to_negotiated_attraction() {
        let model = ForceModel::default();
        let sphere = ControlledSphere::new();
        let human = Vec3::new(0.1, 0.05, 0.007);
        let guidance = Vec3::new(-0.2, 0.1, 0.007);
        let control = state(0.3, 0.1);
        let forces = model.sphere_forces(&sphere, human, guidance, &control);

        let negotiated = 0.3 * human + 0.7 * guidance;
        let expected = spring_force(negotiated, sphere.position, K_SPRING);
        assert!((forces.attraction - expected).norm() < 1e-12);
        assert_eq!(forces.attraction, forces.human + forces.guidance);
    }

    #[test]
    fn test_full_authority_ignores_guidance() {
        let model = ForceModel::default();
        let sphere = ControlledSphere::new();
        let forces = model.sphere_forces(
            &sphere,
            Vec3::new(0.1, 0.0, 0.007),
            Vec3::new(-5.0, 5.0, 0.007),
            &state(1.0, 0.1),
        );
        assert_eq!(forces.guidance, Vec3::zeros());
        assert_eq!(forces.human, forces.attraction);
    }

    #[test]
    fn test_damping_opposes_velocity() {
        let model = ForceModel::default();
        let mut sphere = ControlledSphere::new();
        sphere.velocity = Vec3::new(0.5, 0.0, 0.0);
        let forces = model.sphere_forces(&sphere, sphere.position, sphere.position, &state(0.5, 2.0));
        assert_eq!(forces.damping, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_device_force_is_negated_and_scaled() {
        let model = ForceModel::default();
        let sample = DeviceSample::default();
        let (out, saturated) = model.device_output(
            &sample,
            Vec3::new(0.5, 0.0, 0.0),
            OutputOptions::default(),
            &gains(),
        );
        assert!(!saturated);
        assert_eq!(out.force, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(out.torque, Vec3::zeros());
        assert_eq!(out.gripper_force, 0.0);
    }

    #[test]
    fn test_force_field_pulls_home() {
        let model = ForceModel::default();
        let sample = DeviceSample::at_rest(Vec3::new(0.02, 0.0, 0.0));
        let options = OutputOptions {
            force_field: true,
            damping: false,
        };
        let (out, _) = model.device_output(&sample, Vec3::zeros(), options, &gains());
        assert!((out.force.x + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_force_field_torque_restores_orientation() {
        let model = ForceModel::default();
        let mut sample = DeviceSample::default();
        sample.orientation = Some(Rot3::from_axis_angle(&Vec3::z_axis(), 0.2));
        let options = OutputOptions {
            force_field: true,
            damping: false,
        };
        let (out, _) = model.device_output(&sample, Vec3::zeros(), options, &gains());
        assert!((out.torque.z + FORCE_FIELD_KR * 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_damping_terms() {
        let model = ForceModel::default();
        let mut sample = DeviceSample::default();
        sample.linear_velocity = Vec3::new(0.1, 0.0, 0.0);
        sample.angular_velocity = Vec3::new(0.0, 1.0, 0.0);
        sample.gripper_angular_velocity = 2.0;
        let options = OutputOptions {
            force_field: false,
            damping: true,
        };
        let (out, _) = model.device_output(&sample, Vec3::zeros(), options, &gains());
        assert!((out.force.x + 1.0).abs() < 1e-12);
        assert!((out.torque.y + 0.02).abs() < 1e-12);
        assert!((out.gripper_force + 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_force_clipped_to_device_limit() {
        let model = ForceModel::default();
        let (out, saturated) = model.device_output(
            &DeviceSample::default(),
            Vec3::new(0.0, 30.0, 0.0),
            OutputOptions::default(),
            &gains(),
        );
        assert!(saturated);
        assert!((out.force.norm() - 8.0).abs() < 1e-9);
        assert!(out.force.y < 0.0);
    }
}
