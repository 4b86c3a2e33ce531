use slotmap::new_key_type;

use crate::mass::MassData;
use crate::types::{Iso, Mat3, Point3, Quat, Vec3};

new_key_type! {
    /// Handle of a rigid body in [`crate::Dynamics`].
    pub struct BodyId;
}

/// Velocity damping: each step the velocity is scaled by `1 - damping` while its magnitude
/// exceeds `threshold`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Damping {
    pub damping: f32,
    pub threshold: f32,
}

impl Damping {
    pub fn new(damping: f32, threshold: f32) -> Self {
        Self { damping, threshold }
    }

    #[inline]
    pub(crate) fn apply(&self, v: &mut Vec3) {
        if self.damping > 0.0 && v.norm() > self.threshold {
            *v *= (1.0 - self.damping).max(0.0);
        }
    }
}

/// A rigid body.
///
/// The pose describes the body origin, which is also its center of rotation. The stored mass
/// distribution's inertia is taken about that origin; its center is kept for reporting.
#[derive(Clone, Debug)]
pub struct Body {
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Accumulated force, consumed by the next step.
    pub force: Vec3,
    /// Accumulated torque, consumed by the next step.
    pub torque: Vec3,
    pub kinematic: bool,
    pub gravity_ignored: bool,
    pub sleep_allowed: bool,
    pub linear_damping: Damping,
    pub angular_damping: Damping,
    awake: bool,
    idle_steps: u32,
    mass: MassData,
    inv_mass: f32,
    inv_inertia: Mat3,
}

impl Body {
    pub fn new(position: Vec3) -> Self {
        let mut body = Self {
            position,
            rotation: Quat::identity(),
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            force: Vec3::zeros(),
            torque: Vec3::zeros(),
            kinematic: false,
            gravity_ignored: false,
            sleep_allowed: true,
            linear_damping: Damping::default(),
            angular_damping: Damping::default(),
            awake: true,
            idle_steps: 0,
            mass: MassData::default(),
            inv_mass: 1.0,
            inv_inertia: Mat3::identity(),
        };
        body.set_mass_data(MassData::default());
        body
    }

    pub fn iso(&self) -> Iso {
        Iso::from_parts(self.position.into(), self.rotation)
    }

    pub fn mass_data(&self) -> &MassData {
        &self.mass
    }

    /// Replace the mass distribution. Non-positive masses are ignored.
    pub fn set_mass_data(&mut self, mass: MassData) {
        if !(mass.mass > 0.0) {
            log::warn!("ignoring non-positive body mass {}", mass.mass);
            return;
        }
        self.inv_mass = 1.0 / mass.mass;
        self.inv_inertia = mass.inertia.try_inverse().unwrap_or_else(Mat3::zeros);
        self.mass = mass;
    }

    /// Rescale to `mass`, keeping the shape of the inertia tensor.
    pub fn set_mass(&mut self, mass: f32) {
        let mut data = self.mass;
        data.adjust(mass);
        self.set_mass_data(data);
    }

    pub fn is_awake(&self) -> bool {
        self.awake
    }

    pub fn set_awake(&mut self, awake: bool) {
        self.awake = awake;
        self.idle_steps = 0;
        if !awake {
            self.linear_velocity = Vec3::zeros();
            self.angular_velocity = Vec3::zeros();
        }
    }

    /// Whether the solver moves this body in response to forces and constraints.
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        !self.kinematic
    }

    /// Inverse mass as seen by the solver: zero for kinematic or sleeping bodies.
    #[inline]
    pub(crate) fn effective_inv_mass(&self) -> f32 {
        if self.kinematic || !self.awake {
            0.0
        } else {
            self.inv_mass
        }
    }

    /// World-space inverse inertia as seen by the solver.
    pub(crate) fn effective_inv_inertia(&self) -> Mat3 {
        if self.kinematic || !self.awake {
            return Mat3::zeros();
        }
        let r = self.rotation.to_rotation_matrix().into_inner();
        r * self.inv_inertia * r.transpose()
    }

    pub fn local_point(&self, world: &Point3) -> Point3 {
        self.iso().inverse_transform_point(world)
    }

    pub fn world_point(&self, local: &Point3) -> Point3 {
        self.iso() * local
    }

    pub fn local_vector(&self, world: &Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(world)
    }

    pub fn world_vector(&self, local: &Vec3) -> Vec3 {
        self.rotation * local
    }

    /// Velocity of a world-space point rigidly attached to the body.
    pub fn point_velocity(&self, world: &Point3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(&(world.coords - self.position))
    }

    pub fn add_force(&mut self, force: &Vec3) {
        self.force += force;
    }

    /// Add `force` applied at world point `at`, producing a torque about the origin.
    pub fn add_force_at(&mut self, force: &Vec3, at: &Point3) {
        self.force += force;
        self.torque += (at.coords - self.position).cross(force);
    }

    pub fn add_torque(&mut self, torque: &Vec3) {
        self.torque += torque;
    }

    /// Track idle time for auto-sleep; returns the consecutive idle step count.
    pub(crate) fn tick_idle(&mut self, linear: f32, angular: f32) -> u32 {
        if self.linear_velocity.norm() < linear && self.angular_velocity.norm() < angular {
            self.idle_steps = self.idle_steps.saturating_add(1);
        } else {
            self.idle_steps = 0;
        }
        self.idle_steps
    }
}
