use std::f32::consts::PI;
use std::fmt;

use slotmap::new_key_type;

use crate::body::{Body, BodyId};
use crate::types::{Point3, Quat, Vec3};

new_key_type! {
    /// Handle of a persistent joint in [`crate::Dynamics`].
    pub struct JointId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JointType {
    Ball,
    Hinge,
    Slider,
}

impl fmt::Display for JointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JointType::Ball => "ball",
            JointType::Hinge => "hinge",
            JointType::Slider => "slider",
        })
    }
}

/// Lower/upper bounds on a joint coordinate; unbounded by default.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits {
    pub lower: f32,
    pub upper: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            lower: f32::NEG_INFINITY,
            upper: f32::INFINITY,
        }
    }
}

/// Joint frame data, stored in each body's local frame so it follows the bodies.
#[derive(Clone, Debug, PartialEq)]
pub enum JointKind {
    Ball {
        anchor1: Point3,
        anchor2: Point3,
    },
    Hinge {
        anchor1: Point3,
        anchor2: Point3,
        axis1: Vec3,
        axis2: Vec3,
        /// Relative rotation `q1^-1 q2` at zero angle.
        reference: Quat,
        limits: Limits,
    },
    Slider {
        axis1: Vec3,
        /// `q1^-1 (x1 - x2)` at zero position.
        offset: Vec3,
        /// Relative rotation `q1^-1 q2` to hold.
        reference: Quat,
        limits: Limits,
    },
}

/// A persistent constraint between two bodies.
///
/// `bodies` becomes `None` once either body is removed; a detached joint exerts nothing.
#[derive(Clone, Debug)]
pub struct JointConstraint {
    pub bodies: Option<(BodyId, BodyId)>,
    pub kind: JointKind,
}

impl JointConstraint {
    pub fn joint_type(&self) -> JointType {
        match self.kind {
            JointKind::Ball { .. } => JointType::Ball,
            JointKind::Hinge { .. } => JointType::Hinge,
            JointKind::Slider { .. } => JointType::Slider,
        }
    }

    /// Ball joint holding both bodies together at world point `anchor`.
    pub fn ball(b1: &Body, b2: &Body, anchor: &Point3) -> JointKind {
        JointKind::Ball {
            anchor1: b1.local_point(anchor),
            anchor2: b2.local_point(anchor),
        }
    }

    /// Hinge at world point `anchor` rotating about world `axis`; the current pose is angle zero.
    pub fn hinge(b1: &Body, b2: &Body, anchor: &Point3, axis: &Vec3) -> JointKind {
        let axis = unit_or_x(axis);
        JointKind::Hinge {
            anchor1: b1.local_point(anchor),
            anchor2: b2.local_point(anchor),
            axis1: b1.local_vector(&axis),
            axis2: b2.local_vector(&axis),
            reference: relative_rotation(b1, b2),
            limits: Limits::default(),
        }
    }

    /// Slider along world `axis`; the current pose is position zero.
    pub fn slider(b1: &Body, b2: &Body, axis: &Vec3) -> JointKind {
        JointKind::Slider {
            axis1: b1.local_vector(&unit_or_x(axis)),
            offset: b1.local_vector(&(b1.position - b2.position)),
            reference: relative_rotation(b1, b2),
            limits: Limits::default(),
        }
    }

    /// World anchors as seen from each body; they coincide while the joint is satisfied.
    pub fn anchors(&self, b1: &Body, b2: &Body) -> Option<(Point3, Point3)> {
        match &self.kind {
            JointKind::Ball { anchor1, anchor2 } | JointKind::Hinge { anchor1, anchor2, .. } => {
                Some((b1.world_point(anchor1), b2.world_point(anchor2)))
            }
            JointKind::Slider { .. } => None,
        }
    }

    /// World axis, as carried by the first body.
    pub fn axis(&self, b1: &Body) -> Option<Vec3> {
        match &self.kind {
            JointKind::Hinge { axis1, .. } | JointKind::Slider { axis1, .. } => {
                Some(b1.world_vector(axis1))
            }
            JointKind::Ball { .. } => None,
        }
    }

    pub fn limits(&self) -> Option<Limits> {
        match &self.kind {
            JointKind::Hinge { limits, .. } | JointKind::Slider { limits, .. } => Some(*limits),
            JointKind::Ball { .. } => None,
        }
    }

    pub fn limits_mut(&mut self) -> Option<&mut Limits> {
        match &mut self.kind {
            JointKind::Hinge { limits, .. } | JointKind::Slider { limits, .. } => Some(limits),
            JointKind::Ball { .. } => None,
        }
    }

    /// Hinge angle in `[-pi, pi]`, positive when the first body turns about the axis relative to
    /// the second.
    pub fn hinge_angle(&self, b1: &Body, b2: &Body) -> Option<f32> {
        let JointKind::Hinge {
            axis1, reference, ..
        } = &self.kind
        else {
            return None;
        };
        let d = b1.rotation.inverse() * b2.rotation * reference.inverse();
        let q = d.quaternion();
        let angle = -2.0 * q.imag().dot(axis1).atan2(q.w);
        Some(wrap_angle(angle))
    }

    /// Slider displacement along the axis, positive when the first body moves along it.
    pub fn slider_position(&self, b1: &Body, b2: &Body) -> Option<f32> {
        let JointKind::Slider { axis1, offset, .. } = &self.kind else {
            return None;
        };
        let c = b1.position - b2.position - b1.world_vector(offset);
        Some(b1.world_vector(axis1).dot(&c))
    }
}

fn relative_rotation(b1: &Body, b2: &Body) -> Quat {
    b1.rotation.inverse() * b2.rotation
}

fn unit_or_x(v: &Vec3) -> Vec3 {
    v.try_normalize(1.0e-12).unwrap_or_else(Vec3::x)
}

pub(crate) fn wrap_angle(mut a: f32) -> f32 {
    while a > PI {
        a -= 2.0 * PI;
    }
    while a < -PI {
        a += 2.0 * PI;
    }
    a
}
