/*!
Core kernel types and math aliases shared by the kernel submodules.

This module intentionally contains no algorithms beyond small conversions. It defines the data
exchanged between:
- geometry (primitive parameters, mass properties)
- broad (hashed space over world-space AABBs)
- narrow_phase (contact points and ray hits)
- dynamics (bodies, joints, transient contacts)

Conventions
- Units are meters, kilograms and seconds.
- Rotations are unit quaternions; the public angle-axis form is `(angle, axis)` in radians.
- Inertia tensors are expressed in the body frame, about the body origin.
*/

use nalgebra as na;

pub use rapier3d::parry::bounding_volume::Aabb;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;
pub type Mat3 = na::Matrix3<f32>;

/// Build a rotation from an angle (radians) around `axis`.
///
/// A zero-length axis yields the identity rotation.
#[inline]
pub fn quat_from_angle_axis(angle: f32, axis: Vec3) -> Quat {
    match na::Unit::try_new(axis, 1.0e-12) {
        Some(axis) => Quat::from_axis_angle(&axis, angle),
        None => Quat::identity(),
    }
}

/// Decompose a rotation into `(angle, axis)`.
///
/// The identity rotation reports an angle of zero around +X.
#[inline]
pub fn quat_to_angle_axis(rotation: &Quat) -> (f32, Vec3) {
    match rotation.axis_angle() {
        Some((axis, angle)) => (angle, axis.into_inner()),
        None => (0.0, Vec3::x()),
    }
}

/// Two unit vectors spanning the plane orthogonal to `n`.
///
/// `n` must be unit length. The returned pair plus `n` form a right-handed orthonormal basis.
pub fn orthonormal_basis(n: &Vec3) -> (Vec3, Vec3) {
    let t1 = if n.x.abs() > 0.57 {
        Vec3::new(n.y, -n.x, 0.0)
    } else {
        Vec3::new(0.0, n.z, -n.y)
    }
    .normalize();
    let t2 = n.cross(&t1);
    (t1, t2)
}

/// Smallest box containing both `a` and `b`.
#[inline]
pub fn aabb_union(a: &Aabb, b: &Aabb) -> Aabb {
    let mins = Point3::new(
        a.mins.x.min(b.mins.x),
        a.mins.y.min(b.mins.y),
        a.mins.z.min(b.mins.z),
    );
    let maxs = Point3::new(
        a.maxs.x.max(b.maxs.x),
        a.maxs.y.max(b.maxs.y),
        a.maxs.z.max(b.maxs.z),
    );
    Aabb { mins, maxs }
}

/// Test two AABBs for intersection (touching boxes intersect).
#[inline]
pub fn aabb_intersects(a: &Aabb, b: &Aabb) -> bool {
    !(a.maxs.x < b.mins.x
        || a.mins.x > b.maxs.x
        || a.maxs.y < b.mins.y
        || a.mins.y > b.maxs.y
        || a.maxs.z < b.mins.z
        || a.mins.z > b.maxs.z)
}

/// The all-zero box reported for bodies without geometry.
#[inline]
pub fn aabb_empty() -> Aabb {
    Aabb {
        mins: Point3::origin(),
        maxs: Point3::origin(),
    }
}
