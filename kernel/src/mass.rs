use crate::types::{Mat3, Point3, Quat, Vec3};

/// Mass distribution of a rigid body or a single shape.
///
/// `inertia` is expressed about the reference origin of the owning frame (not about `center`).
/// Translating or rotating the distribution keeps that convention, so the tensor always matches
/// the frame the shape or body is described in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassData {
    pub center: Point3,
    pub mass: f32,
    pub inertia: Mat3,
}

impl Default for MassData {
    /// Unit mass at the origin with identity inertia.
    fn default() -> Self {
        Self {
            center: Point3::origin(),
            mass: 1.0,
            inertia: Mat3::identity(),
        }
    }
}

/// `|a|^2 E - a a^T`, the inertia contribution of a unit point mass at `a`.
#[inline]
fn point_inertia(a: &Vec3) -> Mat3 {
    Mat3::identity() * a.norm_squared() - a * a.transpose()
}

impl MassData {
    pub fn new(center: Point3, mass: f32, inertia: Mat3) -> Self {
        Self {
            center,
            mass,
            inertia,
        }
    }

    /// Distribution whose inertia is given about its own center of mass.
    ///
    /// Shifts the tensor to the origin with the parallel-axis theorem.
    pub fn from_center_inertia(center: Point3, mass: f32, inertia_com: Mat3) -> Self {
        Self::new(center, mass, inertia_com + point_inertia(&center.coords) * mass)
    }

    /// Move the whole distribution by `t`.
    pub fn translate(&mut self, t: &Vec3) {
        let c = self.center.coords;
        let moved = c + t;
        self.inertia += (point_inertia(&moved) - point_inertia(&c)) * self.mass;
        self.center += *t;
    }

    /// Rotate the distribution about the origin.
    pub fn rotate(&mut self, r: &Quat) {
        let m = r.to_rotation_matrix().into_inner();
        self.inertia = m * self.inertia * m.transpose();
        self.center = r * self.center;
    }

    /// Rescale to `mass`, scaling the inertia in proportion.
    pub fn adjust(&mut self, mass: f32) {
        if self.mass > 0.0 {
            self.inertia *= mass / self.mass;
        }
        self.mass = mass;
    }

    /// Inertia as `[xx, yy, zz, xy, xz, yz]`.
    pub fn packed_inertia(&self) -> [f32; 6] {
        let i = &self.inertia;
        [i[(0, 0)], i[(1, 1)], i[(2, 2)], i[(0, 1)], i[(0, 2)], i[(1, 2)]]
    }

    /// Rebuild a symmetric tensor from `[xx, yy, zz, xy, xz, yz]`.
    pub fn unpack_inertia(p: &[f32; 6]) -> Mat3 {
        Mat3::new(p[0], p[3], p[4], p[3], p[1], p[5], p[4], p[5], p[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn translate_follows_parallel_axis() {
        let mut m = MassData::new(Point3::origin(), 2.0, Mat3::identity());
        m.translate(&Vec3::new(0.0, 0.0, 3.0));
        assert_relative_eq!(m.center, Point3::new(0.0, 0.0, 3.0));
        // 2 * 9 added on x and y only.
        assert_relative_eq!(m.inertia[(0, 0)], 19.0, epsilon = 1.0e-4);
        assert_relative_eq!(m.inertia[(1, 1)], 19.0, epsilon = 1.0e-4);
        assert_relative_eq!(m.inertia[(2, 2)], 1.0, epsilon = 1.0e-4);
    }

    #[test]
    fn translate_twice_equals_translate_sum() {
        let base = MassData::from_center_inertia(Point3::new(1.0, 0.5, 0.0), 3.0, Mat3::identity());
        let mut a = base;
        a.translate(&Vec3::new(1.0, 0.0, 0.0));
        a.translate(&Vec3::new(0.0, -2.0, 1.0));
        let mut b = base;
        b.translate(&Vec3::new(1.0, -2.0, 1.0));
        assert_relative_eq!(a.inertia, b.inertia, epsilon = 1.0e-4);
        assert_relative_eq!(a.center, b.center, epsilon = 1.0e-5);
    }

    #[test]
    fn rotate_swaps_principal_axes() {
        let mut m = MassData::new(Point3::origin(), 1.0, Mat3::from_diagonal(&Vec3::new(1.0, 2.0, 3.0)));
        m.rotate(&Quat::from_axis_angle(&Vec3::z_axis(), FRAC_PI_2));
        assert_relative_eq!(m.inertia[(0, 0)], 2.0, epsilon = 1.0e-5);
        assert_relative_eq!(m.inertia[(1, 1)], 1.0, epsilon = 1.0e-5);
        assert_relative_eq!(m.inertia[(2, 2)], 3.0, epsilon = 1.0e-5);
    }

    #[test]
    fn adjust_scales_inertia() {
        let mut m = MassData::new(Point3::origin(), 2.0, Mat3::identity() * 4.0);
        m.adjust(1.0);
        assert_eq!(m.mass, 1.0);
        assert_relative_eq!(m.inertia, Mat3::identity() * 2.0);
    }

    #[test]
    fn packed_inertia_is_symmetric_round_trip() {
        let p = [1.0, 2.0, 3.0, 0.1, 0.2, 0.3];
        let m = MassData::new(Point3::origin(), 1.0, MassData::unpack_inertia(&p));
        assert_eq!(m.packed_inertia(), p);
        assert_eq!(m.inertia, m.inertia.transpose());
    }
}
