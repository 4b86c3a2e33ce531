use rapier3d::parry::query::{
    ContactManifold, DefaultQueryDispatcher, PersistentQueryDispatcher, Ray,
};
use smallvec::SmallVec;

use crate::geometry::Geometry;
use crate::settings::MAX_CONTACTS;
use crate::types::{Iso, Point3, Vec3};

/// One contact point between two shapes, in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactGeom {
    /// Midpoint between the two surfaces.
    pub position: Point3,
    /// Unit normal pointing from the first shape towards the second.
    pub normal: Vec3,
    /// Penetration depth (non-negative).
    pub depth: f32,
}

pub type ContactBuffer = SmallVec<[ContactGeom; MAX_CONTACTS]>;

/// A ray hit against one shape, in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub point: Point3,
    /// Outward surface normal at `point`.
    pub normal: Vec3,
    /// Fraction of the segment travelled before the hit, in `[0, 1]`.
    pub fraction: f32,
}

/// Generate at most `max_contacts` penetrating contact points between two posed geometries.
///
/// Points are ordered deepest first. Pairs the kernel has no algorithm for yield no contacts.
pub fn collide(
    geom1: &Geometry,
    pose1: &Iso,
    geom2: &Geometry,
    pose2: &Iso,
    max_contacts: usize,
) -> ContactBuffer {
    let max_contacts = max_contacts.min(MAX_CONTACTS);
    let mut out = ContactBuffer::new();
    if max_contacts == 0 {
        return out;
    }

    geom1.with_shape(pose1, |shape1, iso1| {
        geom2.with_shape(pose2, |shape2, iso2| {
            let pos12 = iso1.inv_mul(iso2);
            let mut manifolds: Vec<ContactManifold<(), ()>> = Vec::new();
            let mut workspace = None;
            if DefaultQueryDispatcher
                .contact_manifolds(&pos12, shape1, shape2, 0.0, &mut manifolds, &mut workspace)
                .is_err()
            {
                log::trace!(
                    "no contact algorithm for {} / {}",
                    geom1.shape_type(),
                    geom2.shape_type()
                );
                return;
            }

            let mut all: Vec<ContactGeom> = Vec::new();
            for manifold in &manifolds {
                let frame1 = iso1 * manifold.subshape_pos1.unwrap_or_else(Iso::identity);
                let frame2 = iso2 * manifold.subshape_pos2.unwrap_or_else(Iso::identity);
                let normal = frame1 * manifold.local_n1;
                if normal.norm_squared() < 0.5 {
                    continue;
                }
                for point in manifold.points.iter().filter(|p| p.dist <= 0.0) {
                    let p1 = frame1 * point.local_p1;
                    let p2 = frame2 * point.local_p2;
                    all.push(ContactGeom {
                        position: na_midpoint(&p1, &p2),
                        normal,
                        depth: -point.dist,
                    });
                }
            }

            all.sort_by(|a, b| b.depth.total_cmp(&a.depth));
            out.extend(all.into_iter().take(max_contacts));
        })
    });

    out
}

#[inline]
fn na_midpoint(a: &Point3, b: &Point3) -> Point3 {
    Point3::from((a.coords + b.coords) * 0.5)
}

/// Intersect the finite segment `start..end` with a posed geometry.
///
/// Rays starting inside a shape report the exit point.
pub fn cast_ray(geom: &Geometry, pose: &Iso, start: &Point3, end: &Point3) -> Option<RayHit> {
    let dir = end - start;
    if dir.norm_squared() <= f32::EPSILON * f32::EPSILON {
        return None;
    }
    let ray = Ray::new(*start, dir);
    geom.with_shape(pose, |shape, iso| {
        shape
            .cast_ray_and_get_normal(iso, &ray, 1.0, false)
            .map(|hit| RayHit {
                point: ray.point_at(hit.time_of_impact),
                normal: hit.normal,
                fraction: hit.time_of_impact,
            })
    })
}
