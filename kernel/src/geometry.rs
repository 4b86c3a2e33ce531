use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;

use rapier3d::parry::shape::{self as ps, Shape as KernelShape};
use thiserror::Error;

use crate::mass::MassData;
use crate::types::{Aabb, Iso, Mat3, Point3, Quat, Vec3};

/// Discriminant of [`Geometry`], used for type-specific accessors and error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Sphere,
    Box,
    Capsule,
    Cylinder,
    Mesh,
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShapeType::Sphere => "sphere",
            ShapeType::Box => "box",
            ShapeType::Capsule => "capsule",
            ShapeType::Cylinder => "cylinder",
            ShapeType::Mesh => "mesh",
        })
    }
}

/// Reasons a triangle mesh is rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("mesh has no vertices or no triangles")]
    Empty,
    #[error("index count {0} is not a multiple of 3")]
    IndexCount(usize),
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("mesh contains non-finite vertex coordinates")]
    NonFinite,
    #[error("every triangle in the mesh is degenerate")]
    Degenerate,
    #[error("trimesh construction failed: {0}")]
    Kernel(String),
}

/// Collision geometry of a shape.
///
/// Parameters follow the public shape API rather than the kernel's half-extent conventions:
/// box sizes are full edge lengths, and capsule/cylinder lengths are measured along the local
/// Z axis (capsule length excludes the hemispherical caps).
#[derive(Clone, Debug)]
pub enum Geometry {
    Sphere { radius: f32 },
    Box { size: Vec3 },
    Capsule { radius: f32, length: f32 },
    Cylinder { radius: f32, length: f32 },
    Mesh(ps::TriMesh),
}

/// Frame turning the kernel's Y-aligned cylinder onto the local Z axis.
#[inline]
fn z_aligned() -> Iso {
    Iso::from_parts(
        Vec3::zeros().into(),
        Quat::from_axis_angle(&Vec3::x_axis(), FRAC_PI_2),
    )
}

impl Geometry {
    /// Validate and copy caller mesh data into a kernel trimesh.
    pub fn mesh(vertices: &[Point3], indices: &[u32]) -> Result<Self, MeshError> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(MeshError::Empty);
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexCount(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        if vertices.iter().any(|v| !v.coords.iter().all(|c| c.is_finite())) {
            return Err(MeshError::NonFinite);
        }

        let triangles: Vec<[u32; 3]> = indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect();
        let has_area = triangles.iter().any(|t| {
            let (a, b, c) = (
                vertices[t[0] as usize],
                vertices[t[1] as usize],
                vertices[t[2] as usize],
            );
            (b - a).cross(&(c - a)).norm_squared() > f32::EPSILON
        });
        if !has_area {
            return Err(MeshError::Degenerate);
        }

        ps::TriMesh::new(vertices.to_vec(), triangles)
            .map(Geometry::Mesh)
            .map_err(|e| MeshError::Kernel(format!("{e:?}")))
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            Geometry::Sphere { .. } => ShapeType::Sphere,
            Geometry::Box { .. } => ShapeType::Box,
            Geometry::Capsule { .. } => ShapeType::Capsule,
            Geometry::Cylinder { .. } => ShapeType::Cylinder,
            Geometry::Mesh(_) => ShapeType::Mesh,
        }
    }

    /// Run `f` with the kernel primitive for this geometry and the pose to query it at.
    ///
    /// `pose` is the shape's world (or local) pose; the pose handed to `f` additionally carries
    /// any frame needed to align the primitive with this geometry's conventions.
    pub fn with_shape<R>(&self, pose: &Iso, f: impl FnOnce(&dyn KernelShape, &Iso) -> R) -> R {
        match self {
            Geometry::Sphere { radius } => f(&ps::Ball::new(*radius), pose),
            Geometry::Box { size } => f(&ps::Cuboid::new(*size * 0.5), pose),
            Geometry::Capsule { radius, length } => {
                f(&ps::Capsule::new_z(*length * 0.5, *radius), pose)
            }
            Geometry::Cylinder { radius, length } => {
                f(&ps::Cylinder::new(*length * 0.5, *radius), &(pose * z_aligned()))
            }
            Geometry::Mesh(mesh) => f(mesh, pose),
        }
    }

    /// World-space bounding box at `pose`.
    pub fn aabb(&self, pose: &Iso) -> Aabb {
        self.with_shape(pose, |shape, iso| shape.compute_aabb(iso))
    }

    /// Mass properties for `density`, in the geometry's own frame.
    ///
    /// Primitives use closed forms centered on the origin; meshes integrate over their triangles
    /// and report inertia about the frame origin.
    pub fn mass(&self, density: f32) -> MassData {
        match self {
            Geometry::Sphere { radius } => {
                let r = *radius;
                let m = 4.0 / 3.0 * PI * r * r * r * density;
                MassData::new(Point3::origin(), m, Mat3::identity() * (0.4 * m * r * r))
            }
            Geometry::Box { size } => {
                let m = size.x * size.y * size.z * density;
                let (x2, y2, z2) = (size.x * size.x, size.y * size.y, size.z * size.z);
                let d = Vec3::new(y2 + z2, x2 + z2, x2 + y2) * (m / 12.0);
                MassData::new(Point3::origin(), m, Mat3::from_diagonal(&d))
            }
            Geometry::Capsule { radius, length } => {
                let (r, l) = (*radius, *length);
                let m1 = PI * r * r * l * density;
                let m2 = 4.0 / 3.0 * PI * r * r * r * density;
                let ia = m1 * (0.25 * r * r + l * l / 12.0)
                    + m2 * (0.4 * r * r + 0.375 * r * l + 0.25 * l * l);
                let iz = (0.5 * m1 + 0.4 * m2) * r * r;
                MassData::new(
                    Point3::origin(),
                    m1 + m2,
                    Mat3::from_diagonal(&Vec3::new(ia, ia, iz)),
                )
            }
            Geometry::Cylinder { radius, length } => {
                let (r, l) = (*radius, *length);
                let m = PI * r * r * l * density;
                let i1 = m * (0.25 * r * r + l * l / 12.0);
                let i3 = 0.5 * m * r * r;
                MassData::new(
                    Point3::origin(),
                    m,
                    Mat3::from_diagonal(&Vec3::new(i1, i1, i3)),
                )
            }
            Geometry::Mesh(mesh) => {
                let props = mesh.mass_properties(density);
                MassData::from_center_inertia(
                    props.local_com,
                    props.mass(),
                    props.reconstruct_inertia_matrix(),
                )
            }
        }
    }
}
