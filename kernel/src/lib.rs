/*!
Rigid-body kernel.

Geometry, collision detection and constraint dynamics used by the orchestration layer. Built on
the parry geometry queries re-exported by `rapier3d`. The code is split for clarity:

- types:         math aliases, transforms and AABB helpers
- settings:      tuning constants and tolerances
- config:        `KernelConfig`, the runtime bundle of those constants
- bitmask_flags: small bit sets used for collision masks
- mass:          mass distributions and their transforms
- geometry:      shape primitives, bounding boxes and per-primitive mass
- broad:         multi-level hashed broad phase
- narrow_phase:  contact generation and segment casts
- body / joint:  rigid bodies and persistent joint frames
- solver:        projected Gauss-Seidel rows
- dynamics:      body/joint/contact store and the fixed-step integrator
*/

pub mod bitmask_flags;
pub mod body;
pub mod broad;
pub mod config;
pub mod dynamics;
pub mod geometry;
pub mod joint;
pub mod mass;
pub mod narrow_phase;
pub mod settings;
pub mod solver;
pub mod types;

// Re-export commonly used types and functions.
pub use bitmask_flags::{BitmaskFlags, FlagBitmask, TagBit};
pub use body::{Body, BodyId, Damping};
pub use broad::{GeomId, Space};
pub use config::KernelConfig;
pub use dynamics::{BodyDefaults, ContactJoint, Dynamics};
pub use geometry::{Geometry, MeshError, ShapeType};
pub use joint::{JointConstraint, JointId, JointKind, JointType, Limits};
pub use mass::MassData;
pub use narrow_phase::{ContactBuffer, ContactGeom, RayHit, cast_ray, collide};
pub use types::{
    Aabb, Iso, Mat3, Point3, Quat, Vec3, aabb_empty, aabb_intersects, aabb_union,
    quat_from_angle_axis, quat_to_angle_axis,
};
