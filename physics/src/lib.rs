/*!
Rigid-body orchestration over the `kernel` crate.

A [`Physics`] context creates [`World`]s. A world owns [`Collider`]s (rigid bodies), which carry
[`Shape`]s (collision volumes) and may be linked by [`Joint`]s. Each step the world either resolves
every overlapping shape pair itself or hands control to a caller-supplied resolver, then
integrates.

Handles are reference counted and single-threaded. Every entity can have its kernel data
destroyed explicitly while the handle stays usable for metadata; dropping the last handle does
the same implicitly.

- context:  `Physics` kernel context and `WorldDesc`
- world:    stepping, overlap queries, pair resolution, raycasts, tag filtering
- collider: bodies, materials, tags
- shape:    geometry, offsets, per-shape mass
- joint:    ball, hinge and slider constraints
- tags:     tag names and the symmetric collision mask
- material: friction and restitution combination
*/

mod collider;
mod context;
mod error;
mod joint;
pub mod material;
mod shape;
pub mod tags;
mod world;

pub use collider::{COLLIDER_DESTROYED, Collider};
pub use context::{Physics, WorldDesc};
pub use error::{PhysicsError, PhysicsResult};
pub use joint::{CROSS_WORLD_JOINT, Joint};
pub use shape::Shape;
pub use tags::{TagIndex, TagTable};
pub use world::{WORLD_DESTROYED, World};

pub use kernel::{
    Aabb, JointType, KernelConfig, MassData, MeshError, Point3, ShapeType, Vec3,
};
