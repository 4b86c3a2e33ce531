//! Error types for the physics layer.

use kernel::settings::MAX_TAGS;
use kernel::{JointType, MeshError, ShapeType};
use thiserror::Error;

/// Recoverable errors returned by world, collider, shape and joint operations.
///
/// Caller logic errors that cannot be recovered from (a joint spanning two worlds, using an entity
/// whose kernel data was destroyed) panic instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    /// A tag name that the world was not created with.
    #[error("Unknown tag: {0}")]
    InvalidTag(String),

    /// More tags than a world can hold.
    #[error("Too many tags: {0} (a world holds at most {max})", max = MAX_TAGS)]
    TooManyTags(usize),

    /// The same tag name listed twice.
    #[error("Duplicate tag: {0}")]
    DuplicateTag(String),

    /// Mesh data the kernel cannot build a trimesh from.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(#[from] MeshError),

    /// A type-specific shape operation on the wrong kind of shape.
    #[error("Expected a {expected} shape, found a {found} shape")]
    ShapeTypeMismatch {
        expected: &'static str,
        found: ShapeType,
    },

    /// A type-specific joint operation on the wrong kind of joint.
    #[error("Expected a {expected} joint, found a {found} joint")]
    JointTypeMismatch {
        expected: &'static str,
        found: JointType,
    },
}

/// Result type for physics operations.
pub type PhysicsResult<T> = std::result::Result<T, PhysicsError>;
