use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use kernel::{
    Aabb, BodyId, Dynamics, GeomId, Geometry, Iso, MassData, Point3, RayHit, ShapeType, Vec3,
    aabb_empty, quat_from_angle_axis, quat_to_angle_axis,
};

use crate::collider::{Collider, ColliderCell};
use crate::error::{PhysicsError, PhysicsResult};
use crate::world::{Teardown, World, WorldCell};

/// A collision volume. Clones share the same shape.
///
/// A shape is attached to at most one collider at a time. Its pose is an offset from the
/// collider's body frame.
#[derive(Clone)]
pub struct Shape(pub(crate) Rc<ShapeCell>);

pub(crate) struct ShapeCell {
    kind: ShapeType,
    pub(crate) state: RefCell<ShapeState>,
}

pub(crate) struct ShapeState {
    /// `None` once destroyed.
    pub geometry: Option<Geometry>,
    pub offset: Iso,
    pub enabled: bool,
    pub user_data: Option<Rc<dyn Any>>,
    pub attachment: Option<Attachment>,
}

/// Where an attached shape lives: its collider, that collider's world, body and space slot.
pub(crate) struct Attachment {
    pub collider: Weak<ColliderCell>,
    pub world: Weak<WorldCell>,
    pub body: BodyId,
    pub geom: GeomId,
}

impl ShapeCell {
    pub(crate) fn body(&self) -> Option<BodyId> {
        let state = self.state.try_borrow().ok()?;
        state.attachment.as_ref().map(|a| a.body)
    }

    /// World pose of an attached, live shape.
    fn posed<'a>(state: &'a ShapeState, dynamics: &Dynamics) -> Option<(&'a Geometry, Iso)> {
        let geometry = state.geometry.as_ref()?;
        let body = dynamics.body(state.attachment.as_ref()?.body)?;
        Some((geometry, body.iso() * state.offset))
    }

    /// Broad-phase box, or `None` when the shape should be left out (disabled or detached).
    pub(crate) fn world_aabb(&self, dynamics: &Dynamics) -> Option<Aabb> {
        let state = self.state.try_borrow().ok()?;
        if !state.enabled {
            return None;
        }
        let (geometry, pose) = Self::posed(&state, dynamics)?;
        Some(geometry.aabb(&pose))
    }

    pub(crate) fn cast_ray(
        &self,
        dynamics: &Dynamics,
        start: &Point3,
        end: &Point3,
    ) -> Option<RayHit> {
        let state = self.state.try_borrow().ok()?;
        if !state.enabled {
            return None;
        }
        let (geometry, pose) = Self::posed(&state, dynamics)?;
        kernel::cast_ray(geometry, &pose, start, end)
    }
}

impl Drop for ShapeCell {
    fn drop(&mut self) {
        let Some(attachment) = self.state.get_mut().attachment.take() else {
            return;
        };
        if let Some(world) = attachment.world.upgrade() {
            World(world).teardown(Teardown::Geom(attachment.geom));
        }
    }
}

impl Shape {
    fn new(geometry: Geometry) -> Self {
        Self(Rc::new(ShapeCell {
            kind: geometry.shape_type(),
            state: RefCell::new(ShapeState {
                geometry: Some(geometry),
                offset: Iso::identity(),
                enabled: true,
                user_data: None,
                attachment: None,
            }),
        }))
    }

    pub fn sphere(radius: f32) -> Self {
        Self::new(Geometry::Sphere { radius })
    }

    /// A box with full edge lengths `width` (X), `height` (Y) and `depth` (Z).
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::new(Geometry::Box {
            size: Vec3::new(width, height, depth),
        })
    }

    /// A capsule along local Z; `length` excludes the end caps.
    pub fn capsule(radius: f32, length: f32) -> Self {
        Self::new(Geometry::Capsule { radius, length })
    }

    /// A cylinder along local Z.
    pub fn cylinder(radius: f32, length: f32) -> Self {
        Self::new(Geometry::Cylinder { radius, length })
    }

    /// A triangle mesh. Both buffers are copied; `indices` holds three vertex indices per
    /// triangle.
    pub fn mesh(vertices: &[Point3], indices: &[u32]) -> PhysicsResult<Self> {
        match Geometry::mesh(vertices, indices) {
            Ok(geometry) => Ok(Self::new(geometry)),
            Err(err) => {
                log::warn!("rejected mesh shape: {err}");
                Err(err.into())
            }
        }
    }

    pub fn shape_type(&self) -> ShapeType {
        self.0.kind
    }

    /// The collider this shape is attached to.
    pub fn collider(&self) -> Option<Collider> {
        let state = self.0.state.borrow();
        state
            .attachment
            .as_ref()
            .and_then(|a| a.collider.upgrade())
            .map(Collider)
    }

    /// The owning collider, if the shape is attached inside `world`.
    pub(crate) fn attached_in(&self, world: &World) -> Option<Collider> {
        let state = self.0.state.borrow();
        let attachment = state.attachment.as_ref()?;
        if !world.ptr_eq_cell(&attachment.world) {
            return None;
        }
        attachment.collider.upgrade().map(Collider)
    }

    pub(crate) fn attach(&self, collider: &Collider, body: BodyId, geom: GeomId) {
        self.0.state.borrow_mut().attachment = Some(Attachment {
            collider: Rc::downgrade(&collider.0),
            world: Rc::downgrade(&collider.world().0),
            body,
            geom,
        });
    }

    /// Forget the attachment, handing back the space slot for the caller to release.
    pub(crate) fn take_attachment(&self) -> Option<GeomId> {
        let attachment = self.0.state.borrow_mut().attachment.take()?;
        Some(attachment.geom)
    }

    /// Remove the shape from its collider and the collider's space.
    pub(crate) fn detach(&self) {
        let Some(attachment) = self.0.state.borrow_mut().attachment.take() else {
            return;
        };
        if let Some(world) = attachment.world.upgrade() {
            World(world).teardown(Teardown::Geom(attachment.geom));
        }
        if let Some(collider) = attachment.collider.upgrade() {
            let removed = Collider(collider).forget_shape(self);
            drop(removed);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.0.state.borrow().enabled
    }

    /// Disabled shapes are skipped by the broad phase and by raycasts.
    pub fn set_enabled(&self, enabled: bool) {
        self.0.state.borrow_mut().enabled = enabled;
    }

    pub fn user_data(&self) -> Option<Rc<dyn Any>> {
        self.0.state.borrow().user_data.clone()
    }

    pub fn set_user_data(&self, data: Option<Rc<dyn Any>>) {
        self.0.state.borrow_mut().user_data = data;
    }

    /// Offset from the collider's origin, in the collider's frame.
    pub fn position(&self) -> Vec3 {
        self.0.state.borrow().offset.translation.vector
    }

    pub fn set_position(&self, position: Vec3) {
        self.0.state.borrow_mut().offset.translation = position.into();
    }

    /// Rotation relative to the collider, as `(angle, axis)`.
    pub fn orientation(&self) -> (f32, Vec3) {
        quat_to_angle_axis(&self.0.state.borrow().offset.rotation)
    }

    pub fn set_orientation(&self, angle: f32, axis: Vec3) {
        self.0.state.borrow_mut().offset.rotation = quat_from_angle_axis(angle, axis);
    }

    /// Mass distribution of this shape alone at `density`, expressed in the collider's frame.
    ///
    /// Nothing is accumulated into the collider; combining shapes is up to the caller.
    pub fn mass(&self, density: f32) -> Option<MassData> {
        let state = self.0.state.borrow();
        let mut mass = state.geometry.as_ref()?.mass(density);
        mass.rotate(&state.offset.rotation);
        mass.translate(&state.offset.translation.vector);
        Some(mass)
    }

    /// World-space bounding box. Detached shapes report their box at the local offset; destroyed
    /// shapes report an empty box.
    pub fn aabb(&self) -> Aabb {
        let state = self.0.state.borrow();
        let Some(geometry) = state.geometry.as_ref() else {
            return aabb_empty();
        };
        let body_pose = state
            .attachment
            .as_ref()
            .and_then(|a| {
                let world = World(a.world.upgrade()?);
                world
                    .try_read(|s| s.dynamics.body(a.body).map(|b| b.iso()))
                    .flatten()
            })
            .unwrap_or_else(Iso::identity);
        geometry.aabb(&(body_pose * state.offset))
    }

    /// Detach from the collider and release the geometry. The handle stays valid for
    /// [`Shape::shape_type`] and user data.
    pub fn destroy(&self) {
        self.detach();
        self.0.state.borrow_mut().geometry = None;
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.state.borrow().geometry.is_none()
    }

    // --- Type-specific parameters ---

    fn mismatch(&self, expected: &'static str) -> PhysicsError {
        PhysicsError::ShapeTypeMismatch {
            expected,
            found: self.0.kind,
        }
    }

    /// Radius of a sphere, capsule or cylinder.
    pub fn radius(&self) -> Option<f32> {
        match self.0.state.borrow().geometry.as_ref()? {
            Geometry::Sphere { radius }
            | Geometry::Capsule { radius, .. }
            | Geometry::Cylinder { radius, .. } => Some(*radius),
            _ => None,
        }
    }

    pub fn set_radius(&self, value: f32) -> PhysicsResult<()> {
        if matches!(self.0.kind, ShapeType::Box | ShapeType::Mesh) {
            return Err(self.mismatch("sphere, capsule or cylinder"));
        }
        if let Some(
            Geometry::Sphere { radius }
            | Geometry::Capsule { radius, .. }
            | Geometry::Cylinder { radius, .. },
        ) = self.0.state.borrow_mut().geometry.as_mut()
        {
            *radius = value;
        }
        Ok(())
    }

    /// Full edge lengths of a box.
    pub fn dimensions(&self) -> Option<Vec3> {
        match self.0.state.borrow().geometry.as_ref()? {
            Geometry::Box { size } => Some(*size),
            _ => None,
        }
    }

    pub fn set_dimensions(&self, width: f32, height: f32, depth: f32) -> PhysicsResult<()> {
        if self.0.kind != ShapeType::Box {
            return Err(self.mismatch("box"));
        }
        if let Some(Geometry::Box { size }) = self.0.state.borrow_mut().geometry.as_mut() {
            *size = Vec3::new(width, height, depth);
        }
        Ok(())
    }

    /// Length of a capsule (without caps) or cylinder.
    pub fn length(&self) -> Option<f32> {
        match self.0.state.borrow().geometry.as_ref()? {
            Geometry::Capsule { length, .. } | Geometry::Cylinder { length, .. } => Some(*length),
            _ => None,
        }
    }

    pub fn set_length(&self, value: f32) -> PhysicsResult<()> {
        if !matches!(self.0.kind, ShapeType::Capsule | ShapeType::Cylinder) {
            return Err(self.mismatch("capsule or cylinder"));
        }
        if let Some(Geometry::Capsule { length, .. } | Geometry::Cylinder { length, .. }) =
            self.0.state.borrow_mut().geometry.as_mut()
        {
            *length = value;
        }
        Ok(())
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Shape {}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.0.state.borrow();
        f.debug_struct("Shape")
            .field("kind", &self.0.kind)
            .field("enabled", &state.enabled)
            .field("attached", &state.attachment.is_some())
            .field("destroyed", &state.geometry.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Physics, WorldDesc};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn world() -> World {
        Physics::init().new_world(WorldDesc::default()).unwrap()
    }

    #[test]
    fn parameters_round_trip_per_type() {
        let s = Shape::sphere(1.0);
        assert_eq!(s.shape_type(), ShapeType::Sphere);
        s.set_radius(2.0).unwrap();
        assert_eq!(s.radius(), Some(2.0));
        assert_eq!(s.length(), None);

        let b = Shape::cuboid(1.0, 2.0, 3.0);
        assert_eq!(b.dimensions(), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(
            b.set_radius(1.0),
            Err(PhysicsError::ShapeTypeMismatch {
                expected: "sphere, capsule or cylinder",
                found: ShapeType::Box,
            })
        );

        let c = Shape::capsule(0.5, 2.0);
        c.set_length(3.0).unwrap();
        assert_eq!((c.radius(), c.length()), (Some(0.5), Some(3.0)));
        assert!(c.set_dimensions(1.0, 1.0, 1.0).is_err());
        assert!(Shape::sphere(1.0).set_length(1.0).is_err());
    }

    #[test]
    fn mesh_rejects_bad_indices() {
        let vertices = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert!(matches!(
            Shape::mesh(&vertices, &[0, 1]),
            Err(PhysicsError::InvalidMesh(_))
        ));
        assert!(matches!(
            Shape::mesh(&vertices, &[0, 1, 7]),
            Err(PhysicsError::InvalidMesh(_))
        ));
    }

    #[test]
    fn mass_is_moved_into_offset_frame() {
        let s = Shape::sphere(1.0);
        let local = s.mass(2.0).unwrap();
        assert_relative_eq!(local.center, Point3::origin());
        s.set_position(Vec3::new(2.0, 0.0, 0.0));
        let shifted = s.mass(2.0).unwrap();
        assert_relative_eq!(shifted.mass, local.mass, epsilon = 1.0e-4);
        assert_relative_eq!(shifted.center, Point3::new(2.0, 0.0, 0.0), epsilon = 1.0e-5);
        // Parallel axis: Iyy grows by m * d^2.
        assert_relative_eq!(
            shifted.inertia[(1, 1)],
            local.inertia[(1, 1)] + local.mass * 4.0,
            epsilon = 1.0e-3
        );
        assert_relative_eq!(shifted.inertia[(0, 0)], local.inertia[(0, 0)], epsilon = 1.0e-3);
    }

    #[test]
    fn rotated_box_mass_swaps_axes() {
        let b = Shape::cuboid(4.0, 1.0, 1.0);
        let unrotated = b.mass(1.0).unwrap();
        b.set_orientation(FRAC_PI_2, Vec3::z());
        let rotated = b.mass(1.0).unwrap();
        assert_relative_eq!(rotated.inertia[(0, 0)], unrotated.inertia[(1, 1)], epsilon = 1.0e-3);
        assert_relative_eq!(rotated.inertia[(1, 1)], unrotated.inertia[(0, 0)], epsilon = 1.0e-3);
        let (angle, axis) = b.orientation();
        assert_relative_eq!(angle, FRAC_PI_2, epsilon = 1.0e-5);
        assert_relative_eq!(axis, Vec3::z(), epsilon = 1.0e-5);
    }

    #[test]
    fn aabb_follows_collider() {
        let w = world();
        let c = w.new_collider(Vec3::new(0.0, 5.0, 0.0));
        let s = Shape::cuboid(2.0, 2.0, 2.0);
        s.set_position(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(s.aabb().mins, Point3::new(0.0, -1.0, -1.0), epsilon = 1.0e-5);
        c.add_shape(&s);
        assert_relative_eq!(s.aabb().mins, Point3::new(0.0, 4.0, -1.0), epsilon = 1.0e-5);
        assert_relative_eq!(s.aabb().maxs, Point3::new(2.0, 6.0, 1.0), epsilon = 1.0e-5);
    }

    #[test]
    fn attaching_elsewhere_moves_the_shape() {
        let w = world();
        let a = w.new_collider(Vec3::zeros());
        let b = w.new_collider(Vec3::zeros());
        let s = Shape::sphere(1.0);
        a.add_shape(&s);
        b.add_shape(&s);
        assert_eq!(s.collider(), Some(b.clone()));
        assert!(a.shapes().is_empty());
        assert_eq!(b.shapes(), vec![s.clone()]);
        assert_eq!(w.read(|st| st.space.len()), 1);
    }

    #[test]
    fn destroy_detaches_and_keeps_metadata() {
        let w = world();
        let c = w.new_collider(Vec3::zeros());
        let s = Shape::capsule(0.5, 1.0);
        c.add_shape(&s);
        s.destroy();
        assert!(s.is_destroyed());
        assert!(s.collider().is_none());
        assert!(c.shapes().is_empty());
        assert_eq!(s.shape_type(), ShapeType::Capsule);
        assert_eq!(s.radius(), None);
        assert!(s.mass(1.0).is_none());
        assert_eq!(w.read(|st| st.space.len()), 0);
    }

    #[test]
    fn remove_shape_releases_space_slot() {
        let w = world();
        let c = w.new_collider(Vec3::zeros());
        c.add_shape(&Shape::sphere(1.0));
        assert_eq!(w.read(|st| st.space.len()), 1);
        c.remove_shape(&c.shapes()[0]);
        assert_eq!(w.read(|st| st.space.len()), 0);
    }
}
