use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kernel::{
    Aabb, Body, BodyId, Damping, MassData, Point3, Vec3, aabb_empty, aabb_union,
    quat_from_angle_axis, quat_to_angle_axis,
};

use crate::error::PhysicsResult;
use crate::joint::Joint;
use crate::shape::Shape;
use crate::tags::TagIndex;
use crate::world::{Teardown, World};

/// Panic message for operations on a collider whose body was destroyed.
pub const COLLIDER_DESTROYED: &str = "Collider has been destroyed";

/// A rigid body owned by one [`World`] for its whole life. Clones share the same collider.
///
/// The collider holds its shapes; shapes only point back at it. Dropping the last handle
/// destroys the body, as does [`Collider::destroy`].
#[derive(Clone)]
pub struct Collider(pub(crate) Rc<ColliderCell>);

pub(crate) struct ColliderCell {
    world: World,
    body: Cell<Option<BodyId>>,
    data: RefCell<ColliderData>,
}

struct ColliderData {
    friction: f32,
    restitution: f32,
    tag: Option<TagIndex>,
    shapes: Vec<Shape>,
    user_data: Option<Rc<dyn Any>>,
}

/// Surface parameters read when resolving a pair.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Material {
    pub friction: f32,
    pub restitution: f32,
    pub tag: Option<TagIndex>,
}

impl ColliderCell {
    /// Release the body and the space slots of every shape, detaching the shapes.
    fn release(&self, shapes: Vec<Shape>) {
        let Some(body) = self.body.take() else {
            return;
        };
        let geoms = shapes.iter().filter_map(Shape::take_attachment).collect();
        self.world.teardown(Teardown::Body { body, geoms });
        log::debug!("collider body released ({} shapes detached)", shapes.len());
    }
}

impl Drop for ColliderCell {
    fn drop(&mut self) {
        let shapes = std::mem::take(&mut self.data.get_mut().shapes);
        self.release(shapes);
    }
}

impl Collider {
    pub(crate) fn new(world: World, body: BodyId) -> Self {
        Self(Rc::new(ColliderCell {
            world,
            body: Cell::new(Some(body)),
            data: RefCell::new(ColliderData {
                friction: 0.0,
                restitution: 0.0,
                tag: None,
                shapes: Vec::new(),
                user_data: None,
            }),
        }))
    }

    pub(crate) fn body(&self) -> Option<BodyId> {
        self.0.body.get()
    }

    pub(crate) fn material(&self) -> Material {
        let data = self.0.data.borrow();
        Material {
            friction: data.friction,
            restitution: data.restitution,
            tag: data.tag,
        }
    }

    fn body_id(&self) -> BodyId {
        match self.0.body.get() {
            Some(body) => body,
            None => panic!("{COLLIDER_DESTROYED}"),
        }
    }

    fn with_body<R>(&self, f: impl FnOnce(&Body) -> R) -> R {
        let id = self.body_id();
        self.0.world.read(|s| match s.dynamics.body(id) {
            Some(body) => f(body),
            None => panic!("{COLLIDER_DESTROYED}"),
        })
    }

    fn with_body_mut<R>(&self, f: impl FnOnce(&mut Body) -> R) -> R {
        let id = self.body_id();
        self.0.world.write(|s| match s.dynamics.body_mut(id) {
            Some(body) => f(body),
            None => panic!("{COLLIDER_DESTROYED}"),
        })
    }

    pub fn world(&self) -> World {
        self.0.world.clone()
    }

    // --- Lifecycle ---

    /// Destroy the body. Shapes are detached and joints lose this body; the handle stays valid
    /// for user data, tag and material queries.
    pub fn destroy(&self) {
        let shapes = std::mem::take(&mut self.0.data.borrow_mut().shapes);
        self.0.release(shapes);
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.body.get().is_none()
    }

    // --- Shapes and joints ---

    pub fn shapes(&self) -> Vec<Shape> {
        self.0.data.borrow().shapes.clone()
    }

    /// Attach `shape`, detaching it from any previous collider first.
    pub fn add_shape(&self, shape: &Shape) {
        let body = self.body_id();
        if shape.is_destroyed() {
            log::warn!("ignoring destroyed {} shape", shape.shape_type());
            return;
        }
        if shape.collider().as_ref() == Some(self) {
            return;
        }
        shape.detach();
        let geom = self.0.world.write(|s| s.space.insert(Rc::downgrade(&shape.0)));
        shape.attach(self, body, geom);
        self.0.data.borrow_mut().shapes.push(shape.clone());
    }

    /// Detach `shape` if it is attached to this collider.
    pub fn remove_shape(&self, shape: &Shape) {
        if shape.collider().as_ref() == Some(self) {
            shape.detach();
        }
    }

    /// Drop `shape` from the list, handing the removed handle back so it is released outside the
    /// borrow.
    pub(crate) fn forget_shape(&self, shape: &Shape) -> Option<Shape> {
        let mut data = self.0.data.borrow_mut();
        let index = data.shapes.iter().position(|s| s == shape)?;
        Some(data.shapes.remove(index))
    }

    /// Joints currently attached to this collider's body.
    pub fn joints(&self) -> Vec<Joint> {
        let Some(body) = self.body() else {
            return Vec::new();
        };
        self.0.world.read(|s| {
            s.dynamics
                .joints_of(body)
                .into_iter()
                .filter_map(|id| s.joints.get(id)?.upgrade())
                .map(Joint)
                .collect()
        })
    }

    // --- Metadata ---

    pub fn user_data(&self) -> Option<Rc<dyn Any>> {
        self.0.data.borrow().user_data.clone()
    }

    pub fn set_user_data(&self, data: Option<Rc<dyn Any>>) {
        self.0.data.borrow_mut().user_data = data;
    }

    pub fn tag(&self) -> Option<String> {
        let tag = self.0.data.borrow().tag?;
        self.0.world.tag_name(tag)
    }

    /// Set the collision tag by name, or clear it with `None`. Untagged colliders collide with
    /// everything.
    pub fn set_tag(&self, tag: Option<&str>) -> PhysicsResult<()> {
        let index = tag.map(|name| self.0.world.tag_index(name)).transpose()?;
        self.0.data.borrow_mut().tag = index;
        Ok(())
    }

    pub fn friction(&self) -> f32 {
        self.0.data.borrow().friction
    }

    /// Negative values are clamped to zero.
    pub fn set_friction(&self, friction: f32) {
        self.0.data.borrow_mut().friction = friction.max(0.0);
    }

    pub fn restitution(&self) -> f32 {
        self.0.data.borrow().restitution
    }

    /// Negative values are clamped to zero.
    pub fn set_restitution(&self, restitution: f32) {
        self.0.data.borrow_mut().restitution = restitution.max(0.0);
    }

    // --- Flags ---

    pub fn is_kinematic(&self) -> bool {
        self.with_body(|b| b.kinematic)
    }

    /// Kinematic bodies ignore forces and contacts but still move with their velocity.
    pub fn set_kinematic(&self, kinematic: bool) {
        self.with_body_mut(|b| b.kinematic = kinematic);
    }

    pub fn is_gravity_ignored(&self) -> bool {
        self.with_body(|b| b.gravity_ignored)
    }

    pub fn set_gravity_ignored(&self, ignored: bool) {
        self.with_body_mut(|b| b.gravity_ignored = ignored);
    }

    pub fn is_sleeping_allowed(&self) -> bool {
        self.with_body(|b| b.sleep_allowed)
    }

    pub fn set_sleeping_allowed(&self, allowed: bool) {
        self.with_body_mut(|b| {
            b.sleep_allowed = allowed;
            if !allowed {
                b.set_awake(true);
            }
        });
    }

    pub fn is_awake(&self) -> bool {
        self.with_body(Body::is_awake)
    }

    pub fn set_awake(&self, awake: bool) {
        self.with_body_mut(|b| b.set_awake(awake));
    }

    // --- Mass ---

    pub fn mass(&self) -> f32 {
        self.with_body(|b| b.mass_data().mass)
    }

    /// Rescale the body to `mass`, keeping the shape of its inertia tensor.
    pub fn set_mass(&self, mass: f32) {
        self.with_body_mut(|b| b.set_mass(mass));
    }

    /// `(center of mass, mass, inertia)` with the inertia packed as
    /// `[xx, yy, zz, xy, xz, yz]`.
    pub fn mass_data(&self) -> (Point3, f32, [f32; 6]) {
        self.with_body(|b| {
            let data = b.mass_data();
            (data.center, data.mass, data.packed_inertia())
        })
    }

    /// Replace the full mass distribution. The center of mass is informational; the body still
    /// rotates about its origin.
    pub fn set_mass_data(&self, center: Point3, mass: f32, inertia: [f32; 6]) {
        let data = MassData::new(center, mass, MassData::unpack_inertia(&inertia));
        self.with_body_mut(|b| b.set_mass_data(data));
    }

    pub fn local_center(&self) -> Point3 {
        self.with_body(|b| b.mass_data().center)
    }

    // --- Pose and velocity ---

    pub fn position(&self) -> Vec3 {
        self.with_body(|b| b.position)
    }

    pub fn set_position(&self, position: Vec3) {
        self.with_body_mut(|b| b.position = position);
    }

    /// Orientation as `(angle, axis)`.
    pub fn orientation(&self) -> (f32, Vec3) {
        self.with_body(|b| quat_to_angle_axis(&b.rotation))
    }

    pub fn set_orientation(&self, angle: f32, axis: Vec3) {
        self.with_body_mut(|b| b.rotation = quat_from_angle_axis(angle, axis));
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.with_body(|b| b.linear_velocity)
    }

    /// A non-zero velocity wakes the body.
    pub fn set_linear_velocity(&self, velocity: Vec3) {
        self.with_body_mut(|b| {
            wake_for(b, &velocity);
            b.linear_velocity = velocity;
        });
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.with_body(|b| b.angular_velocity)
    }

    /// A non-zero velocity wakes the body.
    pub fn set_angular_velocity(&self, velocity: Vec3) {
        self.with_body_mut(|b| {
            wake_for(b, &velocity);
            b.angular_velocity = velocity;
        });
    }

    /// `(damping, threshold)`: velocities below `threshold` are not damped.
    pub fn linear_damping(&self) -> (f32, f32) {
        self.with_body(|b| (b.linear_damping.damping, b.linear_damping.threshold))
    }

    pub fn set_linear_damping(&self, damping: f32, threshold: f32) {
        self.with_body_mut(|b| b.linear_damping = Damping::new(damping, threshold));
    }

    pub fn angular_damping(&self) -> (f32, f32) {
        self.with_body(|b| (b.angular_damping.damping, b.angular_damping.threshold))
    }

    pub fn set_angular_damping(&self, damping: f32, threshold: f32) {
        self.with_body_mut(|b| b.angular_damping = Damping::new(damping, threshold));
    }

    // --- Forces ---

    /// Force applied at the body origin during the next step only.
    pub fn apply_force(&self, force: Vec3) {
        self.with_body_mut(|b| {
            wake_for(b, &force);
            b.add_force(&force);
        });
    }

    /// Force applied at a world-space point during the next step only.
    pub fn apply_force_at_position(&self, force: Vec3, position: Point3) {
        self.with_body_mut(|b| {
            wake_for(b, &force);
            b.add_force_at(&force, &position);
        });
    }

    pub fn apply_torque(&self, torque: Vec3) {
        self.with_body_mut(|b| {
            wake_for(b, &torque);
            b.add_torque(&torque);
        });
    }

    // --- Frames ---

    pub fn local_point(&self, world: Point3) -> Point3 {
        self.with_body(|b| b.local_point(&world))
    }

    pub fn world_point(&self, local: Point3) -> Point3 {
        self.with_body(|b| b.world_point(&local))
    }

    pub fn local_vector(&self, world: Vec3) -> Vec3 {
        self.with_body(|b| b.local_vector(&world))
    }

    pub fn world_vector(&self, local: Vec3) -> Vec3 {
        self.with_body(|b| b.world_vector(&local))
    }

    /// Velocity of a point given in body coordinates.
    pub fn linear_velocity_from_local_point(&self, local: Point3) -> Vec3 {
        self.with_body(|b| b.point_velocity(&b.world_point(&local)))
    }

    /// Velocity of a point given in world coordinates.
    pub fn linear_velocity_from_world_point(&self, world: Point3) -> Vec3 {
        self.with_body(|b| b.point_velocity(&world))
    }

    /// Union of the world boxes of every attached shape; all zero when there are none.
    pub fn aabb(&self) -> Aabb {
        self.shapes()
            .iter()
            .map(Shape::aabb)
            .reduce(|a, b| aabb_union(&a, &b))
            .unwrap_or_else(aabb_empty)
    }
}

fn wake_for(body: &mut Body, v: &Vec3) {
    if !body.is_awake() && *v != Vec3::zeros() {
        body.set_awake(true);
    }
}

impl PartialEq for Collider {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Collider {}

impl std::fmt::Debug for Collider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.0.data.borrow();
        f.debug_struct("Collider")
            .field("body", &self.0.body.get())
            .field("shapes", &data.shapes.len())
            .field("tag", &data.tag)
            .finish()
    }
}
