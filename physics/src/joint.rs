use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kernel::{Body, JointConstraint, JointId, JointKind, JointType, Limits, Point3, Vec3};

use crate::collider::{COLLIDER_DESTROYED, Collider};
use crate::error::{PhysicsError, PhysicsResult};
use crate::world::{Teardown, World};

/// Panic message for joints spanning two worlds.
pub const CROSS_WORLD_JOINT: &str = "Joint bodies must exist in the same World";

/// A constraint between two colliders of the same world. Clones share the same joint.
///
/// Anchors and axes are given in world space at creation; the joint then follows the bodies.
/// The pose at creation is angle and position zero.
#[derive(Clone)]
pub struct Joint(pub(crate) Rc<JointCell>);

pub(crate) struct JointCell {
    world: World,
    id: Cell<Option<JointId>>,
    kind: JointType,
    user_data: RefCell<Option<Rc<dyn Any>>>,
}

impl Drop for JointCell {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.world.teardown(Teardown::Joint(id));
        }
    }
}

impl Joint {
    fn create(
        a: &Collider,
        b: &Collider,
        kind: JointType,
        make: impl FnOnce(&Body, &Body) -> JointKind,
    ) -> Self {
        let world = a.world();
        if world != b.world() {
            panic!("{CROSS_WORLD_JOINT}");
        }
        let (Some(b1), Some(b2)) = (a.body(), b.body()) else {
            panic!("{COLLIDER_DESTROYED}");
        };
        let Some(id) = world.write(|s| s.dynamics.add_joint(b1, b2, make)) else {
            panic!("Joint needs two distinct colliders");
        };
        let joint = Self(Rc::new(JointCell {
            world: world.clone(),
            id: Cell::new(Some(id)),
            kind,
            user_data: RefCell::new(None),
        }));
        world.write(|s| s.joints.insert(id, Rc::downgrade(&joint.0)));
        log::debug!("{kind} joint created");
        joint
    }

    /// Ball-and-socket joint at world point `anchor`.
    ///
    /// # Panics
    ///
    /// If the colliders belong to different worlds, are the same collider, or either one was
    /// destroyed.
    pub fn ball(a: &Collider, b: &Collider, anchor: Point3) -> Self {
        Self::create(a, b, JointType::Ball, |b1, b2| {
            JointConstraint::ball(b1, b2, &anchor)
        })
    }

    /// Hinge at world point `anchor`, rotating about world `axis`.
    ///
    /// Panics like [`Joint::ball`].
    pub fn hinge(a: &Collider, b: &Collider, anchor: Point3, axis: Vec3) -> Self {
        Self::create(a, b, JointType::Hinge, |b1, b2| {
            JointConstraint::hinge(b1, b2, &anchor, &axis)
        })
    }

    /// Slider along world `axis`; rotation between the bodies is locked.
    ///
    /// Panics like [`Joint::ball`].
    pub fn slider(a: &Collider, b: &Collider, axis: Vec3) -> Self {
        Self::create(a, b, JointType::Slider, |b1, b2| {
            JointConstraint::slider(b1, b2, &axis)
        })
    }

    pub fn joint_type(&self) -> JointType {
        self.0.kind
    }

    /// The two colliders in creation order, or `None` once either was destroyed.
    pub fn colliders(&self) -> Option<(Collider, Collider)> {
        let id = self.0.id.get()?;
        self.0
            .world
            .try_read(|s| {
                let (b1, b2) = s.dynamics.joint(id)?.bodies?;
                let a = s.colliders.get(b1)?.upgrade()?;
                let b = s.colliders.get(b2)?.upgrade()?;
                Some((Collider(a), Collider(b)))
            })
            .flatten()
    }

    pub fn user_data(&self) -> Option<Rc<dyn Any>> {
        self.0.user_data.borrow().clone()
    }

    pub fn set_user_data(&self, data: Option<Rc<dyn Any>>) {
        *self.0.user_data.borrow_mut() = data;
    }

    /// Remove the constraint. The handle keeps its type and user data.
    pub fn destroy(&self) {
        if let Some(id) = self.0.id.take() {
            self.0.world.teardown(Teardown::Joint(id));
            log::debug!("{} joint destroyed", self.0.kind);
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.id.get().is_none()
    }

    // --- Type-specific ---

    fn mismatch(&self, expected: &'static str) -> PhysicsError {
        PhysicsError::JointTypeMismatch {
            expected,
            found: self.0.kind,
        }
    }

    fn read_attached<R>(
        &self,
        f: impl FnOnce(&JointConstraint, &Body, &Body) -> Option<R>,
    ) -> Option<R> {
        let id = self.0.id.get()?;
        self.0
            .world
            .try_read(|s| {
                let joint = s.dynamics.joint(id)?;
                let (b1, b2) = s.dynamics.joint_bodies(id)?;
                f(joint, b1, b2)
            })
            .flatten()
    }

    /// Rebuild the joint frame from the current poses. Detached joints are left alone.
    fn rebuild(&self, make: impl FnOnce(&Body, &Body, &JointKind) -> JointKind) {
        if let Some(id) = self.0.id.get() {
            self.0.world.write(|s| s.dynamics.rebuild_joint(id, make));
        }
    }

    /// World anchor as carried by each body; both agree while the joint holds.
    pub fn anchors(&self) -> Option<(Point3, Point3)> {
        self.read_attached(|j, b1, b2| j.anchors(b1, b2))
    }

    /// Move the anchor of a ball or hinge joint to world point `anchor`.
    pub fn set_anchor(&self, anchor: Point3) -> PhysicsResult<()> {
        if self.0.kind == JointType::Slider {
            return Err(self.mismatch("ball or hinge"));
        }
        self.rebuild(|b1, b2, old| match old {
            JointKind::Hinge { axis1, .. } => keep_limits(
                JointConstraint::hinge(b1, b2, &anchor, &b1.world_vector(axis1)),
                old,
            ),
            _ => JointConstraint::ball(b1, b2, &anchor),
        });
        Ok(())
    }

    /// World axis of a hinge or slider.
    pub fn axis(&self) -> Option<Vec3> {
        self.read_attached(|j, b1, _| j.axis(b1))
    }

    pub fn set_axis(&self, axis: Vec3) -> PhysicsResult<()> {
        if self.0.kind == JointType::Ball {
            return Err(self.mismatch("hinge or slider"));
        }
        self.rebuild(|b1, b2, old| match old {
            JointKind::Hinge { anchor1, .. } => keep_limits(
                JointConstraint::hinge(b1, b2, &b1.world_point(anchor1), &axis),
                old,
            ),
            _ => keep_limits(JointConstraint::slider(b1, b2, &axis), old),
        });
        Ok(())
    }

    /// Current hinge angle in radians.
    pub fn angle(&self) -> Option<f32> {
        self.read_attached(|j, b1, b2| j.hinge_angle(b1, b2))
    }

    /// Current slider displacement along the axis.
    pub fn position(&self) -> Option<f32> {
        self.read_attached(|j, b1, b2| j.slider_position(b1, b2))
    }

    /// `(lower, upper)` limits of a hinge (radians) or slider (distance). Unbounded by default.
    pub fn limits(&self) -> Option<(f32, f32)> {
        let id = self.0.id.get()?;
        self.0
            .world
            .try_read(|s| s.dynamics.joint(id)?.limits())
            .flatten()
            .map(|l| (l.lower, l.upper))
    }

    pub fn set_limits(&self, lower: f32, upper: f32) -> PhysicsResult<()> {
        if self.0.kind == JointType::Ball {
            return Err(self.mismatch("hinge or slider"));
        }
        if let Some(id) = self.0.id.get() {
            self.0.world.write(|s| {
                if let Some(limits) = s.dynamics.joint_mut(id).and_then(|j| j.limits_mut()) {
                    *limits = Limits { lower, upper };
                }
            });
        }
        Ok(())
    }
}

/// Carry hinge or slider limits over to a rebuilt frame.
fn keep_limits(mut fresh: JointKind, old: &JointKind) -> JointKind {
    if let (
        JointKind::Hinge { limits, .. } | JointKind::Slider { limits, .. },
        JointKind::Hinge { limits: previous, .. } | JointKind::Slider { limits: previous, .. },
    ) = (&mut fresh, old)
    {
        *limits = *previous;
    }
    fresh
}

impl PartialEq for Joint {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Joint {}

impl std::fmt::Debug for Joint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Joint")
            .field("kind", &self.0.kind)
            .field("id", &self.0.id.get())
            .finish()
    }
}
