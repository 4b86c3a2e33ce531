//! Simulation worlds: stepping, overlap queries, pairwise resolution and raycasts.
//!
//! A [`World`] owns the kernel state (bodies, joints, the hashed space and the transient contact
//! group) behind a `RefCell`. Every public operation borrows that state only for the duration of
//! kernel work; caller callbacks (update resolvers, raycast hits) always run with the state
//! released, so they may freely call back into the world.
//!
//! Handles dropped while the state is borrowed cannot tear their kernel data down on the spot.
//! Such teardowns are queued and applied at the start of the next world operation.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use kernel::settings::DEFAULT_DAMPING_THRESHOLD;
use kernel::{
    BodyDefaults, BodyId, ContactJoint, Damping, Dynamics, GeomId, JointId, Point3, Space, Vec3,
};
use slotmap::SecondaryMap;

use crate::collider::{Collider, ColliderCell};
use crate::context::{Physics, WorldDesc};
use crate::error::PhysicsResult;
use crate::joint::{Joint, JointCell};
use crate::material::{combine_friction, combine_restitution};
use crate::shape::{Shape, ShapeCell};
use crate::tags::{TagIndex, TagTable};

/// Panic message for operations on a world whose kernel data was destroyed.
pub const WORLD_DESTROYED: &str = "World has been destroyed";

/// Handle to a simulation world. Clones share the same world.
#[derive(Clone)]
pub struct World(pub(crate) Rc<WorldCell>);

pub(crate) struct WorldCell {
    physics: Physics,
    tags: RefCell<TagTable>,
    state: RefCell<Option<WorldState>>,
    deferred: RefCell<Vec<Teardown>>,
}

pub(crate) struct WorldState {
    pub dynamics: Dynamics,
    pub space: Space<Weak<ShapeCell>>,
    pub overlaps: Vec<(Shape, Shape)>,
    pub colliders: SecondaryMap<BodyId, Weak<ColliderCell>>,
    pub joints: SecondaryMap<JointId, Weak<JointCell>>,
}

/// Kernel-side cleanup owed by a released handle.
#[derive(Debug)]
pub(crate) enum Teardown {
    Body { body: BodyId, geoms: Vec<GeomId> },
    Geom(GeomId),
    Joint(JointId),
}

impl WorldState {
    fn apply(&mut self, teardown: Teardown) {
        match teardown {
            Teardown::Body { body, geoms } => {
                for geom in geoms {
                    self.space.remove(geom);
                }
                self.dynamics.remove_body(body);
                self.colliders.remove(body);
            }
            Teardown::Geom(geom) => {
                self.space.remove(geom);
            }
            Teardown::Joint(joint) => {
                self.dynamics.remove_joint(joint);
                self.joints.remove(joint);
            }
        }
    }

    /// Every broad-phase pair of shapes on distinct bodies, sleeping or not.
    fn broad_pairs(&self) -> Vec<(Shape, Shape)> {
        let dynamics = &self.dynamics;
        let pairs = self
            .space
            .collide(|_, cell| cell.upgrade()?.world_aabb(dynamics));

        pairs
            .into_iter()
            .filter_map(|(ga, gb)| {
                let a = self.space.get(ga)?.upgrade()?;
                let b = self.space.get(gb)?.upgrade()?;
                let (body_a, body_b) = (a.body()?, b.body()?);
                if body_a == body_b {
                    return None;
                }
                Some((Shape(a), Shape(b)))
            })
            .collect()
    }

    /// Broad-phase pairs with at least one awake body. Contacts between two sleeping bodies
    /// would be discarded by the step anyway.
    fn active_pairs(&self) -> Vec<(Shape, Shape)> {
        let awake = |shape: &Shape| {
            shape
                .0
                .body()
                .and_then(|id| self.dynamics.body(id))
                .is_some_and(|b| b.is_awake())
        };
        let mut pairs = self.broad_pairs();
        pairs.retain(|(a, b)| awake(a) || awake(b));
        pairs
    }
}

impl World {
    pub(crate) fn new(physics: Physics, desc: WorldDesc) -> PhysicsResult<Self> {
        let tags = TagTable::new(&desc.tags)?;
        let config = physics.config();
        let defaults = BodyDefaults {
            linear_damping: Damping::new(0.0, DEFAULT_DAMPING_THRESHOLD),
            angular_damping: Damping::new(0.0, DEFAULT_DAMPING_THRESHOLD),
            sleep_allowed: desc.allow_sleep,
        };
        let state = WorldState {
            dynamics: Dynamics::new(config, desc.gravity, defaults),
            space: Space::new(config.hash_min_level, config.hash_max_level),
            overlaps: Vec::new(),
            colliders: SecondaryMap::new(),
            joints: SecondaryMap::new(),
        };
        log::debug!(
            "world created (gravity {:?}, sleep {}, {} tags)",
            desc.gravity,
            desc.allow_sleep,
            tags.len()
        );
        Ok(Self(Rc::new(WorldCell {
            physics,
            tags: RefCell::new(tags),
            state: RefCell::new(Some(state)),
            deferred: RefCell::new(Vec::new()),
        })))
    }

    // --- State access ---

    /// Apply teardowns queued while the state was busy.
    fn flush_deferred(&self) {
        let pending = match self.0.deferred.try_borrow_mut() {
            Ok(mut queue) if !queue.is_empty() => std::mem::take(&mut *queue),
            _ => return,
        };
        match self.0.state.try_borrow_mut() {
            Ok(mut guard) => {
                if let Some(state) = guard.as_mut() {
                    log::trace!("applying {} deferred teardowns", pending.len());
                    for teardown in pending {
                        state.apply(teardown);
                    }
                }
            }
            Err(_) => self.0.deferred.borrow_mut().extend(pending),
        }
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&WorldState) -> R) -> R {
        self.flush_deferred();
        let guard = self.0.state.borrow();
        match guard.as_ref() {
            Some(state) => f(state),
            None => panic!("{WORLD_DESTROYED}"),
        }
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut WorldState) -> R) -> R {
        self.flush_deferred();
        let mut guard = self.0.state.borrow_mut();
        match guard.as_mut() {
            Some(state) => f(state),
            None => panic!("{WORLD_DESTROYED}"),
        }
    }

    /// Like [`World::read`], but `None` when the world is destroyed or busy.
    pub(crate) fn try_read<R>(&self, f: impl FnOnce(&WorldState) -> R) -> Option<R> {
        self.flush_deferred();
        let guard = self.0.state.try_borrow().ok()?;
        guard.as_ref().map(f)
    }

    /// Release kernel data now, or queue it when the state is already borrowed.
    pub(crate) fn teardown(&self, teardown: Teardown) {
        match self.0.state.try_borrow_mut() {
            Ok(mut guard) => {
                if let Some(state) = guard.as_mut() {
                    state.apply(teardown);
                }
            }
            Err(_) => {
                log::debug!("world busy, deferring {teardown:?}");
                match self.0.deferred.try_borrow_mut() {
                    Ok(mut queue) => queue.push(teardown),
                    Err(_) => log::warn!("dropping teardown {teardown:?}: world is busy"),
                }
            }
        }
    }

    pub(crate) fn ptr_eq_cell(&self, cell: &Weak<WorldCell>) -> bool {
        std::ptr::eq(Rc::as_ptr(&self.0), cell.as_ptr())
    }

    // --- Lifecycle ---

    pub fn physics(&self) -> Physics {
        self.0.physics.clone()
    }

    /// Destroy the kernel data of every collider and joint, then the space and contact group.
    ///
    /// Shapes are detached and stay usable. Tag queries keep working; every other operation
    /// panics afterwards. Calling this twice is a no-op.
    pub fn destroy(&self) {
        let Some((colliders, joints)) = self.try_read(|s| {
            let colliders: Vec<Collider> =
                s.colliders.values().filter_map(Weak::upgrade).map(Collider).collect();
            let joints: Vec<Joint> = s.joints.values().filter_map(Weak::upgrade).map(Joint).collect();
            (colliders, joints)
        }) else {
            return;
        };
        for joint in &joints {
            joint.destroy();
        }
        for collider in &colliders {
            collider.destroy();
        }
        let old = self.0.state.borrow_mut().take();
        self.0.deferred.borrow_mut().clear();
        drop(old);
        log::debug!("world destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.state.try_borrow().is_ok_and(|s| s.is_none())
    }

    /// Create a collider with unit mass at `position`, using the world's damping and sleep
    /// defaults.
    pub fn new_collider(&self, position: Vec3) -> Collider {
        let body = self.write(|s| s.dynamics.add_body(position));
        let collider = Collider::new(self.clone(), body);
        self.write(|s| s.colliders.insert(body, Rc::downgrade(&collider.0)));
        log::debug!("collider created at {position:?}");
        collider
    }

    /// Live colliders of this world.
    pub fn colliders(&self) -> Vec<Collider> {
        self.read(|s| {
            s.colliders
                .values()
                .filter_map(Weak::upgrade)
                .map(Collider)
                .collect()
        })
    }

    // --- Stepping ---

    /// Resolve every broad-phase pair with [`World::collide`], then integrate by `dt`.
    pub fn update(&self, dt: f32) {
        self.update_with(dt, |world| world.resolve_all());
    }

    /// Let `resolver` handle collisions for this step instead of the default resolution, then
    /// integrate by `dt`. The transient contacts are cleared afterwards.
    pub fn update_with(&self, dt: f32, resolver: impl FnOnce(&World)) {
        resolver(self);
        self.write(|s| {
            log::trace!(
                "step dt={dt} with {} contacts",
                s.dynamics.contact_count()
            );
            s.dynamics.step(dt);
            s.dynamics.clear_contacts();
        });
    }

    fn resolve_all(&self) {
        let pairs = self.read(WorldState::active_pairs);
        let mut contacts = 0;
        for (a, b) in &pairs {
            contacts += self.collide(a, b, None, None);
        }
        log::trace!("resolved {} pairs into {contacts} contacts", pairs.len());
    }

    /// Refill the overlap list with the current broad-phase pairs, without generating contacts.
    pub fn compute_overlaps(&self) {
        let pairs = self.read(WorldState::broad_pairs);
        let stale = self.write(|s| std::mem::replace(&mut s.overlaps, pairs));
        drop(stale);
    }

    /// Pop the next pair found by [`World::compute_overlaps`], last discovered first.
    ///
    /// Within a pair, the shape holding the earlier space slot comes first.
    pub fn next_overlap(&self) -> Option<(Shape, Shape)> {
        self.write(|s| s.overlaps.pop())
    }

    /// Generate contacts between two shapes and add them to this step's contact group.
    ///
    /// Returns the number of contact points (at most four). Nothing is generated when either
    /// shape is detached or belongs to another world, when both shapes share a collider, or when
    /// the colliders' tags are not allowed to collide. Negative overrides are ignored.
    pub fn collide(
        &self,
        a: &Shape,
        b: &Shape,
        friction: Option<f32>,
        restitution: Option<f32>,
    ) -> usize {
        if Rc::ptr_eq(&a.0, &b.0) {
            return 0;
        }
        let (Some(collider_a), Some(collider_b)) = (a.attached_in(self), b.attached_in(self))
        else {
            return 0;
        };
        if collider_a == collider_b {
            return 0;
        }
        let (Some(body_a), Some(body_b)) = (collider_a.body(), collider_b.body()) else {
            return 0;
        };

        let (ma, mb) = (collider_a.material(), collider_b.material());
        if !self.0.tags.borrow().allows(ma.tag, mb.tag) {
            return 0;
        }
        let friction = combine_friction(ma.friction, mb.friction, friction);
        let restitution = combine_restitution(ma.restitution, mb.restitution, restitution);

        let (state_a, state_b) = (a.0.state.borrow(), b.0.state.borrow());
        let (Some(geom_a), Some(geom_b)) = (state_a.geometry.as_ref(), state_b.geometry.as_ref())
        else {
            return 0;
        };

        self.write(|s| {
            let (Some(pa), Some(pb)) = (s.dynamics.body(body_a), s.dynamics.body(body_b)) else {
                return 0;
            };
            let pose_a = pa.iso() * state_a.offset;
            let pose_b = pb.iso() * state_b.offset;
            let max_contacts = s.dynamics.config().max_contacts;
            let contacts = kernel::collide(geom_a, &pose_a, geom_b, &pose_b, max_contacts);
            for geom in &contacts {
                s.dynamics.add_contact(ContactJoint {
                    body1: body_a,
                    body2: body_b,
                    geom: *geom,
                    friction,
                    restitution,
                });
            }
            contacts.len()
        })
    }

    /// Call `callback` with the shape, hit point and surface normal of every enabled shape the
    /// segment `start..end` passes through.
    ///
    /// Hits are reported in traversal order, not sorted by distance. The world is not borrowed
    /// while `callback` runs.
    pub fn raycast(&self, start: Point3, end: Point3, mut callback: impl FnMut(&Shape, Point3, Vec3)) {
        let hits = self.read(|s| {
            let candidates = s
                .space
                .query_segment(&start, &end, |_, cell| cell.upgrade()?.world_aabb(&s.dynamics));
            candidates
                .into_iter()
                .filter_map(|geom| {
                    let cell = s.space.get(geom)?.upgrade()?;
                    let hit = cell.cast_ray(&s.dynamics, &start, &end)?;
                    Some((Shape(cell), hit))
                })
                .collect::<Vec<_>>()
        });
        for (shape, hit) in &hits {
            callback(shape, hit.point, hit.normal);
        }
    }

    /// Size of the transient contact group.
    pub fn contact_count(&self) -> usize {
        self.read(|s| s.dynamics.contact_count())
    }

    // --- Settings ---

    pub fn gravity(&self) -> Vec3 {
        self.read(|s| s.dynamics.gravity)
    }

    pub fn set_gravity(&self, gravity: Vec3) {
        self.write(|s| s.dynamics.gravity = gravity);
    }

    /// Default linear `(damping, threshold)` for colliders created afterwards.
    pub fn linear_damping(&self) -> (f32, f32) {
        self.read(|s| {
            let d = s.dynamics.defaults.linear_damping;
            (d.damping, d.threshold)
        })
    }

    pub fn set_linear_damping(&self, damping: f32, threshold: f32) {
        self.write(|s| s.dynamics.defaults.linear_damping = Damping::new(damping, threshold));
    }

    /// Default angular `(damping, threshold)` for colliders created afterwards.
    pub fn angular_damping(&self) -> (f32, f32) {
        self.read(|s| {
            let d = s.dynamics.defaults.angular_damping;
            (d.damping, d.threshold)
        })
    }

    pub fn set_angular_damping(&self, damping: f32, threshold: f32) {
        self.write(|s| s.dynamics.defaults.angular_damping = Damping::new(damping, threshold));
    }

    pub fn is_sleeping_allowed(&self) -> bool {
        self.read(|s| s.dynamics.defaults.sleep_allowed)
    }

    pub fn set_sleeping_allowed(&self, allowed: bool) {
        self.write(|s| s.dynamics.defaults.sleep_allowed = allowed);
    }

    // --- Tags ---

    pub fn tags(&self) -> Vec<String> {
        self.0.tags.borrow().names().to_vec()
    }

    pub fn tag_name(&self, index: TagIndex) -> Option<String> {
        self.0.tags.borrow().name(index).map(str::to_owned)
    }

    pub(crate) fn tag_index(&self, name: &str) -> PhysicsResult<TagIndex> {
        self.0.tags.borrow().lookup(name)
    }

    pub fn disable_collision_between(&self, a: &str, b: &str) -> PhysicsResult<()> {
        self.0.tags.borrow_mut().set_enabled(a, b, false)
    }

    pub fn enable_collision_between(&self, a: &str, b: &str) -> PhysicsResult<()> {
        self.0.tags.borrow_mut().set_enabled(a, b, true)
    }

    pub fn is_collision_enabled_between(&self, a: &str, b: &str) -> PhysicsResult<bool> {
        self.0.tags.borrow().is_enabled(a, b)
    }
}

impl PartialEq for World {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for World {}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("destroyed", &self.is_destroyed())
            .field("tags", &self.0.tags.borrow().names())
            .finish()
    }
}

impl Drop for WorldCell {
    fn drop(&mut self) {
        log::debug!("world released");
    }
}
