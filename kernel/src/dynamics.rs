/*!
Rigid-body store and fixed-step integrator.

`Dynamics` owns bodies, persistent joints and the transient contact group. One call to
[`Dynamics::step`] runs:

1. wake propagation: sleeping bodies touching or jointed to awake dynamic bodies wake up
2. velocity integration of gravity and accumulated forces, then damping
3. constraint rows for joints, then contacts, solved with projected Gauss-Seidel
4. position integration and force clearing
5. island-based auto-sleep

The contact group is never cleared implicitly; callers clear it after the step.
*/

use hashbrown::HashMap;
use slotmap::SlotMap;

use crate::body::{Body, BodyId, Damping};
use crate::config::KernelConfig;
use crate::joint::{JointConstraint, JointId, JointKind, Limits};
use crate::narrow_phase::ContactGeom;
use crate::solver::{self, Bounds, Row, SolverBody};
use crate::types::{Point3, Quat, Vec3, orthonormal_basis};

/// A transient contact constraint between two bodies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactJoint {
    /// Body the contact normal points away from.
    pub body1: BodyId,
    pub body2: BodyId,
    pub geom: ContactGeom,
    /// Coulomb coefficient; infinity means no slip.
    pub friction: f32,
    /// Bounce coefficient; zero disables restitution.
    pub restitution: f32,
}

/// Defaults copied into every body created afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyDefaults {
    pub linear_damping: Damping,
    pub angular_damping: Damping,
    pub sleep_allowed: bool,
}

pub struct Dynamics {
    config: KernelConfig,
    pub gravity: Vec3,
    pub defaults: BodyDefaults,
    bodies: SlotMap<BodyId, Body>,
    joints: SlotMap<JointId, JointConstraint>,
    contacts: Vec<ContactJoint>,
}

impl Dynamics {
    pub fn new(config: KernelConfig, gravity: Vec3, defaults: BodyDefaults) -> Self {
        Self {
            config: config.sanitized(),
            gravity,
            defaults,
            bodies: SlotMap::with_key(),
            joints: SlotMap::with_key(),
            contacts: Vec::new(),
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    // --- Bodies ---

    /// Create a body at `position` using the current body defaults.
    pub fn add_body(&mut self, position: Vec3) -> BodyId {
        let mut body = Body::new(position);
        body.linear_damping = self.defaults.linear_damping;
        body.angular_damping = self.defaults.angular_damping;
        body.sleep_allowed = self.defaults.sleep_allowed;
        self.bodies.insert(body)
    }

    /// Remove a body, detaching every joint attached to it and dropping its contacts.
    ///
    /// Returns the joints that were detached.
    pub fn remove_body(&mut self, id: BodyId) -> Option<(Body, Vec<JointId>)> {
        let body = self.bodies.remove(id)?;
        let detached: Vec<JointId> = self.joints_of(id);
        for &joint in &detached {
            if let Some(j) = self.joints.get_mut(joint) {
                j.bodies = None;
            }
        }
        self.contacts.retain(|c| c.body1 != id && c.body2 != id);
        Some((body, detached))
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    // --- Joints ---

    /// Attach a joint between two existing, distinct bodies.
    ///
    /// `make` builds the joint frame from the bodies' current poses.
    pub fn add_joint(
        &mut self,
        b1: BodyId,
        b2: BodyId,
        make: impl FnOnce(&Body, &Body) -> JointKind,
    ) -> Option<JointId> {
        if b1 == b2 {
            return None;
        }
        let kind = make(self.bodies.get(b1)?, self.bodies.get(b2)?);
        Some(self.joints.insert(JointConstraint {
            bodies: Some((b1, b2)),
            kind,
        }))
    }

    pub fn remove_joint(&mut self, id: JointId) -> Option<JointConstraint> {
        self.joints.remove(id)
    }

    pub fn joint(&self, id: JointId) -> Option<&JointConstraint> {
        self.joints.get(id)
    }

    pub fn joint_mut(&mut self, id: JointId) -> Option<&mut JointConstraint> {
        self.joints.get_mut(id)
    }

    /// Bodies of an attached joint.
    pub fn joint_bodies(&self, id: JointId) -> Option<(&Body, &Body)> {
        let (b1, b2) = self.joints.get(id)?.bodies?;
        Some((self.bodies.get(b1)?, self.bodies.get(b2)?))
    }

    /// Rebuild an attached joint's frame from the bodies' current poses.
    pub fn rebuild_joint(
        &mut self,
        id: JointId,
        make: impl FnOnce(&Body, &Body, &JointKind) -> JointKind,
    ) -> bool {
        let Some(joint) = self.joints.get(id) else {
            return false;
        };
        let Some((b1, b2)) = joint.bodies else {
            return false;
        };
        let (Some(a), Some(b)) = (self.bodies.get(b1), self.bodies.get(b2)) else {
            return false;
        };
        let kind = make(a, b, &joint.kind);
        if let Some(joint) = self.joints.get_mut(id) {
            joint.kind = kind;
        }
        true
    }

    /// Joints attached to `body`, in creation order.
    pub fn joints_of(&self, body: BodyId) -> Vec<JointId> {
        self.joints
            .iter()
            .filter(|(_, j)| j.bodies.is_some_and(|(a, b)| a == body || b == body))
            .map(|(id, _)| id)
            .collect()
    }

    // --- Contacts ---

    pub fn add_contact(&mut self, contact: ContactJoint) {
        self.contacts.push(contact);
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn clear_contacts(&mut self) {
        self.contacts.clear();
    }

    // --- Stepping ---

    /// Advance the simulation by `dt` seconds. Non-positive steps do nothing.
    pub fn step(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }

        self.propagate_wake();

        let gravity = self.gravity;
        for (_, body) in self.bodies.iter_mut() {
            if !body.is_awake() || body.kinematic {
                continue;
            }
            let inv_mass = body.effective_inv_mass();
            let inv_inertia = body.effective_inv_inertia();
            let mut accel = body.force * inv_mass;
            if !body.gravity_ignored {
                accel += gravity;
            }
            body.linear_velocity += accel * dt;
            body.angular_velocity += inv_inertia * body.torque * dt;
            let (linear, angular) = (body.linear_damping, body.angular_damping);
            linear.apply(&mut body.linear_velocity);
            angular.apply(&mut body.angular_velocity);
        }

        self.solve_constraints(dt);

        for (_, body) in self.bodies.iter_mut() {
            if body.is_awake() {
                body.position += body.linear_velocity * dt;
                let spin = Quat::from_scaled_axis(body.angular_velocity * dt);
                body.rotation = Quat::new_normalize((spin * body.rotation).into_inner());
            }
            body.force = Vec3::zeros();
            body.torque = Vec3::zeros();
        }

        self.auto_sleep();
    }

    /// Pairs of bodies coupled this step by a contact or an attached joint.
    fn couplings(&self) -> Vec<(BodyId, BodyId)> {
        self.contacts
            .iter()
            .map(|c| (c.body1, c.body2))
            .chain(self.joints.values().filter_map(|j| j.bodies))
            .collect()
    }

    fn propagate_wake(&mut self) {
        let couplings = self.couplings();
        let mut changed = true;
        while changed {
            changed = false;
            for &(a, b) in &couplings {
                for (from, to) in [(a, b), (b, a)] {
                    let wakes = self
                        .bodies
                        .get(from)
                        .is_some_and(|f| f.is_awake() && f.is_dynamic());
                    if !wakes {
                        continue;
                    }
                    if let Some(target) = self.bodies.get_mut(to) {
                        if !target.is_awake() {
                            target.set_awake(true);
                            changed = true;
                        }
                    }
                }
            }
        }
    }

    fn solve_constraints(&mut self, dt: f32) {
        let mut index: HashMap<BodyId, usize> = HashMap::new();
        let mut solver_bodies: Vec<SolverBody> = Vec::new();
        let mut ids: Vec<BodyId> = Vec::new();
        for (id, body) in self.bodies.iter() {
            index.insert(id, solver_bodies.len());
            ids.push(id);
            solver_bodies.push(SolverBody {
                linear: body.linear_velocity,
                angular: body.angular_velocity,
                inv_mass: body.effective_inv_mass(),
                inv_inertia: body.effective_inv_inertia(),
            });
        }

        let mut rows: Vec<Row> = Vec::new();
        let cfg = self.config;
        let k = cfg.erp / dt;

        for joint in self.joints.values() {
            let Some((id1, id2)) = joint.bodies else { continue };
            let (Some(&i1), Some(&i2)) = (index.get(&id1), index.get(&id2)) else {
                continue;
            };
            let (Some(b1), Some(b2)) = (self.bodies.get(id1), self.bodies.get(id2)) else {
                continue;
            };
            joint_rows(joint, b1, b2, i1, i2, k, cfg.cfm, &mut rows);
        }

        for contact in &self.contacts {
            let (Some(&i1), Some(&i2)) = (index.get(&contact.body1), index.get(&contact.body2))
            else {
                continue;
            };
            let (Some(b1), Some(b2)) = (
                self.bodies.get(contact.body1),
                self.bodies.get(contact.body2),
            ) else {
                continue;
            };
            contact_rows(contact, b1, b2, i1, i2, &cfg, k, &mut rows);
        }

        if rows.is_empty() {
            return;
        }
        log::trace!("solving {} rows over {} bodies", rows.len(), ids.len());
        solver::solve(&mut solver_bodies, &mut rows, cfg.solver_iterations, cfg.sor);

        for (id, sb) in ids.into_iter().zip(solver_bodies) {
            if let Some(body) = self.bodies.get_mut(id) {
                if body.is_awake() && body.is_dynamic() {
                    body.linear_velocity = sb.linear;
                    body.angular_velocity = sb.angular;
                }
            }
        }
    }

    /// Put islands of idle dynamic bodies to sleep.
    fn auto_sleep(&mut self) {
        let cfg = self.config;
        let ids: Vec<BodyId> = self.bodies.keys().collect();
        let slot: HashMap<BodyId, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let mut idle = vec![false; ids.len()];
        for (i, &id) in ids.iter().enumerate() {
            if let Some(body) = self.bodies.get_mut(id) {
                if body.is_awake() && body.is_dynamic() {
                    let steps =
                        body.tick_idle(cfg.sleep_linear_threshold, cfg.sleep_angular_threshold);
                    idle[i] = body.sleep_allowed && steps >= cfg.sleep_steps;
                }
            }
        }

        // Islands over dynamic bodies; kinematic bodies do not link islands.
        let mut parent: Vec<usize> = (0..ids.len()).collect();
        for (a, b) in self.couplings() {
            let (Some(&ia), Some(&ib)) = (slot.get(&a), slot.get(&b)) else {
                continue;
            };
            let dynamic = |id| self.bodies.get(id).is_some_and(Body::is_dynamic);
            if dynamic(a) && dynamic(b) {
                let (ra, rb) = (find(&mut parent, ia), find(&mut parent, ib));
                parent[ra] = rb;
            }
        }

        let mut island_idle: HashMap<usize, bool> = HashMap::new();
        for (i, &id) in ids.iter().enumerate() {
            let Some(body) = self.bodies.get(id) else { continue };
            if !body.is_awake() || !body.is_dynamic() {
                continue;
            }
            let root = find(&mut parent, i);
            let entry = island_idle.entry(root).or_insert(true);
            *entry &= idle[i];
        }

        let mut slept = 0usize;
        for (i, &id) in ids.iter().enumerate() {
            let root = find(&mut parent, i);
            if !island_idle.get(&root).copied().unwrap_or(false) {
                continue;
            }
            if let Some(body) = self.bodies.get_mut(id) {
                if body.is_awake() && body.is_dynamic() {
                    body.set_awake(false);
                    slept += 1;
                }
            }
        }
        if slept > 0 {
            log::trace!("{slept} bodies went to sleep");
        }
    }
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Rows for `e` in {x, y, z} holding world points `p1` (on body 1) and `p2` together.
#[allow(clippy::too_many_arguments)]
fn point_rows(
    b1: &Body,
    b2: &Body,
    p1: &Point3,
    p2: &Point3,
    i1: usize,
    i2: usize,
    k: f32,
    cfm: f32,
    rows: &mut Vec<Row>,
) {
    let r1 = p1.coords - b1.position;
    let r2 = p2.coords - b2.position;
    let error = p1 - p2;
    for e in [Vec3::x(), Vec3::y(), Vec3::z()] {
        rows.push(
            Row::new(i1, i2, e, r1.cross(&e), -e, -r2.cross(&e))
                .with_rhs(-k * error.dot(&e), cfm),
        );
    }
}

/// Unilateral row keeping a joint coordinate inside `limits`, if it is outside.
fn limit_row(
    value: f32,
    limits: &Limits,
    template: Row,
    k: f32,
    cfm: f32,
    rows: &mut Vec<Row>,
) {
    if value <= limits.lower {
        rows.push(
            template
                .with_rhs(k * (limits.lower - value), cfm)
                .with_bounds(Bounds::Fixed {
                    lo: 0.0,
                    hi: f32::INFINITY,
                }),
        );
    } else if value >= limits.upper {
        rows.push(
            template
                .with_rhs(k * (limits.upper - value), cfm)
                .with_bounds(Bounds::Fixed {
                    lo: f32::NEG_INFINITY,
                    hi: 0.0,
                }),
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn joint_rows(
    joint: &JointConstraint,
    b1: &Body,
    b2: &Body,
    i1: usize,
    i2: usize,
    k: f32,
    cfm: f32,
    rows: &mut Vec<Row>,
) {
    let zero = Vec3::zeros();
    match &joint.kind {
        JointKind::Ball { anchor1, anchor2 } => {
            let (p1, p2) = (b1.world_point(anchor1), b2.world_point(anchor2));
            point_rows(b1, b2, &p1, &p2, i1, i2, k, cfm, rows);
        }
        JointKind::Hinge {
            anchor1,
            anchor2,
            axis1,
            axis2,
            limits,
            ..
        } => {
            let (p1, p2) = (b1.world_point(anchor1), b2.world_point(anchor2));
            point_rows(b1, b2, &p1, &p2, i1, i2, k, cfm, rows);

            let a1 = b1.world_vector(axis1);
            let a2 = b2.world_vector(axis2);
            let misalignment = a1.cross(&a2);
            let (t1, t2) = orthonormal_basis(&a1);
            for t in [t1, t2] {
                rows.push(Row::new(i1, i2, zero, t, zero, -t).with_rhs(k * misalignment.dot(&t), cfm));
            }

            if let Some(angle) = joint.hinge_angle(b1, b2) {
                let template = Row::new(i1, i2, zero, a1, zero, -a1);
                limit_row(angle, limits, template, k, cfm, rows);
            }
        }
        JointKind::Slider {
            axis1,
            offset,
            reference,
            limits,
        } => {
            // Hold the relative rotation.
            let error = b2.rotation * reference.inverse() * b1.rotation.inverse();
            let twist = error.scaled_axis();
            for e in [Vec3::x(), Vec3::y(), Vec3::z()] {
                rows.push(Row::new(i1, i2, zero, e, zero, -e).with_rhs(k * twist.dot(&e), cfm));
            }

            // Keep the bodies on the axis line.
            let axis = b1.world_vector(axis1);
            let o = b1.world_vector(offset);
            let c = b1.position - b2.position - o;
            let (t1, t2) = orthonormal_basis(&axis);
            for t in [t1, t2] {
                rows.push(
                    Row::new(i1, i2, t, t.cross(&o), -t, zero).with_rhs(-k * c.dot(&t), cfm),
                );
            }

            let template = Row::new(i1, i2, axis, axis.cross(&o), -axis, zero);
            limit_row(axis.dot(&c), limits, template, k, cfm, rows);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn contact_rows(
    contact: &ContactJoint,
    b1: &Body,
    b2: &Body,
    i1: usize,
    i2: usize,
    cfg: &KernelConfig,
    k: f32,
    rows: &mut Vec<Row>,
) {
    let n = contact.geom.normal;
    let p = contact.geom.position;
    let r1 = p.coords - b1.position;
    let r2 = p.coords - b2.position;

    let normal_speed = (b2.point_velocity(&p) - b1.point_velocity(&p)).dot(&n);
    let mut target = k * (contact.geom.depth - cfg.contact_slop).max(0.0);
    if contact.restitution > 0.0 && normal_speed < -cfg.bounce_velocity {
        target = target.max(-contact.restitution * normal_speed);
    }

    let normal_index = rows.len();
    rows.push(
        Row::new(i1, i2, -n, -r1.cross(&n), n, r2.cross(&n))
            .with_rhs(target, cfg.cfm)
            .with_bounds(Bounds::Fixed {
                lo: 0.0,
                hi: f32::INFINITY,
            }),
    );

    if contact.friction > 0.0 {
        let (t1, t2) = orthonormal_basis(&n);
        for t in [t1, t2] {
            rows.push(
                Row::new(i1, i2, -t, -r1.cross(&t), t, r2.cross(&t))
                    .with_rhs(0.0, cfg.cfm)
                    .with_bounds(Bounds::Friction {
                        normal: normal_index,
                        mu: contact.friction,
                    }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn world() -> Dynamics {
        Dynamics::new(
            KernelConfig::default(),
            Vec3::new(0.0, -10.0, 0.0),
            BodyDefaults {
                linear_damping: Damping::default(),
                angular_damping: Damping::default(),
                sleep_allowed: true,
            },
        )
    }

    #[test]
    fn free_fall_matches_semi_implicit_euler() {
        let mut d = world();
        let id = d.add_body(Vec3::new(0.0, 10.0, 0.0));
        d.step(0.1);
        let b = d.body(id).unwrap();
        assert_relative_eq!(b.linear_velocity.y, -1.0, epsilon = 1.0e-5);
        assert_relative_eq!(b.position.y, 9.9, epsilon = 1.0e-5);
    }

    #[test]
    fn non_positive_step_is_ignored() {
        let mut d = world();
        let id = d.add_body(Vec3::new(0.0, 10.0, 0.0));
        d.step(0.0);
        d.step(-1.0);
        assert_eq!(d.body(id).unwrap().position.y, 10.0);
    }

    #[test]
    fn kinematic_bodies_ignore_gravity_but_move() {
        let mut d = world();
        let id = d.add_body(Vec3::zeros());
        {
            let b = d.body_mut(id).unwrap();
            b.kinematic = true;
            b.linear_velocity = Vec3::new(1.0, 0.0, 0.0);
        }
        d.step(0.5);
        let b = d.body(id).unwrap();
        assert_relative_eq!(b.position, Vec3::new(0.5, 0.0, 0.0), epsilon = 1.0e-6);
    }

    #[test]
    fn forces_are_consumed_by_one_step() {
        let mut d = world();
        d.gravity = Vec3::zeros();
        let id = d.add_body(Vec3::zeros());
        d.body_mut(id).unwrap().add_force(&Vec3::new(2.0, 0.0, 0.0));
        d.step(1.0);
        d.step(1.0);
        let b = d.body(id).unwrap();
        assert_relative_eq!(b.linear_velocity.x, 2.0, epsilon = 1.0e-5);
        assert_eq!(b.force, Vec3::zeros());
    }

    #[test]
    fn contact_stops_body_resting_on_ground() {
        let mut d = world();
        let ground = d.add_body(Vec3::zeros());
        d.body_mut(ground).unwrap().kinematic = true;
        let ball = d.add_body(Vec3::new(0.0, 1.0, 0.0));
        d.body_mut(ball).unwrap().linear_velocity = Vec3::new(0.0, -1.0, 0.0);
        d.add_contact(ContactJoint {
            body1: ground,
            body2: ball,
            geom: ContactGeom {
                position: Point3::new(0.0, 0.5, 0.0),
                normal: Vec3::y(),
                depth: 0.0,
            },
            friction: 0.0,
            restitution: 0.0,
        });
        d.step(1.0 / 60.0);
        let v = d.body(ball).unwrap().linear_velocity;
        assert!(v.y.abs() < 1.0e-3, "ball still moving: {v:?}");
        assert_eq!(d.contact_count(), 1);
        d.clear_contacts();
        assert_eq!(d.contact_count(), 0);
    }

    #[test]
    fn ball_joint_holds_pendulum_length() {
        let mut d = world();
        let pivot = d.add_body(Vec3::zeros());
        d.body_mut(pivot).unwrap().kinematic = true;
        let bob = d.add_body(Vec3::new(1.0, 0.0, 0.0));
        d.body_mut(bob).unwrap().sleep_allowed = false;
        d.add_joint(pivot, bob, |a, b| JointConstraint::ball(a, b, &Point3::origin()))
            .unwrap();
        for _ in 0..120 {
            d.step(1.0 / 60.0);
        }
        let bob = d.body(bob).unwrap();
        assert!(bob.position.y < -0.1, "bob did not swing: {:?}", bob.position);
        // Anchor as carried by the bob stays on the pivot.
        let anchor = bob.world_point(&Point3::new(-1.0, 0.0, 0.0));
        assert!(anchor.coords.norm() < 0.1, "anchor drifted to {anchor:?}");
    }

    #[test]
    fn slider_keeps_motion_on_axis() {
        let mut d = world();
        let rail = d.add_body(Vec3::zeros());
        d.body_mut(rail).unwrap().kinematic = true;
        let cart = d.add_body(Vec3::new(0.0, 1.0, 0.0));
        d.body_mut(cart).unwrap().sleep_allowed = false;
        let joint = d
            .add_joint(cart, rail, |a, b| JointConstraint::slider(a, b, &Vec3::y()))
            .unwrap();
        d.joint_mut(joint).unwrap().limits_mut().unwrap().lower = -0.5;
        d.body_mut(cart).unwrap().linear_velocity = Vec3::new(3.0, 0.0, 0.0);
        for _ in 0..180 {
            d.step(1.0 / 60.0);
        }
        let (c, r) = d.joint_bodies(joint).unwrap();
        let pos = d.joint(joint).unwrap().slider_position(c, r).unwrap();
        assert!(c.position.x.abs() < 0.05, "cart left the rail: {:?}", c.position);
        assert!(pos > -0.6, "limit not enforced: {pos}");
    }

    #[test]
    fn removing_body_detaches_joints() {
        let mut d = world();
        let a = d.add_body(Vec3::zeros());
        let b = d.add_body(Vec3::new(1.0, 0.0, 0.0));
        let j = d
            .add_joint(a, b, |x, y| JointConstraint::ball(x, y, &Point3::origin()))
            .unwrap();
        assert_eq!(d.joints_of(a), vec![j]);
        let (_, detached) = d.remove_body(a).unwrap();
        assert_eq!(detached, vec![j]);
        assert!(d.joint(j).unwrap().bodies.is_none());
        assert!(d.joints_of(b).is_empty());
        assert!(d.add_joint(b, b, |x, y| JointConstraint::ball(x, y, &Point3::origin())).is_none());
    }

    #[test]
    fn idle_bodies_fall_asleep_and_wake_on_contact() {
        let mut d = world();
        d.gravity = Vec3::zeros();
        let sleeper = d.add_body(Vec3::zeros());
        for _ in 0..KernelConfig::default().sleep_steps {
            d.step(1.0 / 60.0);
        }
        assert!(!d.body(sleeper).unwrap().is_awake());

        let hitter = d.add_body(Vec3::new(1.0, 0.0, 0.0));
        d.body_mut(hitter).unwrap().linear_velocity = Vec3::new(-1.0, 0.0, 0.0);
        d.add_contact(ContactJoint {
            body1: sleeper,
            body2: hitter,
            geom: ContactGeom {
                position: Point3::new(0.5, 0.0, 0.0),
                normal: Vec3::x(),
                depth: 0.01,
            },
            friction: 0.0,
            restitution: 0.0,
        });
        d.step(1.0 / 60.0);
        assert!(d.body(sleeper).unwrap().is_awake());
    }

    #[test]
    fn sleep_can_be_disallowed() {
        let mut d = world();
        d.gravity = Vec3::zeros();
        d.defaults.sleep_allowed = false;
        let id = d.add_body(Vec3::zeros());
        for _ in 0..50 {
            d.step(1.0 / 60.0);
        }
        assert!(d.body(id).unwrap().is_awake());
    }
}
