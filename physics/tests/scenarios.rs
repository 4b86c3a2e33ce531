use std::cell::Cell;
use std::rc::Rc;

use approx::assert_relative_eq;
use physics::{
    Collider, Joint, KernelConfig, Physics, PhysicsError, Point3, Shape, ShapeType, Vec3, World,
    WorldDesc,
};

const DT: f32 = 1.0 / 60.0;

fn world_with(desc: WorldDesc) -> World {
    Physics::init().new_world(desc).unwrap()
}

fn sphere_at(world: &World, position: Vec3, radius: f32) -> (Collider, Shape) {
    let collider = world.new_collider(position);
    let shape = Shape::sphere(radius);
    collider.add_shape(&shape);
    (collider, shape)
}

fn ground(world: &World) -> (Collider, Shape) {
    let collider = world.new_collider(Vec3::zeros());
    collider.set_kinematic(true);
    let shape = Shape::cuboid(20.0, 1.0, 20.0);
    collider.add_shape(&shape);
    (collider, shape)
}

fn overlaps(a: &physics::Aabb, b: &physics::Aabb) -> bool {
    (0..3).all(|i| a.mins[i] <= b.maxs[i] && b.mins[i] <= a.maxs[i])
}

#[test]
fn falling_sphere_reaches_ground() {
    let world = world_with(WorldDesc::default().with_gravity(Vec3::new(0.0, -9.8, 0.0)));
    let (ball, ball_shape) = sphere_at(&world, Vec3::new(0.0, 10.0, 0.0), 0.5);
    let (_ground, ground_shape) = ground(&world);

    let mut last_y = ball.position().y;
    let mut contacts = 0;
    for _ in 0..600 {
        if overlaps(&ball.aabb(), &ground_shape.aabb()) {
            contacts = world.collide(&ball_shape, &ground_shape, None, None);
            break;
        }
        world.update(DT);
        let y = ball.position().y;
        assert!(y < last_y, "sphere rose from {last_y} to {y} before contact");
        last_y = y;
    }
    assert!(contacts > 0);
    assert!(contacts <= 4);
}

#[test]
fn sphere_comes_to_rest_on_ground() {
    let world = world_with(WorldDesc::default());
    let (ball, _) = sphere_at(&world, Vec3::new(0.0, 3.0, 0.0), 0.5);
    let (ground, _) = ground(&world);
    ball.set_friction(0.5);
    ground.set_friction(0.5);
    for _ in 0..300 {
        world.update(DT);
    }
    assert_relative_eq!(ball.position().y, 1.0, epsilon = 0.05);
    assert_relative_eq!(ground.position(), Vec3::zeros());
    assert_eq!(world.contact_count(), 0);
}

#[test]
fn disabled_tags_never_collide() {
    let world = world_with(WorldDesc::default().with_tags(["A", "B"]));
    world.disable_collision_between("A", "B").unwrap();
    let (a, sa) = sphere_at(&world, Vec3::zeros(), 1.0);
    let (b, sb) = sphere_at(&world, Vec3::new(0.2, 0.0, 0.0), 1.0);
    a.set_tag(Some("A")).unwrap();
    b.set_tag(Some("B")).unwrap();

    assert_eq!(world.collide(&sa, &sb, None, None), 0);
    assert_eq!(world.collide(&sb, &sa, Some(1.0), Some(1.0)), 0);
    assert_eq!(world.contact_count(), 0);

    b.set_tag(None).unwrap();
    assert!(world.collide(&sa, &sb, None, None) > 0);

    b.set_tag(Some("B")).unwrap();
    world.enable_collision_between("B", "A").unwrap();
    assert!(world.collide(&sa, &sb, None, None) > 0);
}

#[test]
fn tag_mask_stays_symmetric() {
    let names: Vec<String> = (0..16).map(|i| format!("tag{i}")).collect();
    let world = world_with(WorldDesc::default().with_tags(names.clone()));
    for (i, a) in names.iter().enumerate() {
        for b in &names[i..] {
            world.disable_collision_between(a, b).unwrap();
            assert!(!world.is_collision_enabled_between(a, b).unwrap());
            assert!(!world.is_collision_enabled_between(b, a).unwrap());
            world.enable_collision_between(b, a).unwrap();
            assert!(world.is_collision_enabled_between(a, b).unwrap());
            assert!(world.is_collision_enabled_between(b, a).unwrap());
        }
    }
    assert_eq!(
        world.disable_collision_between("tag0", "nope"),
        Err(PhysicsError::InvalidTag("nope".into()))
    );
}

#[test]
fn too_many_tags_fail_at_construction() {
    let names: Vec<String> = (0..17).map(|i| i.to_string()).collect();
    let err = Physics::init()
        .new_world(WorldDesc::default().with_tags(names))
        .unwrap_err();
    assert_eq!(err, PhysicsError::TooManyTags(17));
}

#[test]
fn overlaps_drain_once_per_pair() {
    let world = world_with(WorldDesc::default().with_gravity(Vec3::zeros()));
    let shapes: Vec<(Collider, Shape)> = (0..3)
        .map(|i| sphere_at(&world, Vec3::new(i as f32, 0.0, 0.0), 0.6))
        .collect();

    world.compute_overlaps();
    assert_eq!(world.contact_count(), 0);
    let mut seen = Vec::new();
    while let Some((a, b)) = world.next_overlap() {
        assert_ne!(a, b);
        seen.push((a, b));
    }
    assert_eq!(seen.len(), 2);
    assert!(world.next_overlap().is_none());

    let (s0, s1, s2) = (&shapes[0].1, &shapes[1].1, &shapes[2].1);
    let has = |x: &Shape, y: &Shape| {
        seen.iter()
            .filter(|(a, b)| (a == x && b == y) || (a == y && b == x))
            .count()
    };
    assert_eq!(has(s0, s1), 1);
    assert_eq!(has(s1, s2), 1);
    assert_eq!(has(s0, s2), 0);

    // Recomputing replaces rather than appends.
    world.compute_overlaps();
    world.compute_overlaps();
    let mut count = 0;
    while world.next_overlap().is_some() {
        count += 1;
    }
    assert_eq!(count, 2);
}

#[test]
fn caller_resolves_drained_overlaps() {
    let world = world_with(WorldDesc::default().with_gravity(Vec3::zeros()));
    let (_a, _) = sphere_at(&world, Vec3::zeros(), 1.0);
    let (_b, _) = sphere_at(&world, Vec3::new(1.5, 0.0, 0.0), 1.0);
    let resolved = Cell::new(0);
    world.update_with(DT, |w| {
        w.compute_overlaps();
        while let Some((a, b)) = w.next_overlap() {
            resolved.set(resolved.get() + w.collide(&a, &b, Some(0.0), Some(0.0)));
        }
        assert_eq!(w.contact_count(), resolved.get());
    });
    assert!(resolved.get() > 0);
    assert_eq!(world.contact_count(), 0);
}

#[test]
fn contacts_are_cleared_after_update() {
    let world = world_with(WorldDesc::default());
    let _a = sphere_at(&world, Vec3::zeros(), 1.0);
    let _b = sphere_at(&world, Vec3::new(1.0, 0.0, 0.0), 1.0);
    let (_g, _) = ground(&world);
    world.update(DT);
    assert_eq!(world.contact_count(), 0);
}

#[test]
fn restitution_override_bounces() {
    let bounce = |restitution: Option<f32>| {
        let world = world_with(WorldDesc::default());
        let (ball, ball_shape) = sphere_at(&world, Vec3::new(0.0, 0.99, 0.0), 0.5);
        let (_ground, ground_shape) = ground(&world);
        ball.set_linear_velocity(Vec3::new(0.0, -5.0, 0.0));
        world.update_with(DT, |w| {
            assert!(w.collide(&ball_shape, &ground_shape, None, restitution) > 0);
        });
        ball.linear_velocity().y
    };
    assert!(bounce(Some(1.0)) > 4.0);
    assert!(bounce(None) < 1.0);
    assert!(bounce(Some(-1.0)) < 1.0);
}

#[test]
fn joint_links_colliders_of_one_world() {
    let world = world_with(WorldDesc::default());
    let a = world.new_collider(Vec3::zeros());
    let b = world.new_collider(Vec3::new(0.0, -1.0, 0.0));
    a.set_kinematic(true);
    let joint = Joint::ball(&a, &b, Point3::origin());
    assert_eq!(joint.colliders(), Some((a.clone(), b.clone())));

    b.set_linear_velocity(Vec3::new(1.0, 0.0, 0.0));
    for _ in 0..120 {
        world.update(DT);
    }
    // The pendulum bob stays one unit from the pivot.
    assert_relative_eq!(b.position().norm(), 1.0, epsilon = 0.05);
}

#[test]
#[should_panic(expected = "Joint bodies must exist in the same World")]
fn joint_across_worlds_is_fatal() {
    let physics = Physics::init();
    let w1 = physics.new_world(WorldDesc::default()).unwrap();
    let w2 = physics.new_world(WorldDesc::default()).unwrap();
    let a = w1.new_collider(Vec3::zeros());
    let b = w2.new_collider(Vec3::zeros());
    Joint::hinge(&a, &b, Point3::origin(), Vec3::y());
}

#[test]
fn raycast_reports_every_crossed_shape() {
    let world = world_with(WorldDesc::default().with_gravity(Vec3::zeros()));
    let (_a, near) = sphere_at(&world, Vec3::new(2.0, 0.0, 0.0), 0.5);
    let (_b, far) = sphere_at(&world, Vec3::new(6.0, 0.0, 0.0), 0.5);
    let (_c, _off) = sphere_at(&world, Vec3::new(4.0, 3.0, 0.0), 0.5);

    let mut hits = Vec::new();
    world.raycast(Point3::origin(), Point3::new(10.0, 0.0, 0.0), |shape, point, normal| {
        hits.push((shape.clone(), point, normal));
    });
    assert_eq!(hits.len(), 2);
    hits.sort_by(|x, y| x.1.x.total_cmp(&y.1.x));
    assert_eq!(hits[0].0, near);
    assert_eq!(hits[1].0, far);
    assert_relative_eq!(hits[0].1, Point3::new(1.5, 0.0, 0.0), epsilon = 1.0e-4);
    assert_relative_eq!(hits[1].2, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1.0e-4);

    let mut short = 0;
    world.raycast(Point3::origin(), Point3::new(1.0, 0.0, 0.0), |_, _, _| short += 1);
    assert_eq!(short, 0);
}

#[test]
fn mesh_shape_collides_with_sphere() {
    let world = world_with(WorldDesc::default().with_gravity(Vec3::zeros()));
    let vertices = [
        Point3::new(-5.0, 0.0, -5.0),
        Point3::new(5.0, 0.0, -5.0),
        Point3::new(5.0, 0.0, 5.0),
        Point3::new(-5.0, 0.0, 5.0),
    ];
    let floor = Shape::mesh(&vertices, &[0, 2, 1, 0, 3, 2]).unwrap();
    assert_eq!(floor.shape_type(), ShapeType::Mesh);
    let static_body = world.new_collider(Vec3::zeros());
    static_body.set_kinematic(true);
    static_body.add_shape(&floor);
    let (_ball, ball_shape) = sphere_at(&world, Vec3::new(0.0, 0.4, 0.0), 0.5);
    assert!(world.collide(&ball_shape, &floor, None, None) > 0);
}

#[test]
fn user_data_survives_teardown() {
    let world = world_with(WorldDesc::default());
    let (collider, shape) = sphere_at(&world, Vec3::zeros(), 1.0);
    shape.set_user_data(Some(Rc::new("hull")));
    world.destroy();
    assert!(collider.is_destroyed());
    assert!(shape.collider().is_none());
    let data = shape.user_data().unwrap();
    assert_eq!(data.downcast_ref::<&str>(), Some(&"hull"));
}

#[test]
fn sleeping_bodies_wake_on_contact() {
    let world = world_with(WorldDesc::default().with_gravity(Vec3::zeros()));
    let (sleeper, _) = sphere_at(&world, Vec3::zeros(), 0.5);
    let (mover, _) = sphere_at(&world, Vec3::new(-3.0, 0.0, 0.0), 0.5);
    sleeper.set_awake(false);
    mover.set_linear_velocity(Vec3::new(5.0, 0.0, 0.0));
    for _ in 0..60 {
        world.update(DT);
    }
    assert!(sleeper.position().x > 0.0);
}

#[test]
fn sleeping_pairs_still_overlap() {
    let world = world_with(WorldDesc::default().with_gravity(Vec3::zeros()));
    let (a, sa) = sphere_at(&world, Vec3::zeros(), 1.0);
    let (b, sb) = sphere_at(&world, Vec3::new(0.5, 0.0, 0.0), 1.0);
    a.set_awake(false);
    b.set_awake(false);

    world.compute_overlaps();
    // The earlier registered shape leads the pair.
    assert_eq!(world.next_overlap(), Some((sa, sb)));
    assert!(world.next_overlap().is_none());

    // Default resolution leaves the pair alone; nothing wakes up.
    world.update(DT);
    assert!(!a.is_awake());
    assert!(!b.is_awake());
}

#[test]
fn collide_uses_combined_friction() {
    let slide = |friction: Option<f32>| {
        let world = world_with(WorldDesc::default());
        let block = world.new_collider(Vec3::new(0.0, 0.99, 0.0));
        let block_shape = Shape::cuboid(1.0, 1.0, 1.0);
        block.add_shape(&block_shape);
        let (floor, floor_shape) = ground(&world);
        block.set_friction(0.5);
        floor.set_friction(0.5);
        block.set_linear_velocity(Vec3::new(3.0, 0.0, 0.0));
        for _ in 0..20 {
            world.update_with(DT, |w| {
                w.collide(&block_shape, &floor_shape, friction, None);
            });
        }
        block.linear_velocity().x
    };
    // 0.5 * 9.81 m/s^2 of deceleration for a third of a second.
    assert!(slide(None) < 2.0);
    assert!(slide(Some(0.0)) > 2.9);
}

#[test]
fn collide_honors_kernel_contact_limit() {
    let contacts = |physics: Physics| {
        let world = physics.new_world(WorldDesc::default()).unwrap();
        let block = world.new_collider(Vec3::new(0.0, 0.9, 0.0));
        let block_shape = Shape::cuboid(1.0, 1.0, 1.0);
        block.add_shape(&block_shape);
        let (_floor, floor_shape) = ground(&world);
        world.collide(&block_shape, &floor_shape, None, None)
    };
    let single = Physics::with_config(KernelConfig {
        max_contacts: 1,
        ..KernelConfig::default()
    });
    assert!(contacts(Physics::init()) > 1);
    assert_eq!(contacts(single), 1);
}
