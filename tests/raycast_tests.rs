use approx::assert_relative_eq;
use convex_physics2d::*;

const TARGETS: LayerMask = LayerMask::layer(1);
const SCENERY: LayerMask = LayerMask::layer(2);

fn body_on(layer: LayerMask, shape: Shape, position: Vec2) -> RigidBody {
    let mut shape = shape;
    shape.filter = CollisionFilter::new(layer, LayerMask::ALL);
    RigidBody::fixed().with_shape(shape).with_position(position)
}

struct Scene {
    world: PhysicsWorld,
    ball: BodyHandle,
    crate_box: BodyHandle,
}

fn scene() -> Scene {
    let mut world = PhysicsWorld::new(WorldConfig::zero_gravity());
    let ball = world
        .add_rigidbody(body_on(TARGETS, Shape::circle(Vec2::ZERO, 1.0), Vec2::new(5.0, 0.0)))
        .unwrap();
    let crate_box = world
        .add_rigidbody(body_on(
            SCENERY,
            Shape::rectangle(Vec2::splat(0.5)),
            Vec2::new(0.0, 5.0),
        ))
        .unwrap();
    world.update(1.0 / 60.0);
    Scene {
        world,
        ball,
        crate_box,
    }
}

#[test]
fn ray_hits_circle_at_front_surface() {
    let Scene { world, ball, .. } = scene();
    let ray = Ray2D::new(Vec2::ZERO, Vec2::X);

    let hit = world.raycast(&ray, 100.0).expect("ball lies on the ray");
    assert_eq!(hit.body, Some(ball));
    assert_relative_eq!(hit.distance, 4.0, epsilon = 1e-4);
    assert_relative_eq!(hit.point.x, 4.0, epsilon = 1e-4);
    // The reported normal is the ray direction, not the surface normal.
    assert_eq!(hit.normal, Vec2::X);
}

#[test]
fn ray_hits_box_face() {
    let Scene { world, crate_box, .. } = scene();
    let hit = world
        .raycast(&Ray2D::new(Vec2::ZERO, Vec2::Y), 100.0)
        .expect("box lies on the ray");
    assert_eq!(hit.body, Some(crate_box));
    assert_relative_eq!(hit.distance, 4.5, epsilon = 1e-4);
}

#[test]
fn ray_respects_max_distance_and_misses() {
    let Scene { world, .. } = scene();
    assert!(world.raycast(&Ray2D::new(Vec2::ZERO, Vec2::X), 3.0).is_none());
    assert!(world.raycast(&Ray2D::new(Vec2::ZERO, -Vec2::X), 100.0).is_none());
    assert!(world
        .raycast(&Ray2D::new(Vec2::ZERO, Vec2::new(1.0, 1.0)), 100.0)
        .is_none());
}

#[test]
fn ray_starting_inside_reports_zero_distance() {
    let Scene { world, ball, .. } = scene();
    let hit = world
        .raycast(&Ray2D::new(Vec2::new(5.0, 0.0), Vec2::X), 100.0)
        .expect("origin is inside the ball");
    assert_eq!(hit.body, Some(ball));
    assert_relative_eq!(hit.distance, 0.0);
}

#[test]
fn filtered_ray_skips_other_layers() {
    let Scene { world, crate_box, .. } = scene();
    let up = Ray2D::new(Vec2::ZERO, Vec2::Y);

    assert!(world.raycast_filtered(&up, 100.0, TARGETS).is_none());
    let hit = world
        .raycast_filtered(&up, 100.0, TARGETS | SCENERY)
        .expect("scenery is included");
    assert_eq!(hit.body, Some(crate_box));
}

#[test]
fn point_cast_finds_containing_body() {
    let Scene { world, ball, crate_box } = scene();
    assert_eq!(world.point_cast_default(Vec2::new(5.2, 0.3)), Some(ball));
    assert_eq!(world.point_cast_default(Vec2::new(0.1, 5.4)), Some(crate_box));
    assert_eq!(world.point_cast_default(Vec2::new(2.0, 2.0)), None);
    // Inside the ball's bounds but outside the circle.
    assert_eq!(world.point_cast(Vec2::new(5.9, 0.9), 0.05), None);
}

#[test]
fn region_queries_use_bounds() {
    let Scene { world, ball, crate_box } = scene();

    let near_ball = Aabb::from_center_half_extents(Vec2::new(3.9, 0.0), Vec2::splat(0.2));
    assert_eq!(world.query_shape(&near_ball), Some(ball));

    let empty = Aabb::from_center_half_extents(Vec2::new(-5.0, -5.0), Vec2::ONE);
    assert_eq!(world.query_shape(&empty), None);

    let mut found = Vec::new();
    world.query_region(
        &Aabb::from_center_half_extents(Vec2::splat(2.5), Vec2::splat(4.0)),
        |handle| {
            found.push(handle);
            false
        },
    );
    found.sort();
    let mut expected = vec![ball, crate_box];
    expected.sort();
    assert_eq!(found, expected);
}

#[test]
fn queries_ignore_unflushed_bodies() {
    let mut world = PhysicsWorld::new(WorldConfig::zero_gravity());
    let pending = world
        .add_rigidbody(body_on(TARGETS, Shape::circle(Vec2::ZERO, 1.0), Vec2::new(5.0, 0.0)))
        .unwrap();
    let ray = Ray2D::new(Vec2::ZERO, Vec2::X);
    assert!(world.raycast(&ray, 100.0).is_none());

    world.update(1.0 / 60.0);
    assert_eq!(world.raycast(&ray, 100.0).and_then(|hit| hit.body), Some(pending));
}
