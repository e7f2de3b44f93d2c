use convex_physics2d::*;

fn main() -> Result<()> {
    let mut world = PhysicsWorld::new(WorldConfig::zero_gravity());
    for i in 0..5 {
        world.add_rigidbody(
            RigidBody::fixed()
                .with_shape(Shape::circle(Vec2::ZERO, 0.5))
                .with_position(Vec2::new(2.0 + i as f32 * 1.5, i as f32 * 0.4 - 0.8)),
        )?;
    }
    world.update(1.0 / 60.0);

    for angle in [-20.0f32, -10.0, 0.0, 10.0, 20.0] {
        let direction = Vec2::from_angle(angle.to_radians());
        let ray = Ray2D::new(Vec2::ZERO, direction);
        match world.raycast(&ray, 20.0) {
            Some(hit) => println!(
                "{angle:>5}°: hit {:?} at {:.2} ({:?})",
                hit.body, hit.distance, hit.point
            ),
            None => println!("{angle:>5}°: miss"),
        }
    }

    let picked = world.point_cast_default(Vec2::new(3.5, -0.4));
    println!("point cast picked {picked:?}");
    Ok(())
}
