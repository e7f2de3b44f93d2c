use convex_physics2d::*;

fn main() -> Result<()> {
    let config = WorldConfig {
        solver_iterations: 20,
        ..WorldConfig::default()
    };
    let mut engine = PhysicsEngine::new(1.0 / 60.0, config);

    engine.add_body(RigidBody::fixed().with_shape(Shape::rectangle(Vec2::new(10.0, 0.5))))?;

    let mut boxes = Vec::new();
    for level in 0..5 {
        let body = RigidBody::new(1.0, f32::INFINITY)?
            .with_shape(Shape::rectangle(Vec2::splat(0.5)))
            .with_position(Vec2::new(0.0, 1.0 + level as f32 * 1.05));
        boxes.push(engine.add_body(body)?);
    }

    for _ in 0..300 {
        engine.step(1.0 / 60.0);
    }

    for (level, handle) in boxes.iter().enumerate() {
        if let Some(body) = engine.get_body(*handle) {
            println!(
                "box {level}: y = {:.3}, asleep = {}",
                body.position.y,
                !engine.world().is_active(*handle)
            );
        }
    }
    println!("{:?}", engine.world().last_profile());
    Ok(())
}
