use convex_physics2d::*;

fn main() -> Result<()> {
    let mut engine = PhysicsEngine::new(1.0 / 60.0, WorldConfig::default());

    engine.add_body(RigidBody::fixed().with_shape(Shape::rectangle(Vec2::new(10.0, 0.5))))?;

    let ball = engine.add_body(
        RigidBody::new(1.0, 0.5)?
            .with_shape(Shape::circle(Vec2::ZERO, 0.5))
            .with_position(Vec2::new(0.0, 4.0)),
    )?;

    for frame in 0..180 {
        engine.step(1.0 / 60.0);
        if frame % 30 == 0 {
            if let Some(body) = engine.get_body(ball) {
                println!("frame {frame:3}: ball at {:?}", body.position);
            }
        }
    }
    Ok(())
}
