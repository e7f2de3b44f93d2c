use convex_physics2d::*;

fn main() -> Result<()> {
    let mut a = Shape::polygon(vec![
        Vec2::new(-0.6, -0.4),
        Vec2::new(0.7, -0.3),
        Vec2::new(0.0, 0.6),
    ])?;
    a.place(Vec2::ZERO, 0.0);
    let mut b = Shape::rectangle(Vec2::splat(0.5));
    b.place(Vec2::new(0.6, 0.3), 25.0);

    let solver = GjkSolver::default();
    let mut query = solver.begin(&a, &b);
    let mut step = 0;
    loop {
        let simplex: Vec<Vec2> = query.simplex().points().iter().map(|p| p.point).collect();
        println!("step {step:2} {:?}: simplex {simplex:?}", query.phase());
        if let Some(polytope) = query.polytope() {
            println!("         polytope with {} edges", polytope.len());
        }
        if !query.step() {
            break;
        }
        step += 1;
    }

    let result = query.result();
    if result.colliding {
        println!("colliding, depth {:.4} along {:?}", result.depth(), result.normal());
    } else {
        println!("separated by {:.4}", result.distance());
    }
    Ok(())
}
