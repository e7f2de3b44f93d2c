use approx::assert_relative_eq;
use convex_physics2d::collision::{minkowski, sat};
use convex_physics2d::*;

fn placed(mut shape: Shape, position: Vec2, rotation: f32) -> Shape {
    shape.place(position, rotation);
    shape
}

fn triangle() -> Shape {
    Shape::polygon(vec![
        Vec2::new(-0.6, -0.4),
        Vec2::new(0.7, -0.3),
        Vec2::new(0.0, 0.6),
    ])
    .expect("triangle has three vertices")
}

fn pentagon() -> Shape {
    let points: Vec<Vec2> = (0..5)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::TAU / 5.0;
            Vec2::new(angle.cos(), angle.sin()) * 0.55
        })
        .collect();
    Shape::polygon(points).expect("pentagon has five vertices")
}

/// Largest gap along any edge normal of either polygon; a lower bound on
/// their true distance.
fn separating_gap(a: &[Vec2], b: &[Vec2]) -> f32 {
    let mut best = f32::NEG_INFINITY;
    for polygon in [a, b] {
        for i in 0..polygon.len() {
            let edge = polygon[(i + 1) % polygon.len()] - polygon[i];
            let axis = Vec2::new(-edge.y, edge.x).normalize();
            let project = |points: &[Vec2]| {
                points.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
                    (lo.min(p.dot(axis)), hi.max(p.dot(axis)))
                })
            };
            let (min_a, max_a) = project(a);
            let (min_b, max_b) = project(b);
            best = best.max((min_b - max_a).max(min_a - max_b));
        }
    }
    best
}

#[test]
fn gjk_agrees_with_sat_on_polygon_grid() {
    let solver = GjkSolver::default();
    let makers: [fn() -> Shape; 3] = [|| Shape::rectangle(Vec2::splat(0.5)), triangle, pentagon];
    let mut checked = 0;

    for make_a in makers {
        for make_b in makers {
            for rotation in [0.0, 30.0, 75.0] {
                for ix in -5..=5 {
                    for iy in -5..=5 {
                        let offset = Vec2::new(ix as f32 * 0.31, iy as f32 * 0.27);
                        let a = placed(make_a(), Vec2::ZERO, 0.0);
                        let b = placed(make_b(), offset, rotation);
                        let (va, vb) = (a.vertices().unwrap(), b.vertices().unwrap());

                        let overlap = sat::min_translation(va, vb).map(|(_, depth)| depth);
                        let clear = match overlap {
                            Some(depth) => depth > 0.05,
                            None => separating_gap(va, vb) > 0.05,
                        };
                        if !clear {
                            continue;
                        }

                        let result = solver.query(&a, &b);
                        assert_eq!(
                            result.colliding,
                            overlap.is_some(),
                            "offset {offset:?}, rotation {rotation}"
                        );
                        checked += 1;
                    }
                }
            }
        }
    }
    assert!(checked > 500, "only {checked} configurations checked");
}

fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let t = ((p - a).dot(ab) / ab.length_squared()).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn boundary_distance(polygon: &[Vec2], p: Vec2) -> f32 {
    (0..polygon.len())
        .map(|i| point_segment_distance(p, polygon[i], polygon[(i + 1) % polygon.len()]))
        .fold(f32::MAX, f32::min)
}

/// Exact separation of two disjoint convex polygons.
fn polygon_distance(a: &[Vec2], b: &[Vec2]) -> f32 {
    let a_to_b = a.iter().map(|p| boundary_distance(b, *p));
    let b_to_a = b.iter().map(|p| boundary_distance(a, *p));
    a_to_b.chain(b_to_a).fold(f32::MAX, f32::min)
}

/// Support of `A - B` along `n`.
fn difference_support(a: &[Vec2], b: &[Vec2], n: Vec2) -> f32 {
    let max_a = a.iter().map(|p| p.dot(n)).fold(f32::MIN, f32::max);
    let min_b = b.iter().map(|p| p.dot(n)).fold(f32::MAX, f32::min);
    max_a - min_b
}

#[test]
fn closest_points_match_polygon_distance() {
    let solver = GjkSolver::default();
    let makers: [fn() -> Shape; 2] = [triangle, pentagon];
    let mut checked = 0;

    for make_a in makers {
        for make_b in makers {
            for rotation in [0.0, 17.0, 45.0, 120.0] {
                for ix in -6..=6 {
                    for iy in -6..=6 {
                        let offset = Vec2::new(ix as f32 * 0.29, iy as f32 * 0.31);
                        let a = placed(make_a(), Vec2::ZERO, 20.0);
                        let b = placed(make_b(), offset, rotation);
                        let (va, vb) = (a.vertices().unwrap(), b.vertices().unwrap());
                        if separating_gap(va, vb) <= 0.05 {
                            continue;
                        }

                        let result = solver.query(&a, &b);
                        assert!(!result.colliding, "offset {offset:?}, rotation {rotation}");
                        let expected = polygon_distance(va, vb);
                        assert!(
                            (result.distance() - expected).abs() < 1e-3,
                            "offset {offset:?}, rotation {rotation}: {} vs {expected}",
                            result.distance()
                        );
                        assert!(boundary_distance(va, result.closest_on_a) < 1e-3);
                        assert!(boundary_distance(vb, result.closest_on_b) < 1e-3);
                        checked += 1;
                    }
                }
            }
        }
    }
    assert!(checked > 500, "only {checked} configurations checked");
}

#[test]
fn epa_depth_is_a_separating_face() {
    let solver = GjkSolver::default();
    let mut checked = 0;

    for rotation in [0.0, 30.0, 75.0, 160.0] {
        for ix in -4..=4 {
            for iy in -4..=4 {
                let offset = Vec2::new(ix as f32 * 0.17, iy as f32 * 0.13);
                let a = placed(triangle(), Vec2::ZERO, 0.0);
                let b = placed(triangle(), offset, rotation);
                let (va, vb) = (a.vertices().unwrap(), b.vertices().unwrap());
                let Some((_, sat_depth)) = sat::min_translation(va, vb) else {
                    continue;
                };
                if sat_depth < 0.05 {
                    continue;
                }

                let result = solver.query(&a, &b);
                assert!(result.colliding);
                // Never shallower than the minimum translation, and always
                // an actual face of the difference along the reported normal.
                assert!(result.depth() >= sat_depth - 1e-3, "offset {offset:?}");
                let support = difference_support(va, vb, result.normal());
                assert!(
                    (support - result.depth()).abs() < 1e-3,
                    "offset {offset:?}, rotation {rotation}: face {support} vs depth {}",
                    result.depth()
                );
                checked += 1;
            }
        }
    }
    assert!(checked > 50, "only {checked} configurations checked");
}

#[test]
fn gjk_agrees_with_minkowski_hull() {
    let solver = GjkSolver::default();
    let a = placed(pentagon(), Vec2::ZERO, 0.0);
    for (x, expected) in [(0.3, true), (0.8, true), (1.4, false), (-2.0, false)] {
        let b = placed(triangle(), Vec2::new(x, 0.1), 10.0);
        assert_eq!(minkowski::contains_origin(&a, &b), expected, "x = {x}");
        assert_eq!(solver.query(&a, &b).colliding, expected, "x = {x}");
    }
}

#[test]
fn epa_depth_matches_sat_for_boxes() {
    let solver = GjkSolver::default();
    let a = placed(Shape::rectangle(Vec2::splat(0.5)), Vec2::ZERO, 0.0);

    for offset in [
        Vec2::new(0.7, 0.1),
        Vec2::new(-0.3, 0.85),
        Vec2::new(0.5, -0.6),
        Vec2::new(-0.9, -0.2),
    ] {
        let b = placed(Shape::rectangle(Vec2::splat(0.5)), offset, 0.0);
        let (sat_normal, sat_depth) =
            sat::min_translation(a.vertices().unwrap(), b.vertices().unwrap()).unwrap();

        let result = solver.query(&a, &b);
        assert!(result.colliding);
        assert_relative_eq!(result.depth(), sat_depth, epsilon = 1e-3);
        assert!(result.normal().dot(sat_normal) > 0.99, "offset {offset:?}");
    }
}

#[test]
fn unit_squares_at_point_six_are_separated_by_point_two() {
    let a = placed(Shape::rectangle(Vec2::splat(0.5)), Vec2::new(-0.6, 0.0), 0.0);
    let b = placed(Shape::rectangle(Vec2::splat(0.5)), Vec2::new(0.6, 0.0), 0.0);

    let result = GjkSolver::default().query(&a, &b);
    assert!(!result.colliding);
    assert_relative_eq!(result.distance(), 0.2, epsilon = 1e-4);
}

#[test]
fn unit_squares_at_point_four_penetrate_by_point_two() {
    let a = placed(Shape::rectangle(Vec2::splat(0.5)), Vec2::new(-0.4, 0.0), 0.0);
    let b = placed(Shape::rectangle(Vec2::splat(0.5)), Vec2::new(0.4, 0.0), 0.0);

    let result = GjkSolver::default().query(&a, &b);
    assert!(result.colliding);
    assert_relative_eq!(result.penetration.length(), 0.2, epsilon = 1e-4);
    assert_relative_eq!(result.penetration.y, 0.0, epsilon = 1e-4);
    assert!(result.edge.is_some());
}

#[test]
fn circle_against_box() {
    let solver = GjkSolver::default();
    let ground = placed(Shape::rectangle(Vec2::new(2.0, 0.5)), Vec2::ZERO, 0.0);

    let resting = placed(Shape::circle(Vec2::ZERO, 0.5), Vec2::new(0.3, 0.9), 0.0);
    let result = solver.query(&ground, &resting);
    assert!(result.colliding);
    assert_relative_eq!(result.depth(), 0.1, epsilon = 0.03);
    assert!(result.normal().y > 0.9);

    let floating = placed(Shape::circle(Vec2::ZERO, 0.5), Vec2::new(0.3, 1.5), 0.0);
    let result = solver.query(&ground, &floating);
    assert!(!result.colliding);
    assert_relative_eq!(result.distance(), 0.5, epsilon = 0.03);
}

#[test]
fn stepping_exposes_every_stage() {
    let a = placed(Shape::rectangle(Vec2::splat(0.5)), Vec2::new(-0.4, 0.0), 0.0);
    let b = placed(Shape::rectangle(Vec2::splat(0.5)), Vec2::new(0.4, 0.0), 0.0);

    let solver = GjkSolver::default();
    let mut query = solver.begin(&a, &b);
    assert_eq!(query.phase(), GjkPhase::Seed);

    let mut saw_polytope = false;
    let mut steps = 0;
    while query.step() {
        steps += 1;
        assert!(query.simplex().len() <= 3);
        saw_polytope |= query.polytope().is_some();
        assert!(steps < 100, "query does not terminate");
    }
    assert!(saw_polytope);
    assert_eq!(query.phase(), GjkPhase::Done);
    assert_eq!(*query.result(), solver.query(&a, &b));
}

#[test]
fn hull_shapes_collide_like_their_polygons() {
    let cloud = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.5, 0.2),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(0.4, 0.6),
    ];
    let hull = Shape::convex_hull(&cloud).expect("cloud spans an area");
    assert_eq!(hull.vertices().unwrap().len(), 4);

    let probe = placed(Shape::circle(Vec2::ZERO, 0.2), Vec2::new(1.1, 0.5), 0.0);
    assert!(GjkSolver::default().query(&hull, &probe).colliding);

    let collinear = [Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0)];
    assert_eq!(
        Shape::convex_hull(&collinear).unwrap_err(),
        PhysicsError::DegenerateHull
    );
}
