//! Explicit Minkowski difference `A - B`, used for debugging and for
//! checking GJK results against a brute-force answer.

use glam::Vec2;

use super::hull;
use crate::{core::shape::Shape, utils::math};

/// Convex outline of `A - B`. Circles are approximated by their debug outline.
///
/// Falls back to the raw difference cloud when it spans no area.
pub fn difference(a: &Shape, b: &Shape) -> Vec<Vec2> {
    let mut outline_a = Vec::new();
    let mut outline_b = Vec::new();
    a.debug_vertices(&mut outline_a);
    b.debug_vertices(&mut outline_b);

    let cloud: Vec<Vec2> = outline_a
        .iter()
        .flat_map(|pa| outline_b.iter().map(move |pb| *pa - *pb))
        .collect();

    hull::convex_hull(&cloud).unwrap_or(cloud)
}

/// Whether the origin lies inside the (sampled) Minkowski difference.
pub fn contains_origin(a: &Shape, b: &Shape) -> bool {
    math::polygon_contains(&difference(a, b), Vec2::ZERO)
}
