//! Separating axis test for convex polygons.
//!
//! Cheaper than GJK for polygon pairs that only need a yes/no answer, and
//! exact enough to cross-check GJK/EPA results.

use glam::Vec2;

use crate::utils::math::perp;

fn project(vertices: &[Vec2], axis: Vec2) -> (f32, f32) {
    vertices
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            let p = v.dot(axis);
            (lo.min(p), hi.max(p))
        })
}

fn centroid(vertices: &[Vec2]) -> Vec2 {
    vertices.iter().copied().sum::<Vec2>() / vertices.len().max(1) as f32
}

/// Whether two convex polygons overlap. Touching counts as overlapping.
pub fn intersects(a: &[Vec2], b: &[Vec2]) -> bool {
    min_translation(a, b).is_some()
}

/// Minimum translation as `(normal, depth)`, with `normal` pointing from `a`
/// towards `b`. `None` when a separating axis exists.
pub fn min_translation(a: &[Vec2], b: &[Vec2]) -> Option<(Vec2, f32)> {
    if a.len() < 3 || b.len() < 3 {
        return None;
    }

    let mut best = (Vec2::ZERO, f32::INFINITY);
    for polygon in [a, b] {
        for i in 0..polygon.len() {
            let edge = polygon[(i + 1) % polygon.len()] - polygon[i];
            let Some(axis) = perp(edge).try_normalize() else {
                continue;
            };

            let (min_a, max_a) = project(a, axis);
            let (min_b, max_b) = project(b, axis);
            let overlap = (max_a - min_b).min(max_b - min_a);
            if overlap < 0.0 {
                return None;
            }
            if overlap < best.1 {
                best = (axis, overlap);
            }
        }
    }

    let (mut normal, depth) = best;
    if (centroid(b) - centroid(a)).dot(normal) < 0.0 {
        normal = -normal;
    }
    Some((normal, depth))
}
