//! Planar geometry helpers layered on top of `glam`.

use glam::{Affine2, Vec2};

/// Z component of the 3D cross product of two planar vectors.
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Counter-clockwise quarter turn: `(x, y) -> (-y, x)`.
#[inline]
pub fn perp(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Which side of the directed line `a -> b` the point `c` lies on: `1` left, `-1` right, `0` on it.
pub fn which_side(a: Vec2, b: Vec2, c: Vec2) -> i32 {
    let side = cross(b - a, c - a);
    if side > 0.0 {
        1
    } else if side < 0.0 {
        -1
    } else {
        0
    }
}

/// Closest point to the origin on the segment `a-b`, clamped to the endpoints.
pub fn closest_point_to_origin(a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let length_sq = ab.length_squared();
    if length_sq < f32::EPSILON {
        return a;
    }

    let t = ab.dot(-a) / length_sq;
    if t < 0.0 {
        a
    } else if t > 1.0 {
        b
    } else {
        a + ab * t
    }
}

/// Foot of the perpendicular from the origin onto the infinite line through `a` and `b`.
///
/// Returns zero when the two points coincide.
pub fn perpendicular_to_origin(a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let length_sq = ab.length_squared();
    if length_sq < f32::EPSILON {
        return Vec2::ZERO;
    }
    a + ab * (ab.dot(-a) / length_sq)
}

/// Point-in-convex-polygon test using a consistent winding sign.
///
/// Works for either winding. Points on an edge count as inside; fewer than three
/// vertices never contain anything.
pub fn polygon_contains(points: &[Vec2], point: Vec2) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }

    let inner = which_side(points[0], points[1], points[2]);
    for i in 0..n {
        let (a, b) = (points[i], points[(i + 1) % n]);
        let side = which_side(a, b, point);
        if side == 0 {
            // Collinear with this edge: inside only when it lies on the segment itself.
            return (point - a).dot(point - b) <= 0.0;
        }
        if side != inner {
            return false;
        }
    }
    true
}

/// Builds the body-to-world transform from a position, a rotation in degrees
/// (counter-clockwise) and a per-axis scale.
pub fn body_matrix(position: Vec2, rotation_deg: f32, scale: Vec2) -> Affine2 {
    Affine2::from_scale_angle_translation(scale, rotation_deg.to_radians(), position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn closest_point_clamps_to_segment_ends() {
        let p = closest_point_to_origin(Vec2::new(1.0, 1.0), Vec2::new(3.0, 1.0));
        assert_eq!(p, Vec2::new(1.0, 1.0));

        let p = closest_point_to_origin(Vec2::new(-1.0, 2.0), Vec2::new(1.0, 2.0));
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 2.0);
    }

    #[test]
    fn perpendicular_ignores_segment_bounds() {
        let p = perpendicular_to_origin(Vec2::new(1.0, 1.0), Vec2::new(3.0, 1.0));
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 1.0);
    }

    #[test]
    fn polygon_contains_handles_boundary_and_winding() {
        let ccw = [
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ];
        let mut cw = ccw;
        cw.reverse();

        for square in [&ccw[..], &cw[..]] {
            assert!(polygon_contains(square, Vec2::ZERO));
            assert!(polygon_contains(square, Vec2::new(1.0, 0.0)), "edge counts");
            assert!(!polygon_contains(square, Vec2::new(1.5, 0.0)));
            assert!(
                !polygon_contains(square, Vec2::new(1.0, 5.0)),
                "collinear with an edge but beyond it"
            );
        }
        assert!(!polygon_contains(&ccw[..2], Vec2::ZERO));
    }

    #[test]
    fn body_matrix_rotates_counter_clockwise() {
        let m = body_matrix(Vec2::new(2.0, 0.0), 90.0, Vec2::ONE);
        let p = m.transform_point2(Vec2::X);
        assert_relative_eq!(p.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-5);
    }
}
