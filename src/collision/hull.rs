//! Graham scan convex hull.

use glam::Vec2;

use crate::utils::math::cross;

/// Counter-clockwise hull of `points` with collinear points removed.
///
/// Returns `None` when the points do not enclose any area.
pub fn convex_hull(points: &[Vec2]) -> Option<Vec<Vec2>> {
    if points.len() < 3 {
        return None;
    }

    // Lowest y, then lowest x.
    let pivot = points.iter().copied().min_by(|a, b| {
        a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x))
    })?;

    let mut rest: Vec<(f32, f32, Vec2)> = points
        .iter()
        .copied()
        .filter(|p| p.distance_squared(pivot) > f32::EPSILON)
        .map(|p| {
            let d = p - pivot;
            (d.y.atan2(d.x), d.length_squared(), p)
        })
        .collect();
    rest.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut hull = vec![pivot];
    for (_, _, p) in rest {
        while hull.len() >= 2 {
            let n = hull.len();
            if cross(hull[n - 1] - hull[n - 2], p - hull[n - 1]) > 0.0 {
                break;
            }
            hull.pop();
        }
        hull.push(p);
    }

    (hull.len() >= 3).then_some(hull)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::math::polygon_contains;

    #[test]
    fn hull_drops_interior_and_collinear_points() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let hull = convex_hull(&points).unwrap();
        assert_eq!(hull.len(), 4);
        assert_eq!(hull[0], Vec2::ZERO);
        for p in points {
            assert!(polygon_contains(&hull, p), "{p} outside hull");
        }
    }

    #[test]
    fn hull_is_counter_clockwise() {
        let points = [
            Vec2::new(1.0, 3.0),
            Vec2::new(-2.0, 0.0),
            Vec2::new(2.0, -1.0),
            Vec2::new(0.0, 0.5),
        ];
        let hull = convex_hull(&points).unwrap();
        let n = hull.len();
        for i in 0..n {
            let turn = cross(hull[(i + 1) % n] - hull[i], hull[(i + 2) % n] - hull[(i + 1) % n]);
            assert!(turn > 0.0);
        }
    }

    #[test]
    fn collinear_input_has_no_hull() {
        let points = [Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0), Vec2::new(3.0, 0.0)];
        assert!(convex_hull(&points).is_none());
        assert!(convex_hull(&[Vec2::ZERO, Vec2::X]).is_none());
    }
}
