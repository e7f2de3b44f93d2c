use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    core::types::Ray2D,
    utils::{allocator::BodyHandle, math::cross},
};

/// Result of a ray cast against shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastHit {
    /// Body owning the hit shape, if the shape is attached to one.
    pub body: Option<BodyHandle>,
    pub point: Vec2,
    /// Always the ray direction.
    pub normal: Vec2,
    pub distance: f32,
}

/// Distance along `ray` to a circle, `0.0` if the origin starts inside.
pub fn ray_circle(ray: &Ray2D, center: Vec2, radius: f32) -> Option<f32> {
    let m = ray.origin() - center;
    let c = m.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let b = m.dot(ray.direction());
    if b > 0.0 {
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some((-b - discriminant.sqrt()).max(0.0))
}

/// Distance along `ray` to the nearest polygon edge, `0.0` if the origin starts inside.
pub fn ray_polygon(ray: &Ray2D, vertices: &[Vec2]) -> Option<f32> {
    if crate::utils::math::polygon_contains(vertices, ray.origin()) {
        return Some(0.0);
    }

    let mut best: Option<f32> = None;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let edge = vertices[(i + 1) % vertices.len()] - a;
        let denom = cross(ray.direction(), edge);
        if denom.abs() < f32::EPSILON {
            continue;
        }

        let to_a = a - ray.origin();
        let t = cross(to_a, edge) / denom;
        let s = cross(to_a, ray.direction()) / denom;
        if t >= 0.0 && (0.0..=1.0).contains(&s) && best.map_or(true, |d| t < d) {
            best = Some(t);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ray_circle_from_outside_and_inside() {
        let ray = Ray2D::new(Vec2::new(-5.0, 0.0), Vec2::X);
        assert_relative_eq!(ray_circle(&ray, Vec2::ZERO, 1.0).unwrap(), 4.0, epsilon = 1e-5);

        let inside = Ray2D::new(Vec2::new(0.2, 0.0), Vec2::X);
        assert_eq!(ray_circle(&inside, Vec2::ZERO, 1.0), Some(0.0));

        let away = Ray2D::new(Vec2::new(-5.0, 0.0), -Vec2::X);
        assert!(ray_circle(&away, Vec2::ZERO, 1.0).is_none());

        let miss = Ray2D::new(Vec2::new(-5.0, 2.0), Vec2::X);
        assert!(ray_circle(&miss, Vec2::ZERO, 1.0).is_none());
    }

    #[test]
    fn long_direction_vectors_give_true_distances() {
        let ray = Ray2D::new(Vec2::new(-5.0, 0.0), Vec2::new(3.0, 0.0));
        assert_relative_eq!(ray_circle(&ray, Vec2::ZERO, 1.0).unwrap(), 4.0, epsilon = 1e-5);

        let diagonal = Ray2D::new(Vec2::new(-3.0, -3.0), Vec2::new(2.0, 2.0));
        let expected = 3.0 * std::f32::consts::SQRT_2 - 1.0;
        assert_relative_eq!(ray_circle(&diagonal, Vec2::ZERO, 1.0).unwrap(), expected, epsilon = 1e-5);
    }

    #[test]
    fn ray_polygon_hits_nearest_edge() {
        let square = [
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ];
        let ray = Ray2D::new(Vec2::new(0.0, -4.0), Vec2::Y);
        assert_relative_eq!(ray_polygon(&ray, &square).unwrap(), 3.0, epsilon = 1e-5);

        let miss = Ray2D::new(Vec2::new(3.0, -4.0), Vec2::Y);
        assert!(ray_polygon(&miss, &square).is_none());
    }
}
