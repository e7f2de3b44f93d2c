use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

use super::{
    aabb::Aabb,
    types::{CollisionFilter, LayerMask, Ray2D},
};
use crate::{
    collision::{
        hull,
        queries::{self, RaycastHit},
    },
    config::CIRCLE_DEBUG_SEGMENTS,
    error::{PhysicsError, Result},
    utils::{allocator::BodyHandle, math},
};

/// Geometry of a shape. Local data is authored in body space; the world copy is
/// refreshed by [`Shape::update_transform`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShapeGeometry {
    Circle {
        local_center: Vec2,
        local_radius: f32,
        center: Vec2,
        radius: f32,
    },
    Polygon {
        local_vertices: Vec<Vec2>,
        vertices: Vec<Vec2>,
    },
}

/// Convex collision shape attached to at most one rigid body.
///
/// Deserialising goes through the same vertex-count check as
/// [`Shape::polygon`] and recomputes the bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ShapeData")]
pub struct Shape {
    geometry: ShapeGeometry,
    bounds: Aabb,
    pub filter: CollisionFilter,
    pub is_trigger: bool,
    body: Option<BodyHandle>,
}

#[derive(Deserialize)]
struct ShapeData {
    geometry: ShapeGeometry,
    #[serde(default)]
    filter: CollisionFilter,
    #[serde(default)]
    is_trigger: bool,
    #[serde(default)]
    body: Option<BodyHandle>,
}

impl TryFrom<ShapeData> for Shape {
    type Error = PhysicsError;

    fn try_from(data: ShapeData) -> Result<Self> {
        let mut geometry = data.geometry;
        if let ShapeGeometry::Polygon {
            local_vertices,
            vertices,
        } = &mut geometry
        {
            if local_vertices.len() < 3 {
                return Err(PhysicsError::DegeneratePolygon {
                    vertices: local_vertices.len(),
                });
            }
            if vertices.len() != local_vertices.len() {
                vertices.clone_from(local_vertices);
            }
        }

        let mut shape = Self::from_geometry(geometry);
        shape.filter = data.filter;
        shape.is_trigger = data.is_trigger;
        shape.body = data.body;
        Ok(shape)
    }
}

impl Shape {
    fn from_geometry(geometry: ShapeGeometry) -> Self {
        let mut shape = Self {
            geometry,
            bounds: Aabb::default(),
            filter: CollisionFilter::default(),
            is_trigger: false,
            body: None,
        };
        shape.refresh_bounds();
        shape
    }

    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self::from_geometry(ShapeGeometry::Circle {
            local_center: center,
            local_radius: radius,
            center,
            radius,
        })
    }

    /// Convex polygon from vertices with a consistent winding.
    pub fn polygon(vertices: Vec<Vec2>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(PhysicsError::DegeneratePolygon {
                vertices: vertices.len(),
            });
        }
        Ok(Self::from_geometry(ShapeGeometry::Polygon {
            vertices: vertices.clone(),
            local_vertices: vertices,
        }))
    }

    /// Axis-aligned box centred on the body origin, wound counter-clockwise.
    pub fn rectangle(half_extents: Vec2) -> Self {
        let (x, y) = (half_extents.x, half_extents.y);
        let vertices = vec![
            Vec2::new(-x, -y),
            Vec2::new(x, -y),
            Vec2::new(x, y),
            Vec2::new(-x, y),
        ];
        Self::from_geometry(ShapeGeometry::Polygon {
            vertices: vertices.clone(),
            local_vertices: vertices,
        })
    }

    /// Polygon wrapping an arbitrary point cloud.
    pub fn convex_hull(points: &[Vec2]) -> Result<Self> {
        let vertices = hull::convex_hull(points).ok_or(PhysicsError::DegenerateHull)?;
        Self::polygon(vertices)
    }

    pub fn builder() -> ShapeBuilder {
        ShapeBuilder::new()
    }

    pub fn geometry(&self) -> &ShapeGeometry {
        &self.geometry
    }

    pub fn is_circle(&self) -> bool {
        matches!(self.geometry, ShapeGeometry::Circle { .. })
    }

    /// World-space vertices of a polygon; `None` for circles.
    pub fn vertices(&self) -> Option<&[Vec2]> {
        match &self.geometry {
            ShapeGeometry::Polygon { vertices, .. } => Some(vertices),
            ShapeGeometry::Circle { .. } => None,
        }
    }

    /// Tight world-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Bounds grown by `margin`, as stored in the broad-phase tree.
    pub fn loose_bounds(&self, margin: f32) -> Aabb {
        self.bounds.expanded(margin)
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub(crate) fn set_body(&mut self, body: Option<BodyHandle>) {
        self.body = body;
    }

    /// Farthest point of the shape along `direction` and the index of the vertex
    /// it came from. Ties keep the first vertex; circles always report index 0.
    pub fn support_point(&self, direction: Vec2) -> (Vec2, usize) {
        match &self.geometry {
            ShapeGeometry::Circle { center, radius, .. } => {
                (*center + direction.normalize_or_zero() * *radius, 0)
            }
            ShapeGeometry::Polygon { vertices, .. } => {
                let mut best = f32::NEG_INFINITY;
                let mut index = 0;
                for (i, v) in vertices.iter().enumerate() {
                    let projection = v.dot(direction);
                    if projection > best {
                        best = projection;
                        index = i;
                    }
                }
                (vertices[index], index)
            }
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        match &self.geometry {
            ShapeGeometry::Circle { center, radius, .. } => {
                center.distance_squared(point) < radius * radius
            }
            ShapeGeometry::Polygon { vertices, .. } => math::polygon_contains(vertices, point),
        }
    }

    /// Casts an unbounded ray against the shape.
    ///
    /// The reported normal is the ray direction, not the surface normal.
    pub fn raycast(&self, ray: &Ray2D) -> Option<RaycastHit> {
        let distance = match &self.geometry {
            ShapeGeometry::Circle { center, radius, .. } => {
                queries::ray_circle(ray, *center, *radius)
            }
            ShapeGeometry::Polygon { vertices, .. } => queries::ray_polygon(ray, vertices),
        }?;

        Some(RaycastHit {
            body: self.body,
            point: ray.point_at(distance),
            normal: ray.direction(),
            distance,
        })
    }

    /// Maps local geometry into world space with the owning body's matrix.
    ///
    /// Circles scale their radius by `scale.x` only.
    pub fn update_transform(&mut self, matrix: &Affine2, scale: Vec2) {
        match &mut self.geometry {
            ShapeGeometry::Circle {
                local_center,
                local_radius,
                center,
                radius,
            } => {
                *center = matrix.transform_point2(*local_center);
                *radius = scale.x * *local_radius;
            }
            ShapeGeometry::Polygon {
                local_vertices,
                vertices,
            } => {
                vertices.clear();
                vertices.extend(local_vertices.iter().map(|v| matrix.transform_point2(*v)));
            }
        }
        self.refresh_bounds();
    }

    /// Places a detached shape directly, without a body.
    pub fn place(&mut self, position: Vec2, rotation_deg: f32) {
        let matrix = math::body_matrix(position, rotation_deg, Vec2::ONE);
        self.update_transform(&matrix, Vec2::ONE);
    }

    /// Appends an outline suitable for debug drawing.
    pub fn debug_vertices(&self, out: &mut Vec<Vec2>) {
        match &self.geometry {
            ShapeGeometry::Circle { center, radius, .. } => {
                let step = std::f32::consts::TAU / CIRCLE_DEBUG_SEGMENTS as f32;
                out.extend((0..CIRCLE_DEBUG_SEGMENTS).map(|i| {
                    let angle = i as f32 * step;
                    *center + Vec2::new(angle.cos(), angle.sin()) * *radius
                }));
            }
            ShapeGeometry::Polygon { vertices, .. } => out.extend_from_slice(vertices),
        }
    }

    fn refresh_bounds(&mut self) {
        self.bounds = match &self.geometry {
            ShapeGeometry::Circle { center, radius, .. } => {
                Aabb::from_center_half_extents(*center, Vec2::splat(*radius))
            }
            ShapeGeometry::Polygon { vertices, .. } => Aabb::from_points(vertices),
        };
    }
}

enum PendingGeometry {
    Circle { center: Vec2, radius: f32 },
    Polygon(Vec<Vec2>),
    Hull(Vec<Vec2>),
}

/// Builder mirroring the shape constructors with filter and trigger options.
pub struct ShapeBuilder {
    geometry: PendingGeometry,
    filter: CollisionFilter,
    is_trigger: bool,
}

impl Default for ShapeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeBuilder {
    pub fn new() -> Self {
        Self {
            geometry: PendingGeometry::Circle {
                center: Vec2::ZERO,
                radius: 0.5,
            },
            filter: CollisionFilter::default(),
            is_trigger: false,
        }
    }

    pub fn circle(mut self, radius: f32) -> Self {
        self.geometry = PendingGeometry::Circle {
            center: Vec2::ZERO,
            radius,
        };
        self
    }

    pub fn offset_circle(mut self, center: Vec2, radius: f32) -> Self {
        self.geometry = PendingGeometry::Circle { center, radius };
        self
    }

    pub fn rectangle(mut self, half_extents: Vec2) -> Self {
        let (x, y) = (half_extents.x, half_extents.y);
        self.geometry = PendingGeometry::Polygon(vec![
            Vec2::new(-x, -y),
            Vec2::new(x, -y),
            Vec2::new(x, y),
            Vec2::new(-x, y),
        ]);
        self
    }

    pub fn polygon(mut self, vertices: Vec<Vec2>) -> Self {
        self.geometry = PendingGeometry::Polygon(vertices);
        self
    }

    pub fn hull(mut self, points: Vec<Vec2>) -> Self {
        self.geometry = PendingGeometry::Hull(points);
        self
    }

    pub fn filter(mut self, layer: LayerMask, mask: LayerMask) -> Self {
        self.filter = CollisionFilter { layer, mask };
        self
    }

    pub fn trigger(mut self, is_trigger: bool) -> Self {
        self.is_trigger = is_trigger;
        self
    }

    pub fn build(self) -> Result<Shape> {
        let mut shape = match self.geometry {
            PendingGeometry::Circle { center, radius } => Shape::circle(center, radius),
            PendingGeometry::Polygon(vertices) => Shape::polygon(vertices)?,
            PendingGeometry::Hull(points) => Shape::convex_hull(&points)?,
        };
        shape.filter = self.filter;
        shape.is_trigger = self.is_trigger;
        Ok(shape)
    }
}
