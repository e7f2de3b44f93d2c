//! Expanding polytope over the Minkowski difference, seeded from a two-point
//! GJK simplex.

use glam::Vec2;

use super::{contact::pack_ids, gjk::Simplex, gjk::SupportPoint};
use crate::utils::math::{perp, perpendicular_to_origin};

/// Directed polytope edge with its outward normal and distance to the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: SupportPoint,
    pub b: SupportPoint,
    pub normal: Vec2,
    pub distance: f32,
    /// Position of the edge in the polytope cycle.
    pub index: usize,
}

impl Edge {
    /// Seed edge. Its normal is a quarter turn of the edge direction so the
    /// mirrored twin faces the opposite way.
    fn seed(a: SupportPoint, b: SupportPoint) -> Self {
        Self {
            a,
            b,
            normal: perp((a.point - b.point).normalize_or_zero()),
            distance: perpendicular_to_origin(a.point, b.point).length(),
            index: 0,
        }
    }

    fn new(a: SupportPoint, b: SupportPoint) -> Self {
        let foot = perpendicular_to_origin(a.point, b.point);
        let length_sq = foot.length_squared();
        let (normal, distance) = if length_sq > f32::EPSILON {
            let distance = length_sq.sqrt();
            (foot / distance, distance)
        } else {
            // Origin on the supporting line: fall back to the winding normal.
            (perp((a.point - b.point).normalize_or_zero()), 0.0)
        };

        Self {
            a,
            b,
            normal,
            distance,
            index: 0,
        }
    }

    /// Identifies the contact feature by the vertices that produced `a`.
    pub fn feature_id(&self) -> u32 {
        pack_ids(self.a.index_a, self.a.index_b)
    }
}

/// Cyclic list of edges, wound consistently.
#[derive(Debug, Clone, Default)]
pub struct Polytope {
    edges: Vec<Edge>,
}

impl Polytope {
    /// Builds the two-edge polytope (the edge and its mirror).
    ///
    /// The seed does not enclose the origin. When the seed edge already lies on
    /// a face of the Minkowski difference, expansion stops there even if a
    /// shallower face exists, so the reported depth is a valid separating
    /// translation but not always the minimal one.
    ///
    /// # Panics
    /// When the simplex does not hold exactly two points.
    pub fn from_simplex(simplex: &Simplex) -> Self {
        assert_eq!(
            simplex.len(),
            2,
            "EPA must be seeded with a two-point simplex"
        );
        let points = simplex.points();
        let mut polytope = Self {
            edges: vec![
                Edge::seed(points[0], points[1]),
                Edge::seed(points[1], points[0]),
            ],
        };
        polytope.reindex();
        polytope
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edge nearest to the origin; the first one wins ties.
    pub fn closest_edge(&self) -> Option<Edge> {
        let mut best: Option<Edge> = None;
        for edge in &self.edges {
            if best.map_or(true, |b| edge.distance < b.distance) {
                best = Some(*edge);
            }
        }
        best
    }

    /// Splits edge `index` at `point`: `(a, b)` becomes `(a, point), (point, b)`.
    pub fn insert_point(&mut self, index: usize, point: SupportPoint) {
        let Some(edge) = self.edges.get(index).copied() else {
            return;
        };
        self.edges[index] = Edge::new(edge.a, point);
        self.edges.insert(index + 1, Edge::new(point, edge.b));
        self.reindex();
    }

    fn reindex(&mut self) {
        for (i, edge) in self.edges.iter_mut().enumerate() {
            edge.index = i;
        }
    }
}
