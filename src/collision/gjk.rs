//! GJK distance / intersection query for convex shapes.
//!
//! The query is an explicit state machine so callers can advance it one
//! algorithm step at a time (for visualisation) or drive it to completion.

use glam::Vec2;

use super::epa::{Edge, Polytope};
use crate::{
    config::{WorldConfig, DEFAULT_GJK_EPSILON, DEFAULT_GJK_MAX_ITERATIONS},
    core::shape::Shape,
    utils::math::{closest_point_to_origin, polygon_contains},
};

/// Point on the Minkowski difference `A - B` together with the shape points
/// and vertex indices it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SupportPoint {
    pub point: Vec2,
    pub from_a: Vec2,
    pub from_b: Vec2,
    pub index_a: u32,
    pub index_b: u32,
}

/// At most three support points. The oldest/farther point is evicted by the
/// direction update rather than growing past three.
#[derive(Debug, Clone, Default)]
pub struct Simplex {
    points: Vec<SupportPoint>,
}

impl Simplex {
    pub const MAX_POINTS: usize = 3;

    pub fn push(&mut self, point: SupportPoint) {
        assert!(
            self.points.len() < Self::MAX_POINTS,
            "simplex cannot hold more than {} points",
            Self::MAX_POINTS
        );
        self.points.push(point);
    }

    pub fn remove(&mut self, index: usize) -> SupportPoint {
        self.points.remove(index)
    }

    pub fn get(&self, index: usize) -> Option<SupportPoint> {
        self.points.get(index).copied()
    }

    pub fn points(&self) -> &[SupportPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Triangle containment of the origin; boundary counts as inside.
    pub fn contains_origin(&self) -> bool {
        let mut corners = [Vec2::ZERO; Self::MAX_POINTS];
        for (slot, p) in corners.iter_mut().zip(&self.points) {
            *slot = p.point;
        }
        polygon_contains(&corners[..self.points.len()], Vec2::ZERO)
    }
}

/// Outcome of a finished query.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GjkResult {
    pub colliding: bool,
    /// Closest point on A. When colliding, the contact point on A.
    pub closest_on_a: Vec2,
    /// Closest point on B. When colliding, the matching point on B.
    pub closest_on_b: Vec2,
    /// `normal * depth` of the final EPA edge; zero when disjoint.
    pub penetration: Vec2,
    /// Final EPA edge; `None` when disjoint.
    pub edge: Option<Edge>,
}

impl GjkResult {
    /// Separation normal pointing from A towards B.
    pub fn normal(&self) -> Vec2 {
        self.edge.map_or(Vec2::ZERO, |e| e.normal)
    }

    pub fn depth(&self) -> f32 {
        self.edge.map_or(0.0, |e| e.distance)
    }

    /// Gap between the closest points; zero when colliding.
    pub fn distance(&self) -> f32 {
        if self.colliding {
            0.0
        } else {
            self.closest_on_a.distance(self.closest_on_b)
        }
    }

    /// Vertex pair identifying the contact feature, stable across frames.
    pub fn feature_id(&self) -> Option<u32> {
        self.edge.map(|e| e.feature_id())
    }
}

/// Current stage of a [`GjkQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GjkPhase {
    /// Initial two-point simplex not built yet.
    Seed,
    /// Walking the simplex towards the origin.
    Refine,
    /// Intersection confirmed; expanding the EPA polytope.
    Expand,
    Done,
}

/// Iteration limits shared by GJK and EPA.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GjkSolver {
    pub max_iterations: u32,
    pub epsilon: f32,
}

impl Default for GjkSolver {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_GJK_MAX_ITERATIONS,
            epsilon: DEFAULT_GJK_EPSILON,
        }
    }
}

impl GjkSolver {
    pub fn new(max_iterations: u32, epsilon: f32) -> Self {
        Self {
            max_iterations,
            epsilon,
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.gjk_max_iterations, config.gjk_epsilon)
    }

    /// Starts a step-by-step query.
    pub fn begin<'a>(&self, a: &'a Shape, b: &'a Shape) -> GjkQuery<'a> {
        GjkQuery {
            a,
            b,
            max_iterations: self.max_iterations,
            epsilon: self.epsilon,
            phase: GjkPhase::Seed,
            iteration: 0,
            simplex: Simplex::default(),
            direction: Vec2::ZERO,
            polytope: None,
            current_edge: None,
            result: GjkResult::default(),
        }
    }

    /// Runs the full query. Hitting an iteration cap yields the last estimate.
    pub fn query(&self, a: &Shape, b: &Shape) -> GjkResult {
        let mut query = self.begin(a, b);
        while query.step() {}
        query.result
    }
}

/// In-flight GJK/EPA query over two shapes.
pub struct GjkQuery<'a> {
    a: &'a Shape,
    b: &'a Shape,
    max_iterations: u32,
    epsilon: f32,
    phase: GjkPhase,
    iteration: u32,
    simplex: Simplex,
    direction: Vec2,
    polytope: Option<Polytope>,
    current_edge: Option<Edge>,
    result: GjkResult,
}

impl<'a> GjkQuery<'a> {
    /// Advances one algorithm step. Returns `false` once the query is finished.
    pub fn step(&mut self) -> bool {
        match self.phase {
            GjkPhase::Seed => self.seed(),
            GjkPhase::Refine => self.refine(),
            GjkPhase::Expand => self.expand(),
            GjkPhase::Done => {}
        }
        self.phase != GjkPhase::Done
    }

    pub fn phase(&self) -> GjkPhase {
        self.phase
    }

    /// Iterations spent in the current phase.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn simplex(&self) -> &Simplex {
        &self.simplex
    }

    /// Direction used for the next support query.
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn polytope(&self) -> Option<&Polytope> {
        self.polytope.as_ref()
    }

    pub fn current_edge(&self) -> Option<&Edge> {
        self.current_edge.as_ref()
    }

    /// Meaningful once [`GjkQuery::step`] has returned `false`.
    pub fn result(&self) -> &GjkResult {
        &self.result
    }

    pub fn support(&self, direction: Vec2) -> SupportPoint {
        let (from_a, index_a) = self.a.support_point(direction);
        let (from_b, index_b) = self.b.support_point(-direction);
        SupportPoint {
            point: from_a - from_b,
            from_a,
            from_b,
            index_a: index_a as u32,
            index_b: index_b as u32,
        }
    }

    fn seed(&mut self) {
        let mut direction = self.a.bounds().center() - self.b.bounds().center();
        if direction.length_squared() < self.epsilon {
            direction = Vec2::X;
        }

        let first = self.support(direction);
        let second = self.support(-direction);
        self.simplex.clear();
        self.simplex.push(first);
        self.simplex.push(second);

        self.direction = -closest_point_to_origin(first.point, second.point);
        self.phase = GjkPhase::Refine;
    }

    fn refine(&mut self) {
        if self.iteration >= self.max_iterations {
            self.finish_disjoint();
            return;
        }
        self.iteration += 1;

        // Origin sits on the simplex.
        if self.direction.length_squared() < self.epsilon {
            self.begin_expansion();
            return;
        }

        let candidate = self.support(self.direction);
        let stalled = self
            .simplex
            .points()
            .iter()
            .take(2)
            .any(|p| p.point.distance_squared(candidate.point) < self.epsilon);
        if stalled {
            self.finish_disjoint();
            return;
        }

        self.simplex.push(candidate);
        if self.simplex.contains_origin() {
            self.begin_expansion();
            return;
        }

        self.direction = self.next_direction();
    }

    /// Direction towards the origin from the closest simplex feature. A triangle
    /// drops the vertex whose edge is farther from the origin.
    fn next_direction(&mut self) -> Vec2 {
        let points = self.simplex.points();
        match points.len() {
            2 => -closest_point_to_origin(points[0].point, points[1].point),
            3 => {
                let on_ca = closest_point_to_origin(points[2].point, points[0].point);
                let on_cb = closest_point_to_origin(points[2].point, points[1].point);
                if on_ca.length_squared() < on_cb.length_squared() {
                    self.simplex.remove(1);
                    -on_ca
                } else {
                    self.simplex.remove(0);
                    -on_cb
                }
            }
            _ => Vec2::ZERO,
        }
    }

    fn begin_expansion(&mut self) {
        // Seed EPA from a single edge so an origin lying on a triangle edge
        // cannot produce an undefined normal.
        if self.simplex.len() > 2 {
            self.direction = self.next_direction();
        }
        self.polytope = Some(Polytope::from_simplex(&self.simplex));
        self.iteration = 0;
        self.phase = GjkPhase::Expand;
    }

    fn expand(&mut self) {
        if self.iteration >= self.max_iterations {
            self.finish_colliding();
            return;
        }
        self.iteration += 1;

        let Some(edge) = self.polytope.as_ref().and_then(Polytope::closest_edge) else {
            self.finish_colliding();
            return;
        };
        self.current_edge = Some(edge);
        self.direction = edge.normal;

        let candidate = self.support(edge.normal);
        if candidate.point.dot(edge.normal) - edge.distance < self.epsilon {
            self.finish_colliding();
            return;
        }

        if let Some(polytope) = self.polytope.as_mut() {
            polytope.insert_point(edge.index, candidate);
        }
    }

    fn finish_disjoint(&mut self) {
        if let (Some(a), Some(b)) = (self.simplex.get(0), self.simplex.get(1)) {
            let (on_a, on_b) = closest_points(&a, &b, self.epsilon);
            self.result.closest_on_a = on_a;
            self.result.closest_on_b = on_b;
        }
        self.result.colliding = false;
        self.phase = GjkPhase::Done;
    }

    fn finish_colliding(&mut self) {
        let edge = self
            .current_edge
            .or_else(|| self.polytope.as_ref().and_then(Polytope::closest_edge));

        if let Some(edge) = edge {
            let (on_a, on_b) = closest_points(&edge.a, &edge.b, self.epsilon);
            self.result.closest_on_a = on_a;
            self.result.closest_on_b = on_b;
            self.result.penetration = edge.normal * edge.distance;
        }
        self.current_edge = edge;
        self.result.edge = edge;
        self.result.colliding = true;
        self.phase = GjkPhase::Done;
    }
}

/// Projects the origin onto the Minkowski segment `a-b` and maps the clamped
/// barycentric weights back onto the source shapes.
pub fn closest_points(a: &SupportPoint, b: &SupportPoint, epsilon: f32) -> (Vec2, Vec2) {
    let l = b.point - a.point;
    let length_sq = l.length_squared();
    if length_sq < epsilon {
        return (a.from_a, a.from_b);
    }

    let r2 = (-l.dot(a.point) / length_sq).clamp(0.0, 1.0);
    let r1 = 1.0 - r2;
    (a.from_a * r1 + b.from_a * r2, a.from_b * r1 + b.from_b * r2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_at(x: f32) -> Shape {
        let mut shape = Shape::rectangle(Vec2::splat(0.5));
        shape.place(Vec2::new(x, 0.0), 0.0);
        shape
    }

    #[test]
    fn separated_squares_report_closest_points() {
        let a = square_at(-0.6);
        let b = square_at(0.6);
        let result = GjkSolver::default().query(&a, &b);

        assert!(!result.colliding);
        assert_relative_eq!(result.distance(), 0.2, epsilon = 1e-4);
        assert_relative_eq!(result.closest_on_a.x, -0.1, epsilon = 1e-4);
        assert_relative_eq!(result.closest_on_b.x, 0.1, epsilon = 1e-4);
        assert!(result.edge.is_none());
    }

    #[test]
    fn overlapping_squares_report_penetration_along_x() {
        let a = square_at(-0.4);
        let b = square_at(0.4);
        let result = GjkSolver::default().query(&a, &b);

        assert!(result.colliding);
        assert_relative_eq!(result.penetration.x, 0.2, epsilon = 1e-4);
        assert_relative_eq!(result.penetration.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(result.normal().x, 1.0, epsilon = 1e-4);
        assert_relative_eq!(result.depth(), 0.2, epsilon = 1e-4);
    }

    #[test]
    fn overlapping_circles_estimate_depth() {
        let a = Shape::circle(Vec2::ZERO, 1.0);
        let b = Shape::circle(Vec2::new(1.5, 0.0), 1.0);
        let result = GjkSolver::default().query(&a, &b);

        assert!(result.colliding);
        assert!((result.depth() - 0.5).abs() < 0.05, "depth {}", result.depth());
        assert!(result.normal().x > 0.9);
    }

    #[test]
    fn separated_circles_measure_gap() {
        let a = Shape::circle(Vec2::ZERO, 1.0);
        let b = Shape::circle(Vec2::new(3.0, 0.0), 1.0);
        let result = GjkSolver::default().query(&a, &b);

        assert!(!result.colliding);
        assert_relative_eq!(result.distance(), 1.0, epsilon = 1e-3);
        assert_relative_eq!(result.closest_on_a.x, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn stepping_visits_every_phase() {
        let a = square_at(-0.4);
        let b = square_at(0.4);
        let solver = GjkSolver::default();
        let mut query = solver.begin(&a, &b);

        assert_eq!(query.phase(), GjkPhase::Seed);
        assert!(query.step());
        assert_eq!(query.simplex().len(), 2);

        let mut saw_expand = false;
        while query.step() {
            saw_expand |= query.phase() == GjkPhase::Expand;
            assert!(query.simplex().len() <= Simplex::MAX_POINTS);
        }
        assert!(saw_expand);
        assert_eq!(query.phase(), GjkPhase::Done);
        assert!(!query.step(), "finished queries stay finished");
        assert_eq!(*query.result(), solver.query(&a, &b));
    }

    #[test]
    fn zero_iteration_cap_still_terminates() {
        let a = square_at(-0.4);
        let b = square_at(0.4);
        let result = GjkSolver::new(0, 1e-4).query(&a, &b);
        assert!(!result.colliding);
    }

    #[test]
    #[should_panic(expected = "simplex cannot hold")]
    fn simplex_overflow_is_a_contract_violation() {
        let mut simplex = Simplex::default();
        for _ in 0..4 {
            simplex.push(SupportPoint::default());
        }
    }
}
