use std::collections::BTreeMap;

use glam::Vec2;

use crate::{
    collision::contact::{CollisionPair, ContactInfo, PairKey},
    config::WorldConfig,
    core::rigidbody::RigidBody,
    utils::allocator::Arena,
};

fn tangent_of(normal: Vec2) -> Vec2 {
    Vec2::new(-normal.y, normal.x)
}

/// Pushes `-impulse` into `a` and `+impulse` into `b` at `point`.
fn exchange(a: &mut RigidBody, b: &mut RigidBody, point: Vec2, impulse: Vec2) {
    a.apply_impulse(-impulse);
    a.apply_torque_impulse(point, -impulse);
    b.apply_impulse(impulse);
    b.apply_torque_impulse(point, impulse);
}

/// Sequential impulse contact solver with warm starting and Baumgarte bias.
#[derive(Debug, Clone)]
pub struct ContactSolver {
    pub iterations: u32,
    pub bias_factor: f32,
    pub allowed_penetration: f32,
    pub verbose: bool,
}

impl Default for ContactSolver {
    fn default() -> Self {
        Self::from_config(&WorldConfig::default())
    }
}

impl ContactSolver {
    pub fn from_config(config: &WorldConfig) -> Self {
        Self {
            iterations: config.solver_iterations,
            bias_factor: config.bias_factor,
            allowed_penetration: config.allowed_penetration,
            verbose: config.verbose,
        }
    }

    /// Caches effective masses and bias for each contact of `pair`, then
    /// re-applies last frame's accumulated impulses.
    pub fn pre_step(&self, dt: f32, bodies: &mut Arena<RigidBody>, pair: &mut CollisionPair) {
        let Some((a, b)) = bodies.get2_mut(pair.body_a, pair.body_b) else {
            return;
        };

        for contact in &mut pair.contacts {
            let normal = contact.normal;
            let tangent = tangent_of(normal);

            let k_normal =
                a.point_moment(contact.point, normal) + b.point_moment(contact.point, normal);
            contact.mass_normal = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

            let k_tangent =
                a.point_moment(contact.point, tangent) + b.point_moment(contact.point, tangent);
            contact.mass_tangent = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

            contact.bias = if dt > 0.0 {
                self.bias_factor * (contact.penetration - self.allowed_penetration).max(0.0) / dt
            } else {
                0.0
            };

            let warm = normal * contact.normal_impulse + tangent * contact.tangent_impulse;
            exchange(a, b, contact.point, warm);

            if self.verbose {
                log::debug!(
                    "pre-step {}-{} feature {:#x}: warm impulse {:?}, bias {:.4}",
                    a.id(),
                    b.id(),
                    contact.feature,
                    warm,
                    contact.bias
                );
            }
        }
    }

    /// One velocity pass over `pair`: normal impulse first, then friction.
    pub fn apply_impulses(&self, bodies: &mut Arena<RigidBody>, pair: &mut CollisionPair) {
        let Some((a, b)) = bodies.get2_mut(pair.body_a, pair.body_b) else {
            return;
        };
        let fraction = 1.0 - (a.friction + b.friction) * 0.5;

        for contact in &mut pair.contacts {
            let (d_normal, d_tangent) = Self::solve_contact(a, b, contact, fraction);
            if self.verbose {
                log::debug!(
                    "impulse {}-{} feature {:#x}: fn {:.5}, ft {:.5}",
                    a.id(),
                    b.id(),
                    contact.feature,
                    d_normal,
                    d_tangent
                );
            }
        }
    }

    fn solve_contact(
        a: &mut RigidBody,
        b: &mut RigidBody,
        contact: &mut ContactInfo,
        fraction: f32,
    ) -> (f32, f32) {
        let normal = contact.normal;

        let relative = a.point_velocity(contact.point) - b.point_velocity(contact.point);
        let vn = relative.dot(normal);
        let old_normal = contact.normal_impulse;
        contact.normal_impulse = (old_normal + (vn + contact.bias) * contact.mass_normal).max(0.0);
        let d_normal = contact.normal_impulse - old_normal;
        exchange(a, b, contact.point, normal * d_normal);

        let tangent = tangent_of(normal);
        let relative = a.point_velocity(contact.point) - b.point_velocity(contact.point);
        let vt = relative.dot(tangent);
        let max_tangent = (fraction * contact.normal_impulse).abs();
        let old_tangent = contact.tangent_impulse;
        contact.tangent_impulse =
            (old_tangent + vt * contact.mass_tangent).clamp(-max_tangent, max_tangent);
        let d_tangent = contact.tangent_impulse - old_tangent;
        exchange(a, b, contact.point, tangent * d_tangent);

        (d_normal, d_tangent)
    }

    /// Runs the configured number of passes over every non-trigger pair.
    pub fn solve(
        &self,
        bodies: &mut Arena<RigidBody>,
        pairs: &mut BTreeMap<PairKey, CollisionPair>,
    ) {
        for _ in 0..self.iterations {
            for pair in pairs.values_mut().filter(|pair| !pair.is_trigger) {
                self.apply_impulses(bodies, pair);
            }
        }
    }
}
