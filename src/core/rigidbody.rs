use glam::{Affine2, Vec2};

use super::shape::Shape;
use crate::{
    config::DEFAULT_FRICTION,
    error::{PhysicsError, Result},
    utils::math::{self, cross, perp},
};

/// Below this inverse mass a body is treated as immovable.
const STATIC_INV_MASS: f32 = 1e-6;

fn inverse(value: f32) -> Result<f32> {
    if value.is_nan() || value <= 0.0 {
        return Err(PhysicsError::InvalidMass(value));
    }
    Ok(if value == f32::INFINITY { 0.0 } else { 1.0 / value })
}

/// Rigid body carrying linear and angular state and one convex shape.
///
/// Angles are in degrees and angular velocity in degrees per second.
/// An infinite mass (inertia) gives a zero inverse, so the body never moves
/// (rotates) in response to impulses.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub(crate) id: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Continuous force, applied every update.
    pub force: Vec2,
    /// One-shot impulse, consumed by the next update.
    pub force_impulse: Vec2,
    pub rotation: f32,
    pub angular_velocity: f32,
    pub torque: f32,
    pub torque_impulse: f32,
    mass: f32,
    inv_mass: f32,
    inertia: f32,
    inv_inertia: f32,
    pub friction: f32,
    pub scale: Vec2,
    matrix: Affine2,
    shape: Option<Shape>,
    /// Opaque handle of the game object to notify about collisions.
    pub entity: Option<u64>,
    pub(crate) active: bool,
    pub(crate) idle_time: f32,
}

impl RigidBody {
    /// Creates a detached body. Pass `f32::INFINITY` for a static body or one
    /// that never rotates.
    pub fn new(mass: f32, inertia: f32) -> Result<Self> {
        Ok(Self {
            id: 0,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            force_impulse: Vec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            torque: 0.0,
            torque_impulse: 0.0,
            mass,
            inv_mass: inverse(mass)?,
            inertia,
            inv_inertia: inverse(inertia)?,
            friction: DEFAULT_FRICTION,
            scale: Vec2::ONE,
            matrix: Affine2::IDENTITY,
            shape: None,
            entity: None,
            active: false,
            idle_time: 0.0,
        })
    }

    /// Immovable body with infinite mass and inertia.
    pub fn fixed() -> Self {
        Self {
            id: 0,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            force_impulse: Vec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            torque: 0.0,
            torque_impulse: 0.0,
            mass: f32::INFINITY,
            inv_mass: 0.0,
            inertia: f32::INFINITY,
            inv_inertia: 0.0,
            friction: DEFAULT_FRICTION,
            scale: Vec2::ONE,
            matrix: Affine2::IDENTITY,
            shape: None,
            entity: None,
            active: false,
            idle_time: 0.0,
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.add_shape(shape);
        self
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_entity(mut self, entity: u64) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Binds the body's single shape, replacing any previous one.
    pub fn add_shape(&mut self, shape: Shape) {
        self.shape = Some(shape);
        self.update_transform();
    }

    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    pub fn shape_mut(&mut self) -> Option<&mut Shape> {
        self.shape.as_mut()
    }

    /// Id assigned on registration; zero while detached.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        self.inv_mass = inverse(mass)?;
        self.mass = mass;
        Ok(())
    }

    pub fn set_inertia(&mut self, inertia: f32) -> Result<()> {
        self.inv_inertia = inverse(inertia)?;
        self.inertia = inertia;
        Ok(())
    }

    pub fn is_static(&self) -> bool {
        self.inv_mass < STATIC_INV_MASS
    }

    /// Awake and simulated. Static bodies are never active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn matrix(&self) -> &Affine2 {
        &self.matrix
    }

    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse * self.inv_mass;
    }

    /// Angular part of an impulse `impulse` applied at world `point`.
    pub fn apply_torque_impulse(&mut self, point: Vec2, impulse: Vec2) {
        let r = point - self.position;
        self.angular_velocity += cross(r, impulse).to_degrees() * self.inv_inertia;
    }

    /// Velocity of the material point at world `point`.
    pub fn point_velocity(&self, point: Vec2) -> Vec2 {
        let r = point - self.position;
        self.velocity + perp(r) * self.angular_velocity.to_radians()
    }

    /// Inverse effective mass along `normal` at world `point`.
    pub fn point_moment(&self, point: Vec2, normal: Vec2) -> f32 {
        let r = point - self.position;
        let rn = r.dot(normal);
        self.inv_mass + self.inv_inertia * (r.length_squared() - rn * rn)
    }

    /// Zeroes motion and pending forces and marks the body inactive.
    pub fn sleep(&mut self) {
        self.velocity = Vec2::ZERO;
        self.angular_velocity = 0.0;
        self.force = Vec2::ZERO;
        self.force_impulse = Vec2::ZERO;
        self.torque_impulse = 0.0;
        self.active = false;
    }

    /// Whether motion is slow enough to count towards falling asleep.
    pub(crate) fn can_idle(&self, sleep_speed: f32) -> bool {
        if self.velocity.length_squared() > sleep_speed * sleep_speed {
            return false;
        }

        let reach = self
            .shape
            .as_ref()
            .map_or(0.0, |shape| shape.bounds().size().max_element() * 0.5);
        reach * self.angular_velocity.to_radians().abs() <= sleep_speed
    }

    /// Rebuilds the body matrix and pushes it into the shape.
    pub fn update_transform(&mut self) {
        self.matrix = math::body_matrix(self.position, self.rotation, self.scale);
        if let Some(shape) = self.shape.as_mut() {
            shape.update_transform(&self.matrix, self.scale);
        }
    }
}
