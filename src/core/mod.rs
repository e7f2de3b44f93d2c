//! Core types describing bodies, shapes, bounds and filtering.

pub mod aabb;
pub mod rigidbody;
pub mod shape;
pub mod types;

pub use aabb::Aabb;
pub use rigidbody::RigidBody;
pub use shape::{Shape, ShapeBuilder, ShapeGeometry};
pub use types::{CollisionFilter, LayerMask, Ray2D};
