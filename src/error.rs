//! Error type for fallible construction and registration calls.
//!
//! Algorithmic outcomes (no collision, iteration caps) are never errors.

use std::fmt;

use crate::utils::allocator::BodyHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// A body was registered before a shape was attached to it.
    MissingShape,
    /// A polygon needs at least three vertices.
    DegeneratePolygon { vertices: usize },
    /// The input points do not span an area, so no hull exists.
    DegenerateHull,
    /// The handle does not refer to a body owned by this world.
    UnknownBody(BodyHandle),
    /// Mass and inertia must be positive (infinity is allowed).
    InvalidMass(f32),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MissingShape => write!(f, "rigid body has no shape attached"),
            Self::DegeneratePolygon { vertices } => {
                write!(f, "polygon needs at least 3 vertices, got {vertices}")
            }
            Self::DegenerateHull => write!(f, "points are collinear or too few to form a hull"),
            Self::UnknownBody(handle) => write!(f, "unknown rigid body {handle}"),
            Self::InvalidMass(value) => write!(f, "invalid mass or inertia: {value}"),
        }
    }
}

impl std::error::Error for PhysicsError {}

/// Result alias for fallible engine calls.
pub type Result<T> = std::result::Result<T, PhysicsError>;
