use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, Not};

/// Common math types re-exported for convenience.
pub use glam::{Affine2, Vec2};

/// Bit set of collision layers.
///
/// The engine assigns no meaning to individual bits; callers define their own
/// named constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    /// Mask with only layer `index` set.
    pub const fn layer(index: u32) -> Self {
        Self(1 << index)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for LayerMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for LayerMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Which layers a shape belongs to and which layers it wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFilter {
    /// Layers this shape lives on.
    pub layer: LayerMask,
    /// Layers this shape collides with.
    pub mask: LayerMask,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            layer: LayerMask::ALL,
            mask: LayerMask::ALL,
        }
    }
}

impl CollisionFilter {
    pub fn new(layer: LayerMask, mask: LayerMask) -> Self {
        Self { layer, mask }
    }

    /// Whether `self` is interested in contacts with `other`.
    pub fn accepts(&self, other: &CollisionFilter) -> bool {
        self.mask.intersects(other.layer)
    }

    /// A pair is tested when at least one side is interested in the other.
    pub fn either_accepts(a: &CollisionFilter, b: &CollisionFilter) -> bool {
        a.accepts(b) || b.accepts(a)
    }
}

/// Half-line used by ray casts. The direction is always a unit vector, also
/// after deserialising.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RayParts")]
pub struct Ray2D {
    origin: Vec2,
    direction: Vec2,
}

#[derive(Deserialize)]
struct RayParts {
    origin: Vec2,
    direction: Vec2,
}

impl From<RayParts> for Ray2D {
    fn from(parts: RayParts) -> Self {
        Self::new(parts.origin, parts.direction)
    }
}

impl Ray2D {
    /// Builds a ray, falling back to `+X` for a zero direction.
    pub fn new(origin: Vec2, direction: Vec2) -> Self {
        let direction = direction.try_normalize().unwrap_or(Vec2::X);
        Self { origin, direction }
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Unit direction.
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn point_at(&self, distance: f32) -> Vec2 {
        self.origin + self.direction * distance
    }
}
