//! Collision detection: broad-phase tree, GJK/EPA narrow phase, contacts and queries.

pub mod broadphase;
pub mod contact;
pub mod epa;
pub mod gjk;
pub mod hull;
pub mod minkowski;
pub mod queries;
pub mod sat;

pub use broadphase::AabbTree;
pub use contact::{CollisionInfo, CollisionPair, CollisionStage, ContactInfo};
pub use epa::{Edge, Polytope};
pub use gjk::{GjkPhase, GjkQuery, GjkResult, GjkSolver, Simplex, SupportPoint};
pub use queries::RaycastHit;
