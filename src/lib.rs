//! Convex Physics 2D – rigid-body physics for Rust.
//!
//! Circles and convex polygons collide through GJK with EPA penetration
//! depth, candidate pairs come from an incremental AABB tree, and contacts are
//! resolved by a warm-started sequential impulse solver.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::{Affine2, Vec2};

pub use collision::{
    broadphase::AabbTree,
    contact::{CollisionInfo, CollisionPair, CollisionStage, ContactInfo},
    gjk::{GjkPhase, GjkQuery, GjkResult, GjkSolver},
    queries::RaycastHit,
};
pub use config::WorldConfig;
pub use core::{
    aabb::Aabb,
    rigidbody::RigidBody,
    shape::{Shape, ShapeBuilder, ShapeGeometry},
    types::{CollisionFilter, LayerMask, Ray2D},
};
pub use dynamics::{integrator::Integrator, solver::ContactSolver};
pub use error::{PhysicsError, Result};
pub use utils::{
    allocator::{Arena, BodyHandle, Handle},
    profiling::StepProfile,
};
pub use world::{CollisionListener, PhysicsWorld, SharedWorld};

/// Upper bound on fixed steps run by one [`PhysicsEngine::step`] call.
const MAX_STEPS_PER_FRAME: u32 = 8;

/// Drives a [`PhysicsWorld`] with a fixed time step from variable frame times.
pub struct PhysicsEngine {
    world: PhysicsWorld,
    time_step: f32,
    accumulated: f32,
}

impl PhysicsEngine {
    /// Creates an engine stepping `time_step` seconds at a time. Non-positive
    /// steps fall back to 1/60 s.
    pub fn new(time_step: f32, config: WorldConfig) -> Self {
        let time_step = if time_step > 0.0 { time_step } else { 1.0 / 60.0 };
        Self {
            world: PhysicsWorld::new(config),
            time_step,
            accumulated: 0.0,
        }
    }

    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    /// Adds a rigid body to the world and returns its handle.
    pub fn add_body(&mut self, body: RigidBody) -> Result<BodyHandle> {
        self.world.add_rigidbody(body)
    }

    /// Consumes `frame_dt` in fixed steps. Returns the number of updates run;
    /// time left over is carried into the next call.
    pub fn step(&mut self, frame_dt: f32) -> u32 {
        self.accumulated += frame_dt.max(0.0);

        let mut steps = 0;
        while self.accumulated >= self.time_step && steps < MAX_STEPS_PER_FRAME {
            self.world.update(self.time_step);
            self.accumulated -= self.time_step;
            steps += 1;
        }
        if steps == MAX_STEPS_PER_FRAME && self.accumulated >= self.time_step {
            log::warn!(
                "physics fell behind, dropping {:.3} s of simulation time",
                self.accumulated
            );
            self.accumulated %= self.time_step;
        }
        steps
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    /// Immutable access to a rigid body by handle.
    pub fn get_body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.world.body(handle)
    }
}
