//! Tuning constants and the serialisable world configuration.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Default gravity applied to dynamic bodies (Y-up).
pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, -9.81];

/// Velocity damping factor, applied as `v *= 1 - damping * dt`.
pub const DEFAULT_DAMPING: f32 = 0.1;

/// Penetration tolerated before positional bias kicks in.
pub const DEFAULT_ALLOWED_PENETRATION: f32 = 0.01;

/// Baumgarte stabilisation factor.
pub const DEFAULT_BIAS_FACTOR: f32 = 0.1;

/// Sequential impulse iterations per update.
pub const DEFAULT_SOLVER_ITERATIONS: u32 = 10;

/// Below this speed a body is considered idle.
pub const DEFAULT_SLEEP_SPEED: f32 = 0.01;

/// Idle time after which a body goes to sleep.
pub const DEFAULT_SLEEP_IDLE_TIME: f32 = 0.0;

/// Margin added around tight bounds for tree leaves.
pub const DEFAULT_BOUNDS_MARGIN: f32 = 0.1;

/// Iteration cap shared by GJK refinement and EPA expansion.
pub const DEFAULT_GJK_MAX_ITERATIONS: u32 = 10;

/// Tolerance for "near zero" and "coincident" comparisons in GJK/EPA.
pub const DEFAULT_GJK_EPSILON: f32 = 1e-4;

/// Friction coefficient of a freshly created body.
pub const DEFAULT_FRICTION: f32 = 0.3;

/// Half size of the box probed by a point cast.
pub const DEFAULT_POINT_CAST_RADIUS: f32 = 0.1;

/// Number of perimeter samples produced for circle debug outlines.
pub const CIRCLE_DEBUG_SEGMENTS: usize = 36;

/// Runtime configuration of a [`crate::PhysicsWorld`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    pub gravity: Vec2,
    pub damping: f32,
    pub allowed_penetration: f32,
    pub bias_factor: f32,
    pub solver_iterations: u32,
    pub sleep_speed: f32,
    pub sleep_idle_time: f32,
    pub bounds_margin: f32,
    pub gjk_max_iterations: u32,
    pub gjk_epsilon: f32,
    /// Logs every contact and impulse at `debug` level.
    pub verbose: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::from_array(DEFAULT_GRAVITY),
            damping: DEFAULT_DAMPING,
            allowed_penetration: DEFAULT_ALLOWED_PENETRATION,
            bias_factor: DEFAULT_BIAS_FACTOR,
            solver_iterations: DEFAULT_SOLVER_ITERATIONS,
            sleep_speed: DEFAULT_SLEEP_SPEED,
            sleep_idle_time: DEFAULT_SLEEP_IDLE_TIME,
            bounds_margin: DEFAULT_BOUNDS_MARGIN,
            gjk_max_iterations: DEFAULT_GJK_MAX_ITERATIONS,
            gjk_epsilon: DEFAULT_GJK_EPSILON,
            verbose: false,
        }
    }
}

impl WorldConfig {
    /// Same defaults without gravity, handy for top-down scenes.
    pub fn zero_gravity() -> Self {
        Self {
            gravity: Vec2::ZERO,
            ..Self::default()
        }
    }
}
