//! Utility helpers: generational storage, planar math, logging and profiling.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod profiling;

pub use allocator::{Arena, BodyHandle, Handle};
pub use math::*;
pub use profiling::StepProfile;
