use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::PhysicsWorld;

/// Cloneable handle to a world shared between owners.
///
/// Every access goes through one mutex, so updates and mutations from
/// different threads are serialised.
#[derive(Clone, Default)]
pub struct SharedWorld {
    inner: Arc<Mutex<PhysicsWorld>>,
}

impl SharedWorld {
    pub fn new(world: PhysicsWorld) -> Self {
        Self {
            inner: Arc::new(Mutex::new(world)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, PhysicsWorld> {
        self.inner.lock()
    }

    pub fn update(&self, dt: f32) {
        self.inner.lock().update(dt);
    }

    /// Runs `f` with exclusive access to the world.
    pub fn with<R>(&self, f: impl FnOnce(&mut PhysicsWorld) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Unwraps the world when this is the last handle.
    pub fn try_unwrap(self) -> Result<PhysicsWorld, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}
