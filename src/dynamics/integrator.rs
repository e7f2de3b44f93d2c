use glam::Vec2;

use crate::{config::WorldConfig, core::rigidbody::RigidBody};

/// Semi-implicit Euler integrator with linear damping and idle-based sleeping.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub gravity: Vec2,
    pub damping: f32,
    pub sleep_speed: f32,
    pub sleep_idle_time: f32,
}

impl Default for Integrator {
    fn default() -> Self {
        Self::from_config(&WorldConfig::default())
    }
}

impl Integrator {
    pub fn from_config(config: &WorldConfig) -> Self {
        Self {
            gravity: config.gravity,
            damping: config.damping,
            sleep_speed: config.sleep_speed,
            sleep_idle_time: config.sleep_idle_time,
        }
    }

    /// Applies forces, gravity, pending impulses and damping.
    pub fn integrate_velocity(&self, body: &mut RigidBody, dt: f32) {
        if body.is_static() {
            return;
        }

        body.velocity += (body.force * body.inv_mass() + self.gravity) * dt;
        body.angular_velocity += body.torque * body.inv_inertia() * dt;

        body.velocity += body.force_impulse * body.inv_mass();
        body.angular_velocity += body.torque_impulse * body.inv_inertia();
        body.force_impulse = Vec2::ZERO;
        body.torque_impulse = 0.0;

        let keep = (1.0 - self.damping * dt).max(0.0);
        body.velocity *= keep;
        body.angular_velocity *= keep;
    }

    /// Moves the body, refreshes its transform and puts it to sleep once it
    /// has idled long enough. Returns `true` while the body stays awake.
    pub fn integrate_position(&self, body: &mut RigidBody, dt: f32) -> bool {
        if !body.is_static() {
            body.position += body.velocity * dt;
            body.rotation += body.angular_velocity * dt;
        }

        if body.is_static() || body.can_idle(self.sleep_speed) {
            body.idle_time += dt;
        } else {
            body.idle_time = 0.0;
        }

        if body.is_static() || body.idle_time > self.sleep_idle_time {
            body.idle_time = 0.0;
            body.sleep();
        }

        body.update_transform();
        body.is_active()
    }
}
