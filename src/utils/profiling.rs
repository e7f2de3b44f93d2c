use std::time::Duration;

/// Timings and counters collected during one [`crate::PhysicsWorld::update`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StepProfile {
    pub integration_time: Duration,
    pub broad_phase_time: Duration,
    pub narrow_phase_time: Duration,
    pub solver_time: Duration,
    pub total_time: Duration,

    pub body_count: usize,
    pub active_body_count: usize,
    pub candidate_pairs: usize,
    pub gjk_queries: usize,
    pub collision_pairs: usize,
}

impl StepProfile {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn share(&self, part: Duration) -> f32 {
        let total = self.total_time.as_secs_f32();
        if total <= f32::EPSILON {
            0.0
        } else {
            part.as_secs_f32() / total * 100.0
        }
    }

    /// Writes the profile to the `debug` log level.
    pub fn report(&self) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }

        log::debug!(
            "step {:.3} ms | bodies {} (active {}) | candidates {} | gjk {} | pairs {}",
            self.total_time.as_secs_f32() * 1000.0,
            self.body_count,
            self.active_body_count,
            self.candidate_pairs,
            self.gjk_queries,
            self.collision_pairs,
        );
        log::debug!(
            "  integrate {:.1}% | broad {:.1}% | narrow {:.1}% | solver {:.1}%",
            self.share(self.integration_time),
            self.share(self.broad_phase_time),
            self.share(self.narrow_phase_time),
            self.share(self.solver_time),
        );
    }
}
