use log::{log_enabled, Level};
use std::time::{Duration, Instant};

/// Scoped timer for the stages of a world update.
///
/// Emits `trace` records on entry and exit and, when constructed with
/// [`ScopedTimer::accumulate`], adds the elapsed time to a profile slot.
pub struct ScopedTimer<'a> {
    label: &'static str,
    start: Instant,
    output: Option<&'a mut Duration>,
}

impl ScopedTimer<'static> {
    pub fn new(label: &'static str) -> Self {
        Self::start(label, None)
    }
}

impl<'a> ScopedTimer<'a> {
    pub fn accumulate(label: &'static str, output: &'a mut Duration) -> Self {
        Self::start(label, Some(output))
    }

    fn start(label: &'static str, output: Option<&'a mut Duration>) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("start {label}");
        }
        Self {
            label,
            start: Instant::now(),
            output,
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        if let Some(output) = self.output.as_deref_mut() {
            *output += elapsed;
        }
        if log_enabled!(Level::Trace) {
            log::trace!("end {} ({} µs)", self.label, elapsed.as_micros());
        }
    }
}
