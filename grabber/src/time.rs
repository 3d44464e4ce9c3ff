use std::time::Duration;

/// Frame timing supplied by the runtime driving the tick loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct Time {
    /// Time elapsed since the previous tick
    pub elapsed: Duration,
    /// Total time since the runtime started
    pub total: Duration,
}

impl Time {
    pub fn delta_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}
