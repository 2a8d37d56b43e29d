use std::time::Duration;

use super::instance::InstanceConfig;

/// Most ticks a single frame may catch up on after a stall.
pub const MAX_CATCH_UP_TICKS: u32 = 4;

/// Turns wall-clock frame time into whole ticks of a [`GameInstance`] and
/// reports how far the clock is into the next one.
///
/// [`GameInstance`]: super::GameInstance
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: Duration,
    backlog: Duration,
    max_backlog: Duration,
    ticks_run: u64,
}

impl FixedTimestep {
    pub fn new(step: Duration) -> Self {
        let step = step.max(Duration::from_micros(1));
        Self {
            step,
            backlog: Duration::ZERO,
            max_backlog: step * MAX_CATCH_UP_TICKS,
            ticks_run: 0,
        }
    }

    /// Steps at exactly the duration the instance simulates per tick.
    pub fn from_config(config: &InstanceConfig) -> Self {
        Self::new(Duration::from_secs_f32(config.dt()))
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    /// Adds elapsed frame time. Whatever exceeds the catch-up limit is dropped
    /// and the simulation falls behind wall time instead.
    pub fn advance(&mut self, elapsed: Duration) {
        self.backlog += elapsed;
        if self.backlog > self.max_backlog {
            log::debug!(
                "Dropping {:?} of frame time",
                self.backlog - self.max_backlog
            );
            self.backlog = self.max_backlog;
        }
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.backlog < self.step {
            return false;
        }
        self.backlog -= self.step;
        self.ticks_run += 1;
        true
    }

    /// Fraction of the next tick already elapsed, used to sample replicas
    /// between the last two states.
    pub fn alpha(&self) -> f32 {
        (self.backlog.as_secs_f32() / self.step.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn until_next_tick(&self) -> Duration {
        self.step.saturating_sub(self.backlog)
    }

    pub fn reset(&mut self) {
        self.backlog = Duration::ZERO;
    }
}
