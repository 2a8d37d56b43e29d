mod instance;
mod tick;

pub use instance::{
    DEFAULT_HISTORY_CAPACITY, DEFAULT_TICK_RATE, GameInstance, InstanceConfig, TickOutcome,
};
pub use tick::{FixedTimestep, MAX_CATCH_UP_TICKS};
