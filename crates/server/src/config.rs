use haraka::{DEFAULT_TICK_RATE, DiffPolicy, InstanceConfig};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub tick_rate: u32,
    pub history_capacity: usize,
    /// Stop after this many ticks; run until killed when `None`.
    pub max_ticks: Option<u32>,
    pub bots: usize,
    pub bot_interval_ms: u64,
    pub units_per_team: u32,
    pub full_diff: bool,
    /// Log statistics every this many ticks.
    pub stats_interval: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            history_capacity: 64,
            max_ticks: None,
            bots: 4,
            bot_interval_ms: 50,
            units_per_team: 8,
            full_diff: false,
            stats_interval: 75,
        }
    }
}

impl ServerConfig {
    pub fn instance_config(&self) -> InstanceConfig {
        InstanceConfig {
            tick_rate: self.tick_rate,
            history_capacity: self.history_capacity,
            diff_policy: if self.full_diff {
                DiffPolicy::Full
            } else {
                DiffPolicy::ChecksumGated
            },
        }
    }
}
