use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineLimits {
    pub retry_cooldown_secs: u64,
    pub max_retries: u32,
    pub smart_delay_min_secs: u64,
    pub smart_delay_max_secs: u64,
    pub control_poll_interval_secs: u64,
    pub heartbeat_interval_secs: u64,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            retry_cooldown_secs: 60,
            max_retries: 3,
            smart_delay_min_secs: 15,
            smart_delay_max_secs: 120,
            control_poll_interval_secs: 30,
            heartbeat_interval_secs: 5 * 60,
        }
    }
}

impl EngineLimits {
    pub fn retry_cooldown(&self) -> Duration {
        Duration::from_secs(self.retry_cooldown_secs)
    }

    pub fn smart_delay_range(&self) -> (Duration, Duration) {
        let min = Duration::from_secs(self.smart_delay_min_secs);
        let max = Duration::from_secs(self.smart_delay_max_secs).max(min);
        (min, max)
    }

    pub fn control_poll_interval(&self) -> Duration {
        Duration::from_secs(self.control_poll_interval_secs.max(1))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }
}
