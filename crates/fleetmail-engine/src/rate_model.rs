use fleetmail_protocol::{config::EngineLimits, model::SpeedPolicy};
use rand::Rng;
use std::time::Duration;

pub fn next_delay(speed: SpeedPolicy, limits: &EngineLimits) -> Duration {
    next_delay_with(speed, limits, &mut rand::thread_rng())
}

pub fn next_delay_with<R: Rng + ?Sized>(
    speed: SpeedPolicy,
    limits: &EngineLimits,
    rng: &mut R,
) -> Duration {
    match speed {
        SpeedPolicy::FixedSecs(secs) => Duration::from_secs(secs),
        SpeedPolicy::Smart => {
            let (min, max) = limits.smart_delay_range();
            let min_ms = u64::try_from(min.as_millis()).unwrap_or(u64::MAX);
            let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
            Duration::from_millis(rng.gen_range(min_ms..=max_ms))
        }
    }
}
