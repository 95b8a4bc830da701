use std::env;
use std::time::Duration;

/// Timing of the simulated workflows
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Wall-clock length of a charging session (env: `EVCC_CHARGING_DURATION_MS`)
    pub charging_duration: Duration,
    /// Wall-clock length of a certificate workflow (env: `EVCC_CERTIFICATE_DURATION_MS`)
    pub certificate_duration: Duration,
    /// Driver tick (env: `EVCC_TICK_INTERVAL_MS`)
    pub tick_interval: Duration,
}

impl SimulationConfig {
    pub fn from_env() -> Self {
        Self {
            charging_duration: millis_from_env("EVCC_CHARGING_DURATION_MS", 8000),
            certificate_duration: millis_from_env("EVCC_CERTIFICATE_DURATION_MS", 10000),
            tick_interval: millis_from_env("EVCC_TICK_INTERVAL_MS", 60).max(Duration::from_millis(1)),
        }
    }
}

fn millis_from_env(key: &str, default: u64) -> Duration {
    let millis = env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default);
    Duration::from_millis(millis)
}
