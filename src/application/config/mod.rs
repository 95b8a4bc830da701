pub mod certificates;
pub mod remote;
pub mod server;
pub mod simulation;

use once_cell::sync::Lazy;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub simulation: simulation::SimulationConfig,
    pub certificates: certificates::CertificatesConfig,
    pub remote: remote::RemoteConfig,

    // Build info
    pub commit_hash: String,
    pub build_time: String,
    pub version: String,

    // Logging
    pub log_level: String,
    /// `json` switches the subscriber to structured output
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: server::ServerConfig::from_env(),
            simulation: simulation::SimulationConfig::from_env(),
            certificates: certificates::CertificatesConfig::from_env(),
            remote: remote::RemoteConfig::from_env(),

            // Build info
            commit_hash: env::var("COMMIT_HASH").unwrap_or_else(|_| "unknown".to_string()),
            build_time: env::var("BUILD_TIME").unwrap_or_else(|_| "unknown".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),

            // Logging
            log_level: env::var("EVCC_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string()),
            log_format: env::var("EVCC_LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
        }
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
