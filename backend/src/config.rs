use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::candidates::StepConfig;
use crate::matcher::DEFAULT_TOLERANCE_DEG;
use crate::search::SearchConfig;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("port must be non-zero")]
    ZeroPort,
    #[error("match tolerance must be a positive number of degrees, got {0}")]
    InvalidTolerance(f64),
    #[error("osrm timeout must be at least one second")]
    ZeroTimeout,
}

#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "Bike path condition backend: scored route search and segment reports"
)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "BIKE_PATHS_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, env = "BIKE_PATHS_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Load user "alice" and two demo segments at startup
    #[arg(
        long,
        env = "BIKE_PATHS_SEED_DEMO",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub seed_demo: bool,

    /// OSRM base URL for trip geometry; empty disables the lookup
    #[arg(long, env = "OSRM_URL", default_value = "http://router.project-osrm.org")]
    pub osrm_url: String,

    #[arg(long, env = "OSRM_TIMEOUT_SECS", default_value_t = 12)]
    pub osrm_timeout_secs: u64,

    /// Max degree distance between a segment midpoint and a candidate route
    #[arg(long, env = "MATCH_TOLERANCE_DEG", default_value_t = DEFAULT_TOLERANCE_DEG)]
    pub match_tolerance_deg: f64,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if !(self.match_tolerance_deg.is_finite() && self.match_tolerance_deg > 0.0) {
            return Err(ConfigError::InvalidTolerance(self.match_tolerance_deg));
        }
        if self.osrm_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn osrm_timeout(&self) -> Duration {
        Duration::from_secs(self.osrm_timeout_secs)
    }

    pub fn osrm_base_url(&self) -> Option<&str> {
        let url = self.osrm_url.trim();
        (!url.is_empty()).then_some(url)
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            tolerance_deg: self.match_tolerance_deg,
            steps: StepConfig::default(),
        }
    }
}
