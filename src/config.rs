use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::adapters::Iperf3Config;
use crate::domain::Target;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name} {value:?}: {source}")]
    Duration {
        name: &'static str,
        value: String,
        source: humantime::DurationError,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Application configuration, from flags or the environment
#[derive(Debug, Clone, Parser)]
#[command(name = "iperfmon")]
#[command(about = "Periodically runs iperf3 against a server and exports the results to Prometheus")]
#[command(version)]
pub struct Config {
    /// iperf3 server address
    #[arg(long, env = "IPERFMON_SERVER", default_value = "127.0.0.1")]
    pub server: String,

    /// iperf3 server port
    #[arg(long, env = "IPERFMON_PORT", default_value_t = 5201)]
    pub port: u16,

    /// Time between successful measurements, e.g. "5m" or "30s"
    #[arg(long, env = "IPERFMON_INTERVAL", default_value = "5m")]
    pub interval: String,

    /// Listen address of the metrics endpoint
    #[arg(long, env = "IPERFMON_ADDR", default_value = "0.0.0.0:9103")]
    pub addr: String,

    /// Path to the iperf3 executable
    #[arg(long, env = "IPERFMON_IPERF3_PATH", default_value = "iperf3")]
    pub iperf3_path: PathBuf,

    /// iperf3 connect timeout in milliseconds
    #[arg(long, env = "IPERFMON_CONNECT_TIMEOUT", default_value_t = 1000)]
    pub connect_timeout: u64,

    /// Upper bound on a single iperf3 run
    #[arg(long, env = "IPERFMON_TIMEOUT", default_value = "2m")]
    pub timeout: String,

    /// Log level for iperfmon when RUST_LOG is not set
    #[arg(long, env = "IPERFMON_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn target(&self) -> Target {
        Target::new(self.server.clone(), self.port)
    }

    pub fn sampling_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration("interval", &self.interval)
    }

    pub fn iperf3(&self) -> Result<Iperf3Config, ConfigError> {
        Ok(Iperf3Config::new(
            self.iperf3_path.clone(),
            Duration::from_millis(self.connect_timeout),
            parse_duration("timeout", &self.timeout)?,
        ))
    }
}

fn parse_duration(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let duration = humantime::parse_duration(value.trim()).map_err(|source| ConfigError::Duration {
        name,
        value: value.to_string(),
        source,
    })?;

    if duration.is_zero() {
        return Err(ConfigError::Zero(name));
    }

    Ok(duration)
}
