//! Core configuration types.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use thiserror::Error;

use super::defaults::{default_database_path, default_metrics_bind};
use super::links::HubConfig;
use super::services::{AbuseConfig, ServiceBlock, ServicesConfig};
use super::validation::{ValidationError, validate};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", format_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Services configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Verbose protocol logging.
    #[serde(default)]
    pub debug: bool,
    /// Our own server identity.
    pub server: ServerConfig,
    /// Uplink.
    pub hub: HubConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub abuse: AbuseConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        validate(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Advertised hostname of a pseudo-client.
    pub fn service_host<'a>(&'a self, block: &'a ServiceBlock) -> &'a str {
        block.host.as_deref().unwrap_or(&self.server.name)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name (e.g., "services.straylight.net").
    pub name: String,
    /// One-character server numeric.
    pub numeric: String,
    /// Server description.
    pub description: String,
    /// Prometheus metrics HTTP port (0 or unset disables the endpoint).
    #[serde(default)]
    pub metrics_port: Option<u16>,
    /// Address the metrics endpoint binds to.
    #[serde(default = "default_metrics_bind")]
    pub metrics_bind: IpAddr,
}

impl ServerConfig {
    /// Socket address of the metrics endpoint, if enabled.
    pub fn metrics_addr(&self) -> Option<SocketAddr> {
        match self.metrics_port {
            None | Some(0) => None,
            Some(port) => Some(SocketAddr::new(self.metrics_bind, port)),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}
