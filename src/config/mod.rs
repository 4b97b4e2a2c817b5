//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: top-level [`Config`], server identity and database settings
//! - [`links`]: the uplink to the hub
//! - [`services`]: per-pseudo-client blocks and the abuse thresholds
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks

mod defaults;
mod links;
mod services;
mod types;
mod validation;

pub use links::HubConfig;
pub use services::{AbuseConfig, AuthConfig, HostConfig, ServiceBlock, ServicesConfig, SpamConfig};
pub use types::{Config, ConfigError, DatabaseConfig, ServerConfig};
pub use validation::{ValidationError, validate};
