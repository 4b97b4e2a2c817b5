//! Uplink configuration.

use serde::Deserialize;

use super::defaults::default_hub_port;

/// The hub this services server links to.
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Hub hostname or IP to connect to.
    pub host: String,
    /// Hub server port.
    #[serde(default = "default_hub_port")]
    pub port: u16,
    /// Link password (must match the hub's connect block).
    pub password: String,
    /// Whether to use TLS for this link. The hub certificate is verified
    /// against the platform trust store.
    #[serde(default)]
    pub tls: bool,
}

impl HubConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
