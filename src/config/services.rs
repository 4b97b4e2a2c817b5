//! Pseudo-client and abuse-detection configuration.

use serde::Deserialize;

use super::defaults::*;

/// Identity of one pseudo-client, as introduced on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceBlock {
    pub enabled: bool,
    pub nick: String,
    pub ident: String,
    /// Advertised hostname. Falls back to the server name when unset.
    pub host: Option<String>,
    pub description: String,
    /// Three-character client suffix appended to the server numeric.
    pub numeric: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub nick: String,
    pub ident: String,
    pub host: Option<String>,
    pub description: String,
    pub numeric: String,
    /// How many accounts may share one e-mail address.
    pub max_accounts_per_email: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nick: default_auth_nick(),
            ident: "auth".to_string(),
            host: None,
            description: "Authentication Service".to_string(),
            numeric: "AAA".to_string(),
            max_accounts_per_email: default_max_accounts_per_email(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub enabled: bool,
    pub nick: String,
    pub ident: String,
    pub host: Option<String>,
    pub description: String,
    pub numeric: String,
    /// HMAC key for cloak derivation.
    pub cloak_secret: String,
    /// Pseudo-domain appended to every cloak.
    pub cloak_suffix: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nick: default_host_nick(),
            ident: "host".to_string(),
            host: None,
            description: "Host Cloaking Service".to_string(),
            numeric: "AAB".to_string(),
            cloak_secret: String::new(),
            cloak_suffix: default_cloak_suffix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpamConfig {
    pub enabled: bool,
    pub nick: String,
    pub ident: String,
    pub host: Option<String>,
    pub description: String,
    pub numeric: String,
    /// Shared secret for `AUTH` elevation.
    pub secret: String,
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nick: default_spam_nick(),
            ident: "spam".to_string(),
            host: None,
            description: "Channel Protection Service".to_string(),
            numeric: "AAC".to_string(),
            secret: String::new(),
        }
    }
}

macro_rules! impl_identity {
    ($($ty:ty),*) => {$(
        impl $ty {
            /// Wire identity of this pseudo-client.
            pub fn identity(&self) -> ServiceBlock {
                ServiceBlock {
                    enabled: self.enabled,
                    nick: self.nick.clone(),
                    ident: self.ident.clone(),
                    host: self.host.clone(),
                    description: self.description.clone(),
                    numeric: self.numeric.clone(),
                }
            }
        }
    )*};
}

impl_identity!(AuthConfig, HostConfig, SpamConfig);

/// The `[services]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    /// Channel that Auth and Host sit in.
    #[serde(default = "default_operations_channel")]
    pub operations_channel: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub spam: SpamConfig,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            operations_channel: default_operations_channel(),
            auth: AuthConfig::default(),
            host: HostConfig::default(),
            spam: SpamConfig::default(),
        }
    }
}

impl ServicesConfig {
    /// All pseudo-client identities, in processing order.
    pub fn blocks(&self) -> [ServiceBlock; 3] {
        [
            self.auth.identity(),
            self.host.identity(),
            self.spam.identity(),
        ]
    }
}

/// Abuse-detection thresholds and word lists.
#[derive(Debug, Clone, Deserialize)]
pub struct AbuseConfig {
    /// File listing homoglyph characters, one or more per line, `#` comments.
    #[serde(default = "default_homoglyph_file")]
    pub homoglyph_file: String,
    /// Words that trigger removal, merged with the persisted list.
    #[serde(default)]
    pub banned_words: Vec<String>,
    /// Seconds after a join during which a user counts as new.
    #[serde(default = "default_new_join_window")]
    pub new_join_window: u64,
    /// Identical lines tolerated before "repeating lines" fires.
    #[serde(default = "default_repeat_limit")]
    pub repeat_limit: u32,
    /// Flood score tolerated from established members.
    #[serde(default = "default_flood_limit")]
    pub flood_limit: u32,
    /// Flood score tolerated from new joiners.
    #[serde(default = "default_new_join_flood_limit")]
    pub new_join_flood_limit: u32,
    /// Seconds a removal ban stays set.
    #[serde(default = "default_removal_duration")]
    pub removal_duration: u64,
}

impl Default for AbuseConfig {
    fn default() -> Self {
        Self {
            homoglyph_file: default_homoglyph_file(),
            banned_words: Vec::new(),
            new_join_window: default_new_join_window(),
            repeat_limit: default_repeat_limit(),
            flood_limit: default_flood_limit(),
            new_join_flood_limit: default_new_join_flood_limit(),
            removal_duration: default_removal_duration(),
        }
    }
}
