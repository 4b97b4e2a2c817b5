//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::net::{IpAddr, Ipv4Addr};

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

pub fn default_database_path() -> String {
    "services.db".to_string()
}

pub fn default_metrics_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

pub fn default_hub_port() -> u16 {
    4400
}

pub fn default_operations_channel() -> String {
    "#opers".to_string()
}

// =============================================================================
// Pseudo-client Defaults
// =============================================================================

pub fn default_auth_nick() -> String {
    "AuthServ".to_string()
}

pub fn default_host_nick() -> String {
    "HostServ".to_string()
}

pub fn default_spam_nick() -> String {
    "SpamServ".to_string()
}

pub fn default_max_accounts_per_email() -> usize {
    1
}

pub fn default_cloak_suffix() -> String {
    "users.slirc".to_string()
}

// =============================================================================
// Abuse Defaults
// =============================================================================

pub fn default_homoglyph_file() -> String {
    "homoglyphs.txt".to_string()
}

pub fn default_new_join_window() -> u64 {
    300
}

pub fn default_repeat_limit() -> u32 {
    3
}

pub fn default_flood_limit() -> u32 {
    5
}

pub fn default_new_join_flood_limit() -> u32 {
    2
}

pub fn default_removal_duration() -> u64 {
    600
}
