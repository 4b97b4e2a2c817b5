//! Hostname cloaking.
//!
//! Each dot- or colon-separated field of a host or IP is run through
//! HMAC-SHA256 with the network secret and cut to four hex characters.
//! The fields are joined with dots and the network's cloak suffix:
//!
//! - `203.0.113.7` -> `1f3a.9bc0.77e2.04d1.users.example`
//! - `2001:db8::1` -> `a0c4.5e19.8dd2.users.example`
//!
//! The mapping is deterministic for a given secret, so a user keeps the
//! same cloak across sessions, and it cannot be reversed without the secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex characters kept per field.
const FIELD_LEN: usize = 4;

fn cloak_field(field: &str, secret_key: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret_key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(field.as_bytes());
    let digest = mac.finalize().into_bytes();
    digest
        .iter()
        .take(FIELD_LEN / 2)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Derive the cloak for a hostname or IP address.
pub fn cloak_host(host: &str, secret_key: &str, suffix: &str) -> String {
    let mut parts: Vec<String> = host
        .split(['.', ':'])
        .filter(|f| !f.is_empty())
        .map(|f| cloak_field(&f.to_ascii_lowercase(), secret_key))
        .collect();
    let suffix = suffix.trim_start_matches('.');
    if !suffix.is_empty() {
        parts.push(suffix.to_string());
    }
    parts.join(".")
}

/// Check if a secret key is a placeholder that should be changed.
pub fn is_default_secret(secret: &str) -> bool {
    secret.is_empty()
        || secret.contains("default")
        || secret.contains("changeme")
        || secret.len() < 16
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-unit-tests";

    #[test]
    fn cloak_has_one_field_per_label() {
        let cloak = cloak_host("203.0.113.7", TEST_SECRET, "users.test");
        let fields: Vec<&str> = cloak.split('.').collect();
        assert_eq!(fields.len(), 6);
        assert!(cloak.ends_with(".users.test"));
        for field in &fields[..4] {
            assert_eq!(field.len(), 4);
            assert!(field.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn ipv6_fields_split_on_colons() {
        let cloak = cloak_host("2001:db8::1", TEST_SECRET, "users.test");
        assert_eq!(cloak.split('.').count(), 5);
    }

    #[test]
    fn cloak_is_deterministic_and_keyed() {
        let a = cloak_host("client.example.com", TEST_SECRET, "x");
        let b = cloak_host("CLIENT.example.com", TEST_SECRET, "x");
        let c = cloak_host("client.example.com", "another-secret-entirely", "x");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn equal_labels_cloak_equally() {
        let cloak = cloak_host("a.b.a", TEST_SECRET, "");
        let fields: Vec<&str> = cloak.split('.').collect();
        assert_eq!(fields[0], fields[2]);
        assert_ne!(fields[0], fields[1]);
    }

    #[test]
    fn weak_secrets_detected() {
        assert!(is_default_secret(""));
        assert!(is_default_secret("changeme"));
        assert!(!is_default_secret("a-long-random-network-secret"));
    }
}
