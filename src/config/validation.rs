//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use slirc_p10::numeric::{self, NumericError};
use std::collections::HashSet;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("server.numeric: {0}")]
    InvalidServerNumeric(NumericError),
    #[error("hub.host is required")]
    MissingHubHost,
    #[error("hub.password is required")]
    MissingHubPassword,
    #[error("services.{service}.numeric: {source}")]
    InvalidSuffix {
        service: String,
        source: NumericError,
    },
    #[error("services.{0}.numeric '{1}' is already used by another service")]
    DuplicateSuffix(String, String),
    #[error("services.{0}.nick is required")]
    MissingNick(String),
    #[error("services.operations_channel must start with '#', got '{0}'")]
    InvalidOperationsChannel(String),
    #[error("services.host.cloak_secret is required when the host service is enabled")]
    MissingCloakSecret,
    #[error("services.spam.secret is required when the spam service is enabled")]
    MissingSpamSecret,
    #[error("abuse.{0} must be greater than zero")]
    ZeroThreshold(&'static str),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }
    if let Err(e) = numeric::validate_server(&config.server.numeric) {
        errors.push(ValidationError::InvalidServerNumeric(e));
    }
    if config.hub.host.is_empty() {
        errors.push(ValidationError::MissingHubHost);
    }
    if config.hub.password.is_empty() {
        errors.push(ValidationError::MissingHubPassword);
    }

    // Suffixes only need to be unique among services that are introduced
    let mut seen = HashSet::new();
    for (name, block) in ["auth", "host", "spam"]
        .into_iter()
        .zip(config.services.blocks())
    {
        if !block.enabled {
            continue;
        }
        if block.nick.is_empty() {
            errors.push(ValidationError::MissingNick(name.to_string()));
        }
        if let Err(source) = numeric::validate_suffix(&block.numeric) {
            errors.push(ValidationError::InvalidSuffix {
                service: name.to_string(),
                source,
            });
        } else if !seen.insert(block.numeric.clone()) {
            errors.push(ValidationError::DuplicateSuffix(
                name.to_string(),
                block.numeric.clone(),
            ));
        }
    }

    if !config.services.operations_channel.starts_with('#') {
        errors.push(ValidationError::InvalidOperationsChannel(
            config.services.operations_channel.clone(),
        ));
    }
    if config.services.host.enabled && config.services.host.cloak_secret.is_empty() {
        errors.push(ValidationError::MissingCloakSecret);
    }
    if config.services.spam.enabled && config.services.spam.secret.is_empty() {
        errors.push(ValidationError::MissingSpamSecret);
    }

    let abuse = &config.abuse;
    for (name, value) in [
        ("repeat_limit", abuse.repeat_limit),
        ("flood_limit", abuse.flood_limit),
        ("new_join_flood_limit", abuse.new_join_flood_limit),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroThreshold(name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> String {
        r#"
[server]
name = "services.test"
numeric = "S"
description = "Test Services"

[hub]
host = "127.0.0.1"
password = "linkpass"

[services.host]
cloak_secret = "hunter2hunter2"

[services.spam]
secret = "letmein"
"#
        .to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        assert!(validate(&config).is_ok());
        assert_eq!(config.hub.port, 4400);
        assert_eq!(config.services.auth.nick, "AuthServ");
        assert_eq!(config.services.host.nick, "HostServ");
        assert_eq!(config.abuse.new_join_window, 300);
        assert_eq!(config.abuse.repeat_limit, 3);
        assert_eq!(config.service_host(&config.services.spam.identity()), "services.test");
    }

    #[test]
    fn test_duplicate_suffix_fails() {
        let toml = minimal_valid_config().replace(
            "[services.spam]",
            "[services.spam]\nnumeric = \"AAA\"",
        );
        let config: Config = toml::from_str(&toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::DuplicateSuffix(s, _) if s == "spam"))
        );
    }

    #[test]
    fn test_disabled_service_skips_checks() {
        let toml = minimal_valid_config().replace(
            "[services.host]\ncloak_secret = \"hunter2hunter2\"",
            "[services.host]\nenabled = false\nnumeric = \"AAC\"",
        );
        let config: Config = toml::from_str(&toml).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_bad_server_numeric_fails() {
        let toml = minimal_valid_config().replace("numeric = \"S\"", "numeric = \"SSS\"");
        let config: Config = toml::from_str(&toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::InvalidServerNumeric(_)))
        );
    }

    #[test]
    fn test_parse_reports_all_errors() {
        let toml = minimal_valid_config()
            .replace("password = \"linkpass\"", "password = \"\"")
            .replace("secret = \"letmein\"", "secret = \"\"");
        let err = Config::parse(&toml).unwrap_err().to_string();
        assert!(err.contains("hub.password"));
        assert!(err.contains("services.spam.secret"));
    }

    #[test]
    fn test_metrics_endpoint_address() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        assert_eq!(config.server.metrics_addr(), None);

        let toml = minimal_valid_config()
            .replace("description = \"Test Services\"", "description = \"Test Services\"\nmetrics_port = 9100");
        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(
            config.server.metrics_addr(),
            Some("127.0.0.1:9100".parse().unwrap())
        );

        let toml = toml.replace("metrics_port = 9100", "metrics_port = 9100\nmetrics_bind = \"0.0.0.0\"");
        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(
            config.server.metrics_addr(),
            Some("0.0.0.0:9100".parse().unwrap())
        );
    }
}
