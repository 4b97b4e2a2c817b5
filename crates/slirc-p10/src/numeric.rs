//! Numeric-nick helpers.
//!
//! Servers are identified by a one-character numeric. Clients are the owning
//! server's numeric followed by a three-character client suffix, so a client
//! numeric also says which server it lives behind.

use std::fmt;
use thiserror::Error;

/// The 64-character numeric alphabet.
pub const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789[]";

/// Length of a client suffix.
pub const SUFFIX_LEN: usize = 3;

/// Placeholder sent in the IP slot of `N` lines for pseudo-clients.
pub const NULL_IP: &str = "AAAAAA";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NumericError {
    #[error("server numeric must be 1 or 2 characters, got '{0}'")]
    ServerLength(String),
    #[error("client suffix must be 3 characters, got '{0}'")]
    SuffixLength(String),
    #[error("'{0}' is not in the numeric alphabet")]
    BadChar(char),
}

/// Whether `c` is a legal numeric character.
pub fn is_numeric_char(c: char) -> bool {
    c.is_ascii() && ALPHABET.contains(&(c as u8))
}

fn check_chars(s: &str) -> Result<(), NumericError> {
    match s.chars().find(|c| !is_numeric_char(*c)) {
        Some(c) => Err(NumericError::BadChar(c)),
        None => Ok(()),
    }
}

/// Validate a server numeric.
pub fn validate_server(numeric: &str) -> Result<(), NumericError> {
    if !(1..=2).contains(&numeric.len()) {
        return Err(NumericError::ServerLength(numeric.to_owned()));
    }
    check_chars(numeric)
}

/// Validate a client suffix.
pub fn validate_suffix(suffix: &str) -> Result<(), NumericError> {
    if suffix.len() != SUFFIX_LEN {
        return Err(NumericError::SuffixLength(suffix.to_owned()));
    }
    check_chars(suffix)
}

/// Whether a line source names a server rather than a client.
pub fn is_server_source(source: &str) -> bool {
    !source.is_empty() && source.len() <= 2
}

/// A client numeric built from a server numeric and a suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientNumeric {
    server: String,
    suffix: String,
}

impl ClientNumeric {
    pub fn new(server: &str, suffix: &str) -> Result<Self, NumericError> {
        validate_server(server)?;
        validate_suffix(suffix)?;
        Ok(Self {
            server: server.to_owned(),
            suffix: suffix.to_owned(),
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Whether `numeric` belongs to a client of `server`.
    pub fn belongs_to(numeric: &str, server: &str) -> bool {
        numeric.len() == server.len() + SUFFIX_LEN && numeric.starts_with(server)
    }
}

impl fmt::Display for ClientNumeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.server, self.suffix)
    }
}
