//! Unified error handling for slirc-services.
//!
//! Command failures become user-facing replies; link failures end the
//! current connection and are logged by the supervisor.

use crate::db::DbError;
use slirc_p10::ProtocolError;
use thiserror::Error;

// ============================================================================
// Handler Errors (service command processing)
// ============================================================================

/// Errors that can occur while a service processes a command.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Wrong number or shape of arguments. Carries the usage line.
    #[error("syntax: {0}")]
    Syntax(&'static str),

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("already authenticated as {0}")]
    AlreadyAuthenticated(String),

    #[error("permission denied")]
    PermissionDenied,

    #[error("invalid e-mail address")]
    InvalidEmail,

    #[error("e-mail addresses do not match")]
    EmailMismatch,

    #[error("store error: {0}")]
    Store(#[from] DbError),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "syntax",
            Self::NotAuthenticated => "not_authenticated",
            Self::AlreadyAuthenticated(_) => "already_authenticated",
            Self::PermissionDenied => "permission_denied",
            Self::InvalidEmail => "invalid_email",
            Self::EmailMismatch => "email_mismatch",
            Self::Store(_) => "store_error",
        }
    }

    /// Text sent back to the invoking user.
    pub fn reply_text(&self) -> String {
        match self {
            Self::Syntax(usage) => format!("Syntax: {usage}"),
            Self::NotAuthenticated => "You must be authenticated to use this command.".to_string(),
            Self::AlreadyAuthenticated(account) => {
                format!("You are already authenticated as \x02{account}\x02.")
            }
            Self::PermissionDenied => "Permission denied.".to_string(),
            Self::InvalidEmail => "Invalid e-mail address.".to_string(),
            Self::EmailMismatch => "E-mail addresses do not match.".to_string(),
            Self::Store(_) => "The request could not be completed. Please try again later.".to_string(),
        }
    }
}

/// Result type for service command handlers.
pub type HandlerResult<T> = Result<T, HandlerError>;

// ============================================================================
// Link Errors (uplink connection)
// ============================================================================

/// Errors that terminate the uplink connection.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("invalid service numeric: {0}")]
    Numeric(#[from] slirc_p10::NumericError),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("hub sent ERROR: {0}")]
    Remote(String),

    #[error("connection closed by hub")]
    Closed,
}

impl LinkError {
    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Protocol(_) => "protocol",
            Self::Tls(_) => "tls",
            Self::Numeric(_) => "numeric",
            Self::Handshake(_) => "handshake",
            Self::Remote(_) => "remote",
            Self::Closed => "closed",
        }
    }
}
