//! Error types for the P10 wire layer.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Errors raised while framing or tokenizing protocol lines.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Underlying transport failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A line exceeded the configured maximum length.
    #[error("line too long: {actual} bytes (limit {limit})")]
    LineTooLong { actual: usize, limit: usize },

    /// The line contained no command token.
    #[error("empty line")]
    EmptyLine,

    /// A source prefix was present but no command followed it.
    #[error("missing command after source '{0}'")]
    MissingCommand(String),
}
