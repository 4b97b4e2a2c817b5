//! The P10 line model.
//!
//! Every line after the handshake carries a numeric source token followed by
//! a command token. `PASS`, `SERVER` and `ERROR` lines are sent before
//! numerics are known and carry no source.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Commands that appear without a source during the handshake.
const SOURCELESS: &[&str] = &["PASS", "SERVER", "ERROR"];

/// A tokenized protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Numeric (or server name, during the handshake) that sent the line.
    pub source: Option<String>,
    /// Command token, e.g. `N`, `P`, `EB`.
    pub command: String,
    /// Parameters, with the `:`-trailing parameter (if any) last and unprefixed.
    pub params: Vec<String>,
    /// Whether the last parameter was (or must be) written in trailing form.
    pub trailing: bool,
}

impl Message {
    /// Build a message whose last parameter is written in trailing form.
    pub fn new<S, C, I, P>(source: Option<S>, command: C, params: I) -> Self
    where
        S: Into<String>,
        C: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            source: source.map(Into::into),
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
            trailing: true,
        }
    }

    /// Build a message whose parameters are all plain tokens.
    ///
    /// A last parameter containing a space is still written in trailing form
    /// so the line stays parseable.
    pub fn plain<S, C, I, P>(source: Option<S>, command: C, params: I) -> Self
    where
        S: Into<String>,
        C: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            trailing: false,
            ..Self::new(source, command, params)
        }
    }

    /// Parameter at `idx`, if present.
    pub fn arg(&self, idx: usize) -> Option<&str> {
        self.params.get(idx).map(String::as_str)
    }

    /// The last parameter, which is the free text for `P`/`O` lines.
    pub fn last_arg(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Case-insensitive command comparison.
    pub fn is(&self, command: &str) -> bool {
        self.command.eq_ignore_ascii_case(command)
    }

    /// The source token, or an empty string for sourceless lines.
    pub fn source_str(&self) -> &str {
        self.source.as_deref().unwrap_or("")
    }
}

/// Split the next space-delimited token off `rest`, skipping repeated spaces.
fn next_token(rest: &str) -> (&str, &str) {
    let rest = rest.trim_start_matches(' ');
    match rest.find(' ') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, ""),
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (first, mut rest) = next_token(line);
        if first.is_empty() {
            return Err(ProtocolError::EmptyLine);
        }

        let (source, command) = if let Some(src) = first.strip_prefix(':') {
            let (cmd, r) = next_token(rest);
            if cmd.is_empty() {
                return Err(ProtocolError::MissingCommand(src.to_owned()));
            }
            rest = r;
            (Some(src.to_owned()), cmd)
        } else if SOURCELESS.iter().any(|c| c.eq_ignore_ascii_case(first)) {
            (None, first)
        } else {
            let (cmd, r) = next_token(rest);
            if cmd.is_empty() {
                // A bare token with nothing after it is a sourceless command.
                (None, first)
            } else {
                rest = r;
                (Some(first.to_owned()), cmd)
            }
        };

        let mut params = Vec::new();
        let mut trailing = false;
        loop {
            let trimmed = rest.trim_start_matches(' ');
            if trimmed.is_empty() {
                break;
            }
            if let Some(text) = trimmed.strip_prefix(':') {
                params.push(text.to_owned());
                trailing = true;
                break;
            }
            let (tok, r) = next_token(trimmed);
            params.push(tok.to_owned());
            rest = r;
        }

        Ok(Self {
            source,
            command: command.to_owned(),
            params,
            trailing,
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "{} ", source)?;
        }
        f.write_str(&self.command)?;

        let Some((last, init)) = self.params.split_last() else {
            return Ok(());
        };
        for param in init {
            write!(f, " {}", param)?;
        }
        let needs_colon =
            self.trailing || last.is_empty() || last.contains(' ') || last.starts_with(':');
        if needs_colon {
            write!(f, " :{}", last)
        } else {
            write!(f, " {}", last)
        }
    }
}
