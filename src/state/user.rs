//! Remote users as seen through the link.

use std::collections::HashSet;

/// A client introduced by the hub (or one of our own pseudo-clients).
#[derive(Debug, Clone, Default)]
pub struct RemoteUser {
    /// Client numeric. Never changes for the lifetime of the entry.
    pub numeric: String,
    pub nick: String,
    pub ident: String,
    /// Host the user connected from.
    pub host: String,
    /// Host set by `FA`, shown in place of the real host.
    pub cloaked_host: Option<String>,
    /// Linked account, `None` when not authenticated.
    pub account: Option<String>,
    /// Last channel line, for repeat detection.
    pub last_line: Option<String>,
    pub flood_score: u32,
    pub repeat_score: u32,
    /// Lowercased names of joined channels.
    pub channels: HashSet<String>,
    /// User mode `+k`: a network service.
    pub service: bool,
    /// User mode `+o`.
    pub oper: bool,
    /// Registered an account during this session.
    pub newly_registered: bool,
}

impl RemoteUser {
    pub fn new(numeric: &str, nick: &str, ident: &str, host: &str) -> Self {
        Self {
            numeric: numeric.to_string(),
            nick: nick.to_string(),
            ident: ident.to_string(),
            host: host.to_string(),
            ..Default::default()
        }
    }

    pub fn is_authed(&self) -> bool {
        self.account.is_some()
    }

    /// Host other users see.
    pub fn visible_host(&self) -> &str {
        self.cloaked_host.as_deref().unwrap_or(&self.host)
    }

    /// Apply a user mode string such as `+oiwk` or `-o`.
    pub fn apply_modes(&mut self, modes: &str) {
        let mut adding = true;
        for c in modes.chars() {
            match c {
                '+' => adding = true,
                '-' => adding = false,
                'o' => self.oper = adding,
                'k' => self.service = adding,
                'r' if !adding => self.account = None,
                _ => {}
            }
        }
    }
}
