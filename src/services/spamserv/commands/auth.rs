//! AUTH command handler for SpamServ.

use super::super::SpamServ;
use crate::services::base::{Replier, ServiceResult};
use crate::state::RemoteUser;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

impl SpamServ {
    /// Handle AUTH: elevate the session when the secret matches.
    pub(super) fn handle_auth(
        &mut self,
        user: &RemoteUser,
        args: &[&str],
        r: &Replier,
    ) -> ServiceResult {
        let [secret] = args else {
            return vec![r.line("Syntax: AUTH <secret>")];
        };
        if self.elevated.contains(&user.numeric) {
            return vec![r.line("You are already elevated.")];
        }

        let matches: bool = secret.as_bytes().ct_eq(self.secret.as_bytes()).into();
        if !matches || self.secret.is_empty() {
            warn!(nick = %user.nick, host = %user.host, "SpamServ AUTH failed");
            return vec![r.line("Incorrect secret.")];
        }

        self.elevated.insert(user.numeric.clone());
        info!(nick = %user.nick, "SpamServ session elevated");
        vec![r.line("You are now elevated for this session.")]
    }
}
