//! Shared pieces of every service: the pseudo-client identity, addressing,
//! and reply helpers.

use crate::config::{Config, ServiceBlock};
use crate::db::{Database, OrLogDefault};
use crate::error::HandlerError;
use crate::flags::UserFlags;
use crate::state::NetworkState;
use slirc_p10::builder::{self, Introduction};
use slirc_p10::{ClientNumeric, Message, NumericError, irc_eq};
use tracing::warn;

use super::ServiceEffect;

/// Result type for service commands - a list of effects to apply.
pub type ServiceResult = Vec<ServiceEffect>;

/// User modes every pseudo-client is introduced with.
pub const PSEUDO_CLIENT_MODES: &str = "+iok";

/// Version string answered by `VERSION`.
pub const VERSION: &str = concat!("slirc-services ", env!("CARGO_PKG_VERSION"));

/// Registration lifecycle of one pseudo-client on the current link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceState {
    #[default]
    Unregistered,
    /// Introduced during our burst, waiting for the hub's burst ack.
    RegisteredPendingJoin,
    /// Home channels joined; commands are processed.
    Active,
}

/// How a `P` line reached a pseudo-client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressed {
    /// Target was the client's numeric.
    Direct,
    /// Target was `nick@server`.
    Relayed,
}

/// A virtual user introduced for one service.
#[derive(Debug, Clone)]
pub struct PseudoClient {
    pub numeric: String,
    pub nick: String,
    pub ident: String,
    pub host: String,
    pub description: String,
    pub state: ServiceState,
}

impl PseudoClient {
    /// Build a pseudo-client from its configured identity.
    pub fn from_block(config: &Config, block: &ServiceBlock) -> Result<Self, NumericError> {
        let numeric = ClientNumeric::new(&config.server.numeric, &block.numeric)?;
        Ok(Self {
            numeric: numeric.to_string(),
            nick: block.nick.clone(),
            ident: block.ident.clone(),
            host: config.service_host(block).to_string(),
            description: block.description.clone(),
            state: ServiceState::Unregistered,
        })
    }

    pub fn is_active(&self) -> bool {
        self.state == ServiceState::Active
    }

    /// The `N` line introducing this client.
    pub fn introduction(&self, server: &str, now: i64) -> Message {
        builder::nick_intro(
            server,
            &Introduction {
                nick: &self.nick,
                ident: &self.ident,
                host: &self.host,
                modes: PSEUDO_CLIENT_MODES,
                numeric: &self.numeric,
                description: &self.description,
                timestamp: now,
            },
        )
    }

    /// Whether a message target names this client.
    pub fn addressed_by(&self, target: &str, server_name: &str) -> Option<Addressed> {
        if target == self.numeric {
            return Some(Addressed::Direct);
        }
        let (nick, server) = target.split_once('@')?;
        (irc_eq(nick, &self.nick) && server.eq_ignore_ascii_case(server_name))
            .then_some(Addressed::Relayed)
    }
}

/// Split command text into an uppercased verb and its arguments.
pub fn split_command(text: &str) -> Option<(String, Vec<&str>)> {
    let mut parts = text.split_whitespace();
    let verb = parts.next()?.to_ascii_uppercase();
    Some((verb, parts.collect()))
}

/// Whether replies to `sender` should be notices.
///
/// Only authenticated users with the notice-preference flag get notices.
pub async fn prefers_notice(db: &Database, state: &NetworkState, sender: &str) -> bool {
    let Some(account) = state.user(sender).and_then(|u| u.account.as_deref()) else {
        return false;
    };
    let flags = db.accounts().flags(account).await.or_log_default("flags");
    UserFlags::from_bits_truncate(flags).wants_notice()
}

/// Builds replies from one pseudo-client to one user.
#[derive(Debug, Clone)]
pub struct Replier {
    from: String,
    to: String,
    notice: bool,
}

impl Replier {
    pub fn new(from: &str, to: &str, notice: bool) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            notice,
        }
    }

    /// Numeric of the user being answered.
    pub fn target(&self) -> &str {
        &self.to
    }

    /// Create a single reply effect.
    pub fn line(&self, text: &str) -> ServiceEffect {
        let msg = if self.notice {
            builder::notice(&self.from, &self.to, text)
        } else {
            builder::privmsg(&self.from, &self.to, text)
        };
        ServiceEffect::Send(msg)
    }

    /// Create multiple reply effects.
    pub fn lines<I, S>(&self, texts: I) -> ServiceResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        texts.into_iter().map(|t| self.line(t.as_ref())).collect()
    }
}

/// One entry of a service's command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandHelp {
    pub name: &'static str,
    pub syntax: &'static str,
    pub summary: &'static str,
}

/// Base trait for services providing common reply functionality.
pub trait ServiceBase {
    /// Get the service name (e.g., "AuthServ").
    fn service_name(&self) -> &'static str;

    /// Commands this service answers, for `SHOWCOMMANDS` and `HELP`.
    fn commands(&self) -> &'static [CommandHelp];

    /// Count a command, folding verbs we do not answer into one label.
    fn count_command(&self, verb: &str) {
        let label = self
            .commands()
            .iter()
            .find(|c| c.name == verb)
            .map_or("unknown", |c| c.name);
        crate::metrics::record_command(self.service_name(), label);
    }

    /// Create an unknown command reply.
    fn unknown_command(&self, r: &Replier, verb: &str) -> ServiceResult {
        vec![r.line(&format!(
            "Unknown command: \x02{verb}\x02. Use \x02SHOWCOMMANDS\x02 for a list of commands."
        ))]
    }

    fn showcommands_reply(&self, r: &Replier) -> ServiceResult {
        let mut lines = vec![format!("\x02{}\x02 commands:", self.service_name())];
        lines.extend(
            self.commands()
                .iter()
                .map(|c| format!("  \x02{:<16}\x02 {}", c.name, c.summary)),
        );
        lines.push("End of command list.".to_string());
        r.lines(lines)
    }

    fn version_reply(&self, r: &Replier) -> ServiceResult {
        vec![r.line(&format!("{} ({VERSION})", self.service_name()))]
    }

    fn help_reply(&self, r: &Replier, args: &[&str]) -> ServiceResult {
        let Some(topic) = args.first() else {
            return vec![r.line(&format!(
                "{} help: use \x02HELP <command>\x02 for details, or \x02SHOWCOMMANDS\x02 for a list.",
                self.service_name()
            ))];
        };
        match self
            .commands()
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(topic))
        {
            Some(c) => r.lines([format!("Syntax: {}", c.syntax), c.summary.to_string()]),
            None => vec![r.line(&format!("No help available for \x02{topic}\x02."))],
        }
    }

    /// Turn a command failure into a reply, logging store faults.
    fn error_reply(&self, r: &Replier, verb: &str, err: HandlerError) -> ServiceResult {
        if let HandlerError::Store(e) = &err {
            warn!(
                service = self.service_name(),
                command = %verb,
                user = %r.target(),
                error = %e,
                "Command failed on store access"
            );
        }
        crate::metrics::record_command_error(self.service_name(), err.error_code());
        vec![r.line(&err.reply_text())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;

    fn client() -> PseudoClient {
        let config = test_support::config();
        PseudoClient::from_block(&config, &config.services.auth.identity()).unwrap()
    }

    #[test]
    fn numeric_is_server_plus_suffix() {
        let c = client();
        assert_eq!(c.numeric, "SAAA");
        assert_eq!(c.host, "services.test.net");
        assert_eq!(c.state, ServiceState::Unregistered);
    }

    #[test]
    fn introduction_line() {
        let line = client().introduction("S", 1_700_000_000).to_string();
        assert_eq!(
            line,
            "S N AuthServ 1 1700000000 auth services.test.net +iok AAAAAA SAAA :Authentication Service"
        );
    }

    #[test]
    fn addressing() {
        let c = client();
        assert_eq!(c.addressed_by("SAAA", "services.test.net"), Some(Addressed::Direct));
        assert_eq!(
            c.addressed_by("authserv@Services.Test.Net", "services.test.net"),
            Some(Addressed::Relayed)
        );
        assert_eq!(c.addressed_by("AuthServ@elsewhere", "services.test.net"), None);
        assert_eq!(c.addressed_by("SAAB", "services.test.net"), None);
    }

    #[test]
    fn split_command_uppercases_verb() {
        let (verb, args) = split_command("hello a@b.com  a@b.com").unwrap();
        assert_eq!(verb, "HELLO");
        assert_eq!(args, ["a@b.com", "a@b.com"]);
        assert!(split_command("   ").is_none());
    }

    #[test]
    fn replier_picks_command() {
        let r = Replier::new("SAAA", "AAAAB", true);
        let ServiceEffect::Send(m) = r.line("hi") else {
            panic!("expected send");
        };
        assert!(m.is("O"));
        let r = Replier::new("SAAA", "AAAAB", false);
        let ServiceEffect::Send(m) = r.line("hi") else {
            panic!("expected send");
        };
        assert_eq!(m.to_string(), "SAAA P AAAAB :hi");
    }

    #[tokio::test]
    async fn notice_preference_follows_account_flag() {
        let db = Database::new(":memory:").await.unwrap();
        let mut state = test_support::state();
        assert!(!prefers_notice(&db, &state, "AAAAB").await);

        db.accounts().add_user("alice", "alice@example.org").await.unwrap();
        state.user_mut("AAAAB").unwrap().account = Some("alice".into());
        assert!(!prefers_notice(&db, &state, "AAAAB").await);

        db.accounts()
            .set_flags("alice", UserFlags::NOTICE.bits())
            .await
            .unwrap();
        assert!(prefers_notice(&db, &state, "AAAAB").await);
    }
}
