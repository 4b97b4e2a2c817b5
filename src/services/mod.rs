//! Pseudo-client services (AuthServ, HostServ, SpamServ).
//!
//! Each service is a [`ServiceProcessor`] owned by the link. Processors
//! look at every inbound line and return [`ServiceEffect`]s; the link
//! applies them centrally with [`apply_effects`], which keeps local state
//! in step with what we tell the hub.

pub mod authserv;
pub mod base;
pub mod hostserv;
pub mod spamserv;
pub mod traits;

pub use authserv::AuthServ;
pub use base::{PseudoClient, ServiceState};
pub use hostserv::HostServ;
pub use spamserv::SpamServ;
pub use traits::ServiceProcessor;

use crate::config::Config;
use crate::db::Database;
use crate::security::HomoglyphSet;
use crate::state::NetworkState;
use slirc_p10::{Message, NumericError, builder};
use std::sync::Arc;
use tracing::{debug, trace};

/// Long-lived dependencies shared by every link, built once at startup.
#[derive(Clone)]
pub struct ServicesContext {
    pub config: Arc<Config>,
    pub db: Database,
    pub homoglyphs: Arc<HomoglyphSet>,
}

/// Borrowed view handed to a processor for one inbound line.
pub struct LineContext<'a> {
    pub config: &'a Config,
    pub db: &'a Database,
    pub state: &'a mut NetworkState,
    pub now: i64,
}

impl LineContext<'_> {
    /// Our own server numeric.
    pub fn server(&self) -> &str {
        &self.config.server.numeric
    }
}

/// Unified effect type returned by all service processors.
///
/// Processors produce effects; the link applies them to the network state
/// and turns them into outbound lines.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEffect {
    /// Send a line as-is.
    Send(Message),

    /// Bind an account to a user and announce it with `AC`.
    AccountBind { target: String, account: String },

    /// Ask HostServ to derive and announce a cloak for a user.
    ApplyCloak { target: String },

    /// Join a pseudo-client to a channel, optionally opping it.
    Join {
        numeric: String,
        channel: String,
        op: bool,
    },

    /// Part a pseudo-client from a channel.
    Part { numeric: String, channel: String },

    /// Channel mode change sent by one of our clients.
    ChannelMode {
        source: String,
        channel: String,
        modes: String,
        args: Vec<String>,
    },

    /// Kick a user from a channel.
    Kick {
        source: String,
        channel: String,
        target: String,
        reason: String,
    },
}

/// Build the processors for every enabled service, in dispatch order.
pub fn build_processors(
    ctx: &ServicesContext,
) -> Result<Vec<Box<dyn ServiceProcessor>>, NumericError> {
    let config = &ctx.config;
    let mut processors: Vec<Box<dyn ServiceProcessor>> = Vec::with_capacity(3);
    if config.services.auth.enabled {
        processors.push(Box::new(AuthServ::new(config)?));
    }
    if config.services.host.enabled {
        processors.push(Box::new(HostServ::new(config)?));
    }
    if config.services.spam.enabled {
        processors.push(Box::new(SpamServ::new(config, ctx.homoglyphs.clone())?));
    }
    Ok(processors)
}

/// Apply a list of service effects in order, returning the lines to send.
pub fn apply_effects(
    state: &mut NetworkState,
    config: &Config,
    effects: Vec<ServiceEffect>,
    now: i64,
) -> Vec<Message> {
    let server = config.server.numeric.as_str();
    let mut out = Vec::with_capacity(effects.len());

    for effect in effects {
        trace!(?effect, "Applying service effect");
        match effect {
            ServiceEffect::Send(msg) => out.push(msg),

            ServiceEffect::AccountBind { target, account } => {
                match state.user_mut(&target) {
                    Some(user) => user.account = Some(account.clone()),
                    None => {
                        debug!(target = %target, "Account bind for departed user dropped");
                        continue;
                    }
                }
                out.push(builder::account(server, &target, &account));
            }

            ServiceEffect::ApplyCloak { target } => {
                if let Some(line) = hostserv::apply_cloak(state, config, &target) {
                    out.push(line);
                }
            }

            ServiceEffect::Join {
                numeric,
                channel,
                op,
            } => {
                // An empty or unknown channel is created, which makes us its op anyway.
                let exists = state
                    .channel(&channel)
                    .is_some_and(|chan| !chan.members.is_empty());
                if exists {
                    out.push(builder::join(&numeric, &channel, now));
                    if op {
                        out.push(builder::mode(server, &channel, "+o", &[&numeric]));
                    }
                } else {
                    out.push(builder::create(&numeric, &channel, now));
                }
                let roles = if op || !exists { "o" } else { "" };
                state.join_channel(&numeric, &channel, roles, now);
            }

            ServiceEffect::Part { numeric, channel } => {
                state.leave_channel(&numeric, &channel);
                out.push(builder::part(&numeric, &channel));
            }

            ServiceEffect::ChannelMode {
                source,
                channel,
                modes,
                args,
            } => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                state.apply_mode_change(&channel, &modes, &args);
                out.push(builder::mode(&source, &channel, &modes, &args));
            }

            ServiceEffect::Kick {
                source,
                channel,
                target,
                reason,
            } => {
                state.leave_channel(&target, &channel);
                out.push(builder::kick(&source, &channel, &target, &reason));
            }
        }
    }

    out
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub const CONFIG: &str = r##"
[server]
name = "services.test.net"
numeric = "S"
description = "Test services"

[hub]
host = "127.0.0.1"
password = "linkpass"

[services]
operations_channel = "#opers"

[services.host]
cloak_secret = "a-long-test-cloak-secret"

[services.spam]
secret = "spamsecret"

[abuse]
banned_words = ["spam"]
"##;

    pub fn config() -> Config {
        Config::parse(CONFIG).unwrap()
    }

    /// A state with our three clients and a couple of users.
    pub fn state() -> NetworkState {
        let mut state = NetworkState::new();
        state.add_server("S]]", "services.test.net");
        state.add_server("A]]", "hub.test.net");
        for (numeric, nick) in [("SAAA", "AuthServ"), ("SAAB", "HostServ"), ("SAAC", "SpamServ")] {
            let user = state.introduce_user(numeric, nick, None, "services.test.net");
            user.apply_modes("+iok");
        }
        state.introduce_user("AAAAB", "alice", None, "alice.example.org");
        state.introduce_user("AAAAC", "bob", None, "10.1.2.3");
        state
    }

    pub fn privmsg(from: &str, to: &str, text: &str) -> Message {
        builder::privmsg(from, to, text)
    }

    /// Reply texts addressed to `to`, whether sent as notice or privmsg.
    pub fn replies_to(effects: &[ServiceEffect], to: &str) -> Vec<String> {
        effects
            .iter()
            .filter_map(|e| match e {
                ServiceEffect::Send(m) if (m.is("P") || m.is("O")) && m.arg(0) == Some(to) => {
                    m.last_arg().map(str::to_string)
                }
                _ => None,
            })
            .collect()
    }
}
