//! HostServ - Hostname cloaking service.
//!
//! Handles:
//! - SHOWCOMMANDS / VERSION / HELP
//!
//! Cloaks are applied on behalf of AuthServ after a successful AUTH,
//! through [`ServiceEffect::ApplyCloak`].

use crate::config::Config;
use crate::security::cloak_host;
use crate::services::base::{
    CommandHelp, PseudoClient, Replier, ServiceBase, prefers_notice, split_command,
};
use crate::services::{LineContext, ServiceEffect, ServiceProcessor};
use crate::state::NetworkState;
use async_trait::async_trait;
use slirc_p10::{Message, NumericError, builder};
use tracing::debug;

const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "SHOWCOMMANDS",
        syntax: "SHOWCOMMANDS",
        summary: "Lists the commands this service answers.",
    },
    CommandHelp {
        name: "VERSION",
        syntax: "VERSION",
        summary: "Shows the services version.",
    },
    CommandHelp {
        name: "HELP",
        syntax: "HELP [command]",
        summary: "Shows help for a command.",
    },
];

/// HostServ service.
pub struct HostServ {
    client: PseudoClient,
}

impl HostServ {
    pub fn new(config: &Config) -> Result<Self, NumericError> {
        Ok(Self {
            client: PseudoClient::from_block(config, &config.services.host.identity())?,
        })
    }
}

/// Derive a cloak for `target`, record it, and build the `FA` announcing it.
///
/// Returns `None` when HostServ is disabled or the user is gone.
pub fn apply_cloak(state: &mut NetworkState, config: &Config, target: &str) -> Option<Message> {
    let host_config = &config.services.host;
    if !host_config.enabled {
        return None;
    }
    let user = state.user_mut(target)?;
    let cloak = cloak_host(&user.host, &host_config.cloak_secret, &host_config.cloak_suffix);
    debug!(numeric = %target, cloak = %cloak, "Applying cloak");
    user.cloaked_host = Some(cloak.clone());
    Some(builder::fakehost(&config.server.numeric, target, &cloak))
}

impl ServiceBase for HostServ {
    fn service_name(&self) -> &'static str {
        "HostServ"
    }

    fn commands(&self) -> &'static [CommandHelp] {
        COMMANDS
    }
}

#[async_trait]
impl ServiceProcessor for HostServ {
    fn client(&self) -> &PseudoClient {
        &self.client
    }

    fn client_mut(&mut self) -> &mut PseudoClient {
        &mut self.client
    }

    async fn home_channels(&mut self, ctx: &mut LineContext<'_>) -> (Vec<String>, bool) {
        (vec![ctx.config.services.operations_channel.clone()], false)
    }

    async fn handle(&mut self, ctx: &mut LineContext<'_>, msg: &Message) -> Vec<ServiceEffect> {
        if !msg.is("P") || msg.params.len() < 2 {
            return Vec::new();
        }
        let (Some(target), Some(text)) = (msg.arg(0), msg.last_arg()) else {
            return Vec::new();
        };
        if self
            .client
            .addressed_by(target, &ctx.config.server.name)
            .is_none()
        {
            return Vec::new();
        }
        let sender = msg.source_str();
        let Some((verb, args)) = split_command(text) else {
            return Vec::new();
        };

        let notice = prefers_notice(ctx.db, ctx.state, sender).await;
        let r = Replier::new(&self.client.numeric, sender, notice);
        self.count_command(&verb);
        debug!(service = "HostServ", user = %sender, command = %verb, "Service command");

        match verb.as_str() {
            "SHOWCOMMANDS" => self.showcommands_reply(&r),
            "VERSION" => self.version_reply(&r),
            "HELP" => self.help_reply(&r, &args),
            _ => self.unknown_command(&r, &verb),
        }
    }
}
