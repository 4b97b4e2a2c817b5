//! AuthServ - Account registration and authentication service.
//!
//! Handles:
//! - HELLO <email> <email> - Register the current nick as an account
//! - AUTH <account> <password> - Log in
//! - EMAIL <email> <email> - Change the account e-mail address
//! - NEWPASS <old> <new> <new> - Change password
//! - REQUESTPASSWORD <email> - Mail a fresh password
//! - USERFLAGS [[<nick>] <+/-flags>] - Show or edit account flags
//! - SASL <tag> PLAIN <base64> - Relayed SASL login, from servers only

mod commands;

use crate::config::Config;
use crate::services::base::{
    Addressed, CommandHelp, PseudoClient, Replier, ServiceBase, ServiceResult, prefers_notice,
    split_command,
};
use crate::services::{LineContext, ServiceEffect, ServiceProcessor};
use async_trait::async_trait;
use slirc_p10::{Message, NumericError, numeric};
use tracing::debug;

use commands::{auth, email, hello, newpass, requestpassword, sasl, userflags};

const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "HELLO",
        syntax: "HELLO <email> <email>",
        summary: "Registers your current nick as an account.",
    },
    CommandHelp {
        name: "AUTH",
        syntax: "AUTH <account> <password>",
        summary: "Authenticates you to an account.",
    },
    CommandHelp {
        name: "EMAIL",
        syntax: "EMAIL <email> <email>",
        summary: "Changes your account e-mail to an address already on file.",
    },
    CommandHelp {
        name: "NEWPASS",
        syntax: "NEWPASS <old password> <new password> <new password>",
        summary: "Changes your account password.",
    },
    CommandHelp {
        name: "REQUESTPASSWORD",
        syntax: "REQUESTPASSWORD <email>",
        summary: "Sends a new password to the address on file.",
    },
    CommandHelp {
        name: "USERFLAGS",
        syntax: "USERFLAGS [[<nick>] <+/-flags>]",
        summary: "Shows or changes account flags.",
    },
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

/// AuthServ service.
pub struct AuthServ {
    client: PseudoClient,
}

impl AuthServ {
    pub fn new(config: &Config) -> Result<Self, NumericError> {
        Ok(Self {
            client: PseudoClient::from_block(config, &config.services.auth.identity())?,
        })
    }

    /// Handle a command from a user.
    async fn handle_command(
        &self,
        ctx: &mut LineContext<'_>,
        sender: &str,
        addressed: Addressed,
        text: &str,
    ) -> ServiceResult {
        let Some((verb, args)) = split_command(text) else {
            return Vec::new();
        };
        let notice = prefers_notice(ctx.db, ctx.state, sender).await;
        let r = Replier::new(&self.client.numeric, sender, notice);
        self.count_command(&verb);
        debug!(service = "AuthServ", user = %sender, command = %verb, "Service command");

        let result = match verb.as_str() {
            "HELLO" => hello::handle_hello(ctx, sender, &args, &r).await,
            "AUTH" => auth::handle_auth(ctx, sender, addressed, &args, &r).await,
            "EMAIL" => email::handle_email(ctx, sender, &args, &r).await,
            "NEWPASS" => newpass::handle_newpass(ctx, sender, &args, &r).await,
            "REQUESTPASSWORD" => {
                requestpassword::handle_requestpassword(ctx, sender, &args, &r).await
            }
            "USERFLAGS" => userflags::handle_userflags(ctx, sender, &args, &r).await,
            "SHOWCOMMANDS" => Ok(self.showcommands_reply(&r)),
            "VERSION" => Ok(self.version_reply(&r)),
            "HELP" => Ok(self.help_reply(&r, &args)),
            _ => Ok(self.unknown_command(&r, &verb)),
        };
        result.unwrap_or_else(|e| self.error_reply(&r, &verb, e))
    }
}

impl ServiceBase for AuthServ {
    fn service_name(&self) -> &'static str {
        "AuthServ"
    }

    fn commands(&self) -> &'static [CommandHelp] {
        COMMANDS
    }
}

#[async_trait]
impl ServiceProcessor for AuthServ {
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
        let Some(addressed) = self.client.addressed_by(target, &ctx.config.server.name) else {
            return Vec::new();
        };
        let sender = msg.source_str();

        // Servers only ever talk to us to relay SASL.
        if numeric::is_server_source(sender) {
            return sasl::handle_sasl(ctx, sender, text).await;
        }
        self.handle_command(ctx, sender, addressed, text).await
    }
}

#[cfg(test)]
mod tests;
