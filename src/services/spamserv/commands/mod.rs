//! SpamServ command handlers.

mod auth;
mod badword;
mod chan;

use super::SpamServ;
use crate::db::OrLogDefault;
use crate::error::HandlerResult;
use crate::flags::UserFlags;
use crate::services::LineContext;
use crate::services::base::{Replier, ServiceBase, ServiceResult, prefers_notice, split_command};
use crate::state::RemoteUser;
use tracing::debug;

/// Result of a SpamServ command.
pub type SpamServResult = HandlerResult<ServiceResult>;

/// Network operator (`+o`) or an account with oper, admin or dev.
async fn is_operator(ctx: &LineContext<'_>, user: &RemoteUser) -> bool {
    if user.oper {
        return true;
    }
    let Some(account) = user.account.as_deref() else {
        return false;
    };
    UserFlags::from_bits_truncate(ctx.db.accounts().flags(account).await.or_log_default("flags"))
        .is_privileged()
}

impl SpamServ {
    /// Handle a command addressed to SpamServ.
    pub(super) async fn handle_command(
        &mut self,
        ctx: &mut LineContext<'_>,
        sender: &str,
        text: &str,
    ) -> ServiceResult {
        let Some((verb, args)) = split_command(text) else {
            return Vec::new();
        };
        let Some(user) = ctx.state.user(sender).cloned() else {
            return Vec::new();
        };
        let notice = prefers_notice(ctx.db, ctx.state, sender).await;
        let r = Replier::new(&self.client.numeric, sender, notice);
        self.count_command(&verb);
        debug!(service = "SpamServ", user = %sender, command = %verb, "Service command");

        let result = match verb.as_str() {
            "AUTH" => Ok(self.handle_auth(&user, &args, &r)),
            "ADDCHAN" => self.handle_addchan(ctx, &user, &args, &r).await,
            "DELCHAN" => self.handle_delchan(ctx, &user, &args, &r).await,
            "BADWORD" => self.handle_badword(ctx, &user, &args, &r).await,
            "SHOWCOMMANDS" => Ok(self.showcommands_reply(&r)),
            "VERSION" => Ok(self.version_reply(&r)),
            "HELP" => Ok(self.help_reply(&r, &args)),
            _ => Ok(self.unknown_command(&r, &verb)),
        };
        result.unwrap_or_else(|e| self.error_reply(&r, &verb, e))
    }
}
