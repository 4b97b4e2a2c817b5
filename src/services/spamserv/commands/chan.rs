//! ADDCHAN / DELCHAN command handlers for SpamServ.

use super::super::SpamServ;
use super::{SpamServResult, is_operator};
use crate::error::HandlerError;
use crate::services::base::Replier;
use crate::services::{LineContext, ServiceEffect};
use crate::state::RemoteUser;
use slirc_p10::irc_to_lower;
use tracing::info;

impl SpamServ {
    async fn may_manage_channels(&self, ctx: &LineContext<'_>, user: &RemoteUser) -> bool {
        self.elevated.contains(&user.numeric) || is_operator(ctx, user).await
    }

    /// Handle ADDCHAN: register, remember and join a channel.
    pub(super) async fn handle_addchan(
        &mut self,
        ctx: &mut LineContext<'_>,
        user: &RemoteUser,
        args: &[&str],
        r: &Replier,
    ) -> SpamServResult {
        if !self.may_manage_channels(ctx, user).await {
            return Err(HandlerError::PermissionDenied);
        }
        let [channel] = args else {
            return Err(HandlerError::Syntax("ADDCHAN <#channel>"));
        };
        if !channel.starts_with('#') {
            return Err(HandlerError::Syntax("ADDCHAN <#channel>"));
        }

        let added_by = user.account.as_deref().unwrap_or(&user.nick);
        if !ctx.db.channels().add(channel, added_by).await? {
            return Ok(vec![r.line(&format!(
                "\x02{channel}\x02 is already protected."
            ))]);
        }
        self.channels.insert(irc_to_lower(channel));
        info!(channel = %channel, by = %added_by, "Channel added to SpamServ");

        Ok(vec![
            ServiceEffect::Join {
                numeric: self.client.numeric.clone(),
                channel: channel.to_string(),
                op: true,
            },
            r.line(&format!("Now protecting \x02{channel}\x02.")),
        ])
    }

    /// Handle DELCHAN: forget and part a channel.
    pub(super) async fn handle_delchan(
        &mut self,
        ctx: &mut LineContext<'_>,
        user: &RemoteUser,
        args: &[&str],
        r: &Replier,
    ) -> SpamServResult {
        if !self.may_manage_channels(ctx, user).await {
            return Err(HandlerError::PermissionDenied);
        }
        let [channel] = args else {
            return Err(HandlerError::Syntax("DELCHAN <#channel>"));
        };
        if !channel.starts_with('#') {
            return Err(HandlerError::Syntax("DELCHAN <#channel>"));
        }

        if !ctx.db.channels().remove(channel).await? {
            return Ok(vec![r.line(&format!(
                "\x02{channel}\x02 is not protected."
            ))]);
        }
        self.channels.remove(&irc_to_lower(channel));
        info!(channel = %channel, by = %user.nick, "Channel removed from SpamServ");

        Ok(vec![
            ServiceEffect::Part {
                numeric: self.client.numeric.clone(),
                channel: channel.to_string(),
            },
            r.line(&format!("No longer protecting \x02{channel}\x02.")),
        ])
    }
}
