//! AUTH command handler for AuthServ.

use super::{AuthServResult, caller};
use crate::db::{DbError, OrLogDefault};
use crate::error::HandlerError;
use crate::flags::UserFlags;
use crate::services::base::{Addressed, Replier};
use crate::services::{LineContext, ServiceEffect};
use tracing::{info, warn};

const SYNTAX: &str = "AUTH <account> <password>";

/// Reply for unknown accounts and wrong passwords alike.
pub const BAD_CREDENTIALS: &str = "Username or password incorrect.";

/// Handle AUTH command.
pub async fn handle_auth(
    ctx: &mut LineContext<'_>,
    sender: &str,
    addressed: Addressed,
    args: &[&str],
    r: &Replier,
) -> AuthServResult {
    if addressed == Addressed::Relayed {
        return Ok(vec![r.line(&format!(
            "For security, send AUTH directly: \x02/msg {} AUTH <account> <password>\x02.",
            ctx.config.services.auth.nick
        ))]);
    }
    let Some(user) = caller(ctx.state, sender) else {
        return Ok(Vec::new());
    };
    if let Some(account) = user.account {
        return Err(HandlerError::AlreadyAuthenticated(account));
    }
    let [name, password] = args else {
        return Err(HandlerError::Syntax(SYNTAX));
    };

    let accounts = ctx.db.accounts();
    let account = match accounts.verify(name, password).await {
        Ok(account) => account,
        Err(DbError::InvalidPassword | DbError::AccountNotFound(_)) => {
            info!(nick = %user.nick, account = %name, "Failed AUTH");
            return Ok(vec![r.line(BAD_CREDENTIALS)]);
        }
        Err(e) => return Err(e.into()),
    };

    if UserFlags::from_bits_truncate(account.flags).is_suspended() {
        return Ok(vec![r.line(&format!(
            "Account \x02{}\x02 is suspended.",
            account.name
        ))]);
    }

    if let Err(e) = accounts.record_auth(&account.name, &user.host).await {
        warn!(account = %account.name, error = %e, "Failed to record login");
    }
    info!(nick = %user.nick, account = %account.name, "User authenticated");

    let mut effects = vec![ServiceEffect::AccountBind {
        target: sender.to_string(),
        account: account.name.clone(),
    }];
    if ctx.config.services.host.enabled {
        effects.push(ServiceEffect::ApplyCloak {
            target: sender.to_string(),
        });
    }
    effects.push(r.line(&format!(
        "You are now authenticated as \x02{}\x02.",
        account.name
    )));

    // Remind freshly registered users their password arrived by mail.
    if user.newly_registered
        && accounts
            .find(&account.name)
            .await
            .or_log_default("find")
            .is_some_and(|a| a.last_pwchange.is_none())
    {
        effects.push(r.line("Please change your password with \x02NEWPASS\x02."));
    }
    Ok(effects)
}
