//! HELLO command handler for AuthServ.

use super::{AuthServResult, caller, check_email_pair};
use crate::db::{DbError, OrLogDefault};
use crate::error::HandlerError;
use crate::services::LineContext;
use crate::services::base::Replier;
use tracing::info;

const SYNTAX: &str = "HELLO <email> <email>";

/// Handle HELLO command: register the caller's current nick.
pub async fn handle_hello(
    ctx: &mut LineContext<'_>,
    sender: &str,
    args: &[&str],
    r: &Replier,
) -> AuthServResult {
    let Some(user) = caller(ctx.state, sender) else {
        return Ok(Vec::new());
    };
    if let Some(account) = user.account {
        return Err(HandlerError::AlreadyAuthenticated(account));
    }
    let [email, confirm] = args else {
        return Err(HandlerError::Syntax(SYNTAX));
    };

    let accounts = ctx.db.accounts();
    if accounts
        .is_registered(&user.nick)
        .await
        .or_log_default("is_registered")
    {
        return Ok(vec![r.line(&format!(
            "The nickname \x02{}\x02 is already registered.",
            user.nick
        ))]);
    }

    check_email_pair(email, confirm)?;

    let limit = ctx.config.services.auth.max_accounts_per_email;
    let in_use = accounts
        .accounts_with_email(email)
        .await
        .or_log_default("accounts_with_email");
    if in_use >= limit as i64 {
        return Ok(vec![r.line(
            "That e-mail address is already in use by too many accounts.",
        )]);
    }

    let account = match accounts.add_user(&user.nick, email).await {
        Ok((account, _password)) => account,
        Err(DbError::AccountExists(_)) => {
            return Ok(vec![r.line(&format!(
                "The nickname \x02{}\x02 is already registered.",
                user.nick
            ))]);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(u) = ctx.state.user_mut(sender) {
        u.newly_registered = true;
    }
    info!(nick = %user.nick, account = %account.name, "Account registered");

    Ok(r.lines([
        format!(
            "Account \x02{}\x02 has been registered. Your password has been sent to \x02{}\x02.",
            account.name, account.email
        ),
        format!(
            "Once it arrives, log in with \x02/msg {} AUTH {} <password>\x02.",
            ctx.config.services.auth.nick, account.name
        ),
    ]))
}
