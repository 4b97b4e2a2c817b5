//! USERFLAGS command handler for AuthServ.
//!
//! - `USERFLAGS` shows the caller's flags.
//! - `USERFLAGS <+/-flags>` edits them; unprivileged accounts may only
//!   touch the self-service flags, anything else is silently dropped.
//! - `USERFLAGS <nick>` and `USERFLAGS <nick> <+/-flags>` act on another
//!   authenticated user and need oper, admin or dev.

use super::{AuthServResult, caller, require_account};
use crate::db::OrLogDefault;
use crate::error::HandlerError;
use crate::flags::{FlagChange, UserFlags};
use crate::services::LineContext;
use crate::services::base::Replier;
use tracing::info;

const SYNTAX: &str = "USERFLAGS [[<nick>] <+/-flags>]";

/// Handle USERFLAGS command.
pub async fn handle_userflags(
    ctx: &mut LineContext<'_>,
    sender: &str,
    args: &[&str],
    r: &Replier,
) -> AuthServResult {
    let Some(user) = caller(ctx.state, sender) else {
        return Ok(Vec::new());
    };
    let account = require_account(&user)?;
    let accounts = ctx.db.accounts();
    let own = UserFlags::from_bits_truncate(accounts.flags(&account).await.or_log_default("flags"));

    let (target, spec) = match args {
        [] => return Ok(vec![show(r, &account, own)]),
        [spec] if spec.starts_with(['+', '-']) => (None, *spec),
        [nick] => (Some(*nick), ""),
        [nick, spec] => (Some(*nick), *spec),
        _ => return Err(HandlerError::Syntax(SYNTAX)),
    };

    let Some(nick) = target else {
        let change = FlagChange::parse(spec).ok_or(HandlerError::Syntax(SYNTAX))?;
        let change = if own.is_privileged() {
            change
        } else {
            change.restrict_to(UserFlags::SELF_SERVICE)
        };
        return apply_change(ctx, r, &account, own, &change).await;
    };

    if !own.is_privileged() {
        return Err(HandlerError::PermissionDenied);
    }
    let Some(target_account) = ctx
        .state
        .find_by_nick(nick)
        .and_then(|u| u.account.clone())
    else {
        return Ok(vec![r.line(&format!("\x02{nick}\x02 is not authenticated."))]);
    };
    let current = UserFlags::from_bits_truncate(
        accounts
            .flags(&target_account)
            .await
            .or_log_default("flags"),
    );
    if spec.is_empty() {
        return Ok(vec![show(r, &target_account, current)]);
    }
    let change = FlagChange::parse(spec).ok_or(HandlerError::Syntax(SYNTAX))?;
    apply_change(ctx, r, &target_account, current, &change).await
}

fn show(r: &Replier, account: &str, flags: UserFlags) -> crate::services::ServiceEffect {
    r.line(&format!("Flags for \x02{account}\x02: {}", flags.render()))
}

async fn apply_change(
    ctx: &mut LineContext<'_>,
    r: &Replier,
    account: &str,
    current: UserFlags,
    change: &FlagChange,
) -> AuthServResult {
    let updated = change.apply(current);
    if updated != current {
        ctx.db.accounts().set_flags(account, updated.bits()).await?;
        info!(
            account = %account,
            by = %r.target(),
            flags = %updated.render(),
            "Account flags changed"
        );
    }
    let mut replies = Vec::with_capacity(2);
    if !change.unknown.is_empty() {
        let unknown: String = change.unknown.iter().collect();
        replies.push(r.line(&format!("Unknown flags ignored: {unknown}")));
    }
    replies.push(show(r, account, updated));
    Ok(replies)
}
