//! NEWPASS command handler for AuthServ.

use super::{AuthServResult, caller, require_account};
use crate::db::DbError;
use crate::error::HandlerError;
use crate::services::LineContext;
use crate::services::base::Replier;
use tracing::info;

const SYNTAX: &str = "NEWPASS <old password> <new password> <new password>";

/// Shortest password NEWPASS accepts.
const MIN_PASSWORD_LEN: usize = 6;

/// Handle NEWPASS command.
pub async fn handle_newpass(
    ctx: &mut LineContext<'_>,
    sender: &str,
    args: &[&str],
    r: &Replier,
) -> AuthServResult {
    let Some(user) = caller(ctx.state, sender) else {
        return Ok(Vec::new());
    };
    let account = require_account(&user)?;
    let [old, new, confirm] = args else {
        return Err(HandlerError::Syntax(SYNTAX));
    };

    let accounts = ctx.db.accounts();
    match accounts.verify(&account, old).await {
        Ok(_) => {}
        Err(DbError::InvalidPassword | DbError::AccountNotFound(_)) => {
            return Ok(vec![r.line("Password incorrect.")]);
        }
        Err(e) => return Err(e.into()),
    }
    if new != confirm {
        return Ok(vec![r.line("New passwords do not match.")]);
    }
    if new.len() < MIN_PASSWORD_LEN {
        return Ok(vec![r.line(&format!(
            "Passwords must be at least {MIN_PASSWORD_LEN} characters long."
        ))]);
    }

    accounts.set_password(&account, new).await?;
    info!(account = %account, "Password changed");
    Ok(vec![r.line("Your password has been changed.")])
}
