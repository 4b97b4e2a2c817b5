//! EMAIL command handler for AuthServ.

use super::{AuthServResult, caller, check_email_pair, require_account};
use crate::db::OrLogDefault;
use crate::error::HandlerError;
use crate::services::LineContext;
use crate::services::base::Replier;
use tracing::info;

const SYNTAX: &str = "EMAIL <email> <email>";

/// Handle EMAIL command: switch to an address already on file.
pub async fn handle_email(
    ctx: &mut LineContext<'_>,
    sender: &str,
    args: &[&str],
    r: &Replier,
) -> AuthServResult {
    let Some(user) = caller(ctx.state, sender) else {
        return Ok(Vec::new());
    };
    let account = require_account(&user)?;
    let [email, confirm] = args else {
        return Err(HandlerError::Syntax(SYNTAX));
    };
    check_email_pair(email, confirm)?;

    let accounts = ctx.db.accounts();
    if !accounts
        .has_email_on_file(&account, email)
        .await
        .or_log_default("has_email_on_file")
    {
        return Ok(vec![r.line(
            "That address is not on file for your account. Contact staff to add a new one.",
        )]);
    }

    accounts.set_email(&account, email).await?;
    info!(account = %account, "E-mail address changed");
    Ok(vec![r.line(&format!(
        "Your e-mail address is now \x02{email}\x02."
    ))])
}
