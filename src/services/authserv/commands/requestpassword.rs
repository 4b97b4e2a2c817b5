//! REQUESTPASSWORD command handler for AuthServ.

use super::{AuthServResult, caller, is_valid_email};
use crate::error::HandlerError;
use crate::services::LineContext;
use crate::services::base::Replier;
use tracing::info;

const SYNTAX: &str = "REQUESTPASSWORD <email>";

/// Handle REQUESTPASSWORD command.
///
/// The reply is the same whether or not the address is known.
pub async fn handle_requestpassword(
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
    let [email] = args else {
        return Err(HandlerError::Syntax(SYNTAX));
    };
    if !is_valid_email(email) {
        return Err(HandlerError::InvalidEmail);
    }

    let reset = ctx.db.accounts().submit_new_password(email).await?;
    info!(nick = %user.nick, accounts = reset, "Password reset requested");
    Ok(vec![r.line(&format!(
        "If \x02{email}\x02 is on file, a new password has been sent to it."
    ))])
}
