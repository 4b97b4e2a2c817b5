//! AuthServ command handlers.

pub mod auth;
pub mod email;
pub mod hello;
pub mod newpass;
pub mod requestpassword;
pub mod sasl;
pub mod userflags;

use crate::error::{HandlerError, HandlerResult};
use crate::services::base::ServiceResult;
use crate::state::{NetworkState, RemoteUser};
use regex::Regex;
use std::sync::OnceLock;

/// Result of an AuthServ command.
pub type AuthServResult = HandlerResult<ServiceResult>;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$";

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

/// Syntax check for an e-mail address.
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && email_regex().is_some_and(|re| re.is_match(email))
}

/// Validate an address and its confirmation.
pub(super) fn check_email_pair(email: &str, confirm: &str) -> HandlerResult<()> {
    if !is_valid_email(email) {
        return Err(HandlerError::InvalidEmail);
    }
    if !email.eq_ignore_ascii_case(confirm) {
        return Err(HandlerError::EmailMismatch);
    }
    Ok(())
}

/// Snapshot of the invoking user, so the state borrow ends before any await.
pub(super) fn caller(state: &NetworkState, numeric: &str) -> Option<RemoteUser> {
    state.user(numeric).cloned()
}

/// Account of an authenticated caller.
pub(super) fn require_account(user: &RemoteUser) -> HandlerResult<String> {
    user.account.clone().ok_or(HandlerError::NotAuthenticated)
}
