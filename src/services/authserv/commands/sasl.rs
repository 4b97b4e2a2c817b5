//! Relayed SASL PLAIN logins.
//!
//! A server forwards `SASL <tag> PLAIN <base64>` to AuthServ on behalf of a
//! client that has not finished registering. We answer with `D S` or `D F`,
//! preceded on success by an `L <account>` binding for that server.

use crate::db::DbError;
use crate::flags::UserFlags;
use crate::services::base::ServiceResult;
use crate::services::{LineContext, ServiceEffect};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use slirc_p10::builder;
use tracing::{debug, info, warn};

/// Decode SASL PLAIN credentials into `(authzid, authcid, password)`.
pub fn decode_plain(data: &str) -> Result<(String, String, String), &'static str> {
    let decoded = STANDARD.decode(data).map_err(|_| "Invalid base64")?;

    let parts: Vec<&[u8]> = decoded.split(|&b| b == 0).collect();
    if parts.len() != 3 {
        return Err("Invalid SASL PLAIN format");
    }

    let authzid = String::from_utf8(parts[0].to_vec()).map_err(|_| "Invalid UTF-8")?;
    let authcid = String::from_utf8(parts[1].to_vec()).map_err(|_| "Invalid UTF-8")?;
    let password = String::from_utf8(parts[2].to_vec()).map_err(|_| "Invalid UTF-8")?;

    if authcid.is_empty() {
        return Err("Empty authcid");
    }
    Ok((authzid, authcid, password))
}

/// Handle a relayed SASL request from `origin` (a server numeric).
pub async fn handle_sasl(ctx: &mut LineContext<'_>, origin: &str, text: &str) -> ServiceResult {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let ["SASL", tag, mechanism, data] = parts.as_slice() else {
        debug!(origin, "Ignoring non-SASL line from server");
        return Vec::new();
    };
    crate::metrics::record_command("AuthServ", "SASL");
    let server = ctx.server().to_string();
    let done = |ok: bool| {
        ServiceEffect::Send(builder::sasl(
            &server,
            origin,
            tag,
            "D",
            Some(if ok { "S" } else { "F" }),
        ))
    };

    if !mechanism.eq_ignore_ascii_case("PLAIN") {
        debug!(origin, mechanism, "Unsupported SASL mechanism");
        return vec![done(false)];
    }

    let (authzid, authcid, password) = match decode_plain(data) {
        Ok(creds) => creds,
        Err(reason) => {
            debug!(origin, tag, reason, "Malformed SASL PLAIN payload");
            return vec![done(false)];
        }
    };
    // Logging in as someone else is not supported.
    if !authzid.is_empty() && !authzid.eq_ignore_ascii_case(&authcid) {
        return vec![done(false)];
    }

    match ctx.db.accounts().verify(&authcid, &password).await {
        Ok(account) if !UserFlags::from_bits_truncate(account.flags).is_suspended() => {
            info!(origin, tag, account = %account.name, "SASL login succeeded");
            vec![
                ServiceEffect::Send(builder::sasl(
                    &server,
                    origin,
                    tag,
                    "L",
                    Some(account.name.as_str()),
                )),
                done(true),
            ]
        }
        Ok(_) | Err(DbError::InvalidPassword | DbError::AccountNotFound(_)) => {
            info!(origin, tag, account = %authcid, "SASL login failed");
            vec![done(false)]
        }
        Err(e) => {
            warn!(origin, tag, error = %e, "SASL login failed on store access");
            vec![done(false)]
        }
    }
}
