//! BADWORD command handler for SpamServ.

use super::super::SpamServ;
use super::{SpamServResult, is_operator};
use crate::error::HandlerError;
use crate::services::LineContext;
use crate::services::base::Replier;
use crate::state::RemoteUser;
use tracing::info;

const SYNTAX: &str = "BADWORD ADD|DELETE|LIST [word]";

impl SpamServ {
    /// Handle BADWORD: operators manage the banned-word list.
    pub(super) async fn handle_badword(
        &mut self,
        ctx: &mut LineContext<'_>,
        user: &RemoteUser,
        args: &[&str],
        r: &Replier,
    ) -> SpamServResult {
        if !is_operator(ctx, user).await {
            return Err(HandlerError::PermissionDenied);
        }
        let Some(sub) = args.first() else {
            return Err(HandlerError::Syntax(SYNTAX));
        };

        match (sub.to_ascii_uppercase().as_str(), &args[1..]) {
            ("LIST", []) => {
                let words: Vec<&str> = self.engine.words().iter().collect();
                if words.is_empty() {
                    return Ok(vec![r.line("No banned words.")]);
                }
                Ok(vec![r.line(&format!("Banned words: {}", words.join(", ")))])
            }
            ("ADD", [word]) => {
                let word = word.to_lowercase();
                let by = user.account.as_deref().unwrap_or(&user.nick);
                let stored = ctx.db.badwords().add(&word, by).await?;
                let added = self.engine.words_mut().add(&word);
                self.stored_words.insert(word.clone());
                if !stored && !added {
                    return Ok(vec![r.line(&format!("\x02{word}\x02 is already banned."))]);
                }
                info!(word = %word, by = %by, "Banned word added");
                Ok(vec![r.line(&format!("\x02{word}\x02 is now banned."))])
            }
            ("DELETE" | "DEL", [word]) => {
                let word = word.to_lowercase();
                if self.is_config_word(&word) {
                    return Ok(vec![r.line(&format!(
                        "\x02{word}\x02 is set in the configuration and cannot be removed here."
                    ))]);
                }
                let stored = ctx.db.badwords().remove(&word).await?;
                self.stored_words.remove(&word);
                let removed = self.engine.words_mut().remove(&word);
                if !stored && !removed {
                    return Ok(vec![r.line(&format!("\x02{word}\x02 is not banned."))]);
                }
                info!(word = %word, by = %user.nick, "Banned word removed");
                Ok(vec![r.line(&format!("\x02{word}\x02 is no longer banned."))])
            }
            _ => Err(HandlerError::Syntax(SYNTAX)),
        }
    }
}
