//! SpamServ - Channel abuse protection service.
//!
//! Handles:
//! - AUTH <secret> - Elevate this session
//! - ADDCHAN <#channel> / DELCHAN <#channel> - Manage scanned channels
//! - BADWORD ADD|DELETE|LIST [word] - Manage the banned-word list
//!
//! Every line said in a scanned channel is scored by the
//! [`AbuseEngine`]; violators are devoiced or banned and kicked.

mod commands;

use crate::config::Config;
use crate::db::OrLogDefault;
use crate::security::{AbuseEngine, AbuseSettings, BannedWords, HomoglyphSet, Remedy, Verdict};
use crate::services::base::{CommandHelp, PseudoClient, ServiceBase, ServiceResult};
use crate::services::{LineContext, ServiceEffect, ServiceProcessor};
use async_trait::async_trait;
use slirc_p10::{Message, NumericError, irc_to_lower};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "AUTH",
        syntax: "AUTH <secret>",
        summary: "Elevates your session with the service secret.",
    },
    CommandHelp {
        name: "ADDCHAN",
        syntax: "ADDCHAN <#channel>",
        summary: "Starts protecting a channel.",
    },
    CommandHelp {
        name: "DELCHAN",
        syntax: "DELCHAN <#channel>",
        summary: "Stops protecting a channel.",
    },
    CommandHelp {
        name: "BADWORD",
        syntax: "BADWORD ADD|DELETE|LIST [word]",
        summary: "Manages the banned-word list.",
    },
    CommandHelp {
        name: "SHOWCOMMANDS",
        syntax: "SHOWCOMMANDS",
        summary: "Lists the commands this service answers.",
    },
    CommandHelp {
        name: "VERSION",
        syntax: "VERSION",
        summary: "Shows the services version.",
    },
    CommandHelp {
        name: "HELP",
        syntax: "HELP [command]",
        summary: "Shows help for a command.",
    },
];

/// A timed ban waiting to be lifted.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingUnban {
    expires_at: i64,
    channel: String,
    mask: String,
}

/// SpamServ service.
pub struct SpamServ {
    client: PseudoClient,
    engine: AbuseEngine,
    secret: String,
    /// Numerics that passed AUTH on this link.
    elevated: HashSet<String>,
    /// Lowercased names of scanned channels.
    channels: HashSet<String>,
    /// Words from `[abuse].banned_words`.
    config_words: Vec<String>,
    /// Words added with BADWORD and kept in the store.
    stored_words: BTreeSet<String>,
    removal_duration: i64,
    pending_unbans: Vec<PendingUnban>,
}

impl SpamServ {
    pub fn new(config: &Config, homoglyphs: Arc<HomoglyphSet>) -> Result<Self, NumericError> {
        let client = PseudoClient::from_block(config, &config.services.spam.identity())?;
        let engine = AbuseEngine::new(
            AbuseSettings::from(&config.abuse),
            homoglyphs,
            BannedWords::new(&config.abuse.banned_words),
        );
        Ok(Self {
            client,
            engine,
            secret: config.services.spam.secret.clone(),
            elevated: HashSet::new(),
            channels: HashSet::new(),
            config_words: config.abuse.banned_words.clone(),
            stored_words: BTreeSet::new(),
            removal_duration: config.abuse.removal_duration as i64,
            pending_unbans: Vec::new(),
        })
    }

    /// Whether a channel is scanned.
    pub fn is_scanned(&self, channel: &str) -> bool {
        self.channels.contains(&irc_to_lower(channel))
    }

    /// Whether `word` comes from `[abuse].banned_words`.
    fn is_config_word(&self, word: &str) -> bool {
        self.config_words.iter().any(|w| w.to_lowercase() == word)
    }

    fn rebuild_words(&mut self) {
        *self.engine.words_mut() =
            BannedWords::new(self.config_words.iter().chain(self.stored_words.iter()));
    }

    /// Score a channel line and turn a verdict into remediation.
    async fn scan(
        &mut self,
        ctx: &mut LineContext<'_>,
        sender: &str,
        channel: &str,
        text: &str,
    ) -> ServiceResult {
        crate::metrics::record_abuse_check();
        let server = ctx.server().to_string();
        let Some(verdict) = self
            .engine
            .check(ctx.state, &server, sender, channel, text, ctx.now)
        else {
            return Vec::new();
        };
        self.remediate(ctx, sender, channel, verdict).await
    }

    async fn remediate(
        &mut self,
        ctx: &mut LineContext<'_>,
        sender: &str,
        channel: &str,
        verdict: Verdict,
    ) -> ServiceResult {
        let reason = verdict.violation.reason();
        crate::metrics::record_incident(verdict.violation.kind());
        let incident = ctx
            .db
            .incidents()
            .add(&reason)
            .await
            .or_log_default("incident_add");
        let numeric = self.client.numeric.clone();

        match verdict.remedy {
            Remedy::Devoice => {
                info!(
                    incident,
                    channel = %channel,
                    user = %sender,
                    reason = %reason,
                    "Devoicing abusive user"
                );
                vec![ServiceEffect::ChannelMode {
                    source: numeric,
                    channel: channel.to_string(),
                    modes: "-v".to_string(),
                    args: vec![sender.to_string()],
                }]
            }
            Remedy::Remove => {
                let Some(host) = ctx.state.user(sender).map(|u| u.visible_host().to_string())
                else {
                    return Vec::new();
                };
                let mask = format!("*!*@{host}");
                warn!(
                    incident,
                    channel = %channel,
                    user = %sender,
                    mask = %mask,
                    reason = %reason,
                    "Removing abusive user"
                );
                self.pending_unbans.push(PendingUnban {
                    expires_at: ctx.now + self.removal_duration,
                    channel: channel.to_string(),
                    mask: mask.clone(),
                });
                vec![
                    ServiceEffect::ChannelMode {
                        source: numeric.clone(),
                        channel: channel.to_string(),
                        modes: "+b".to_string(),
                        args: vec![mask],
                    },
                    ServiceEffect::Kick {
                        source: numeric,
                        channel: channel.to_string(),
                        target: sender.to_string(),
                        reason: format!("{reason} (incident #{incident})"),
                    },
                ]
            }
        }
    }
}

impl ServiceBase for SpamServ {
    fn service_name(&self) -> &'static str {
        "SpamServ"
    }

    fn commands(&self) -> &'static [CommandHelp] {
        COMMANDS
    }
}

#[async_trait]
impl ServiceProcessor for SpamServ {
    fn client(&self) -> &PseudoClient {
        &self.client
    }

    fn client_mut(&mut self) -> &mut PseudoClient {
        &mut self.client
    }

    /// Every registered channel. Also loads the stored banned words.
    async fn home_channels(&mut self, ctx: &mut LineContext<'_>) -> (Vec<String>, bool) {
        let channels = ctx.db.channels().all().await.or_log_default("channels_all");
        self.channels = channels.iter().map(|c| irc_to_lower(c)).collect();
        self.stored_words = ctx
            .db
            .badwords()
            .all()
            .await
            .or_log_default("badwords_all")
            .into_iter()
            .collect();
        self.rebuild_words();
        info!(
            channels = channels.len(),
            banned_words = self.engine.words().len(),
            "SpamServ loaded"
        );
        (channels, true)
    }

    async fn handle(&mut self, ctx: &mut LineContext<'_>, msg: &Message) -> Vec<ServiceEffect> {
        match msg.command.as_str() {
            "P" => {}
            "Q" => {
                self.elevated.remove(msg.source_str());
                return Vec::new();
            }
            "D" => {
                if let Some(target) = msg.arg(0) {
                    self.elevated.remove(target);
                }
                return Vec::new();
            }
            _ => return Vec::new(),
        }
        if msg.params.len() < 2 {
            return Vec::new();
        }
        let (Some(target), Some(text)) = (msg.arg(0), msg.last_arg()) else {
            return Vec::new();
        };
        let sender = msg.source_str();

        if target.starts_with('#') {
            if !self.is_scanned(target) {
                return Vec::new();
            }
            return self.scan(ctx, sender, target, text).await;
        }
        if self
            .client
            .addressed_by(target, &ctx.config.server.name)
            .is_none()
        {
            return Vec::new();
        }
        self.handle_command(ctx, sender, text).await
    }

    /// Lift timed bans that have run out.
    fn on_tick(&mut self, now: i64) -> Vec<ServiceEffect> {
        let (expired, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_unbans)
            .into_iter()
            .partition(|p| p.expires_at <= now);
        self.pending_unbans = pending;
        expired
            .into_iter()
            .map(|p| {
                debug!(channel = %p.channel, mask = %p.mask, "Lifting timed ban");
                ServiceEffect::ChannelMode {
                    source: self.client.numeric.clone(),
                    channel: p.channel,
                    modes: "-b".to_string(),
                    args: vec![p.mask],
                }
            })
            .collect()
    }

    fn rehash(&mut self, config: &Config) {
        self.engine.set_settings(AbuseSettings::from(&config.abuse));
        self.secret = config.services.spam.secret.clone();
        self.config_words = config.abuse.banned_words.clone();
        self.removal_duration = config.abuse.removal_duration as i64;
        self.rebuild_words();
        info!("SpamServ settings reloaded");
    }
}
