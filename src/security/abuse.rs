//! Channel abuse scoring.
//!
//! Every line said in a scanned channel runs through four checks in order:
//! homoglyphs from new joiners, repeated lines, flooding and banned words.
//! The first check that fires produces a [`Verdict`]; later checks are not
//! run for that line.

use std::sync::Arc;

use slirc_p10::numeric::ClientNumeric;
use slirc_p10::strip_formatting;

use crate::config::AbuseConfig;
use crate::security::{BannedWords, HomoglyphSet};
use crate::state::{NetworkState, Role};

/// Thresholds, taken from `[abuse]`.
#[derive(Debug, Clone, Copy)]
pub struct AbuseSettings {
    /// Seconds after a join during which a member counts as new.
    pub new_join_window: i64,
    pub repeat_limit: u32,
    pub flood_limit: u32,
    pub new_join_flood_limit: u32,
}

impl From<&AbuseConfig> for AbuseSettings {
    fn from(config: &AbuseConfig) -> Self {
        Self {
            new_join_window: config.new_join_window as i64,
            repeat_limit: config.repeat_limit,
            flood_limit: config.flood_limit,
            new_join_flood_limit: config.new_join_flood_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Homoglyph,
    Repeat,
    Flood,
    BannedWord(String),
}

impl Violation {
    /// Incident reason as stored and quoted in kicks.
    pub fn reason(&self) -> String {
        match self {
            Violation::Homoglyph => "possible homoglyph spam".to_string(),
            Violation::Repeat => "repeating lines".to_string(),
            Violation::Flood => "flooding".to_string(),
            Violation::BannedWord(word) => format!("used banned word: {}", word),
        }
    }

    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Violation::Homoglyph => "homoglyph",
            Violation::Repeat => "repeat",
            Violation::Flood => "flood",
            Violation::BannedWord(_) => "banned_word",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remedy {
    /// Take voice away in a moderated channel.
    Devoice,
    /// Ban and kick for a while.
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub violation: Violation,
    pub remedy: Remedy,
}

pub struct AbuseEngine {
    settings: AbuseSettings,
    homoglyphs: Arc<HomoglyphSet>,
    words: BannedWords,
}

impl AbuseEngine {
    pub fn new(settings: AbuseSettings, homoglyphs: Arc<HomoglyphSet>, words: BannedWords) -> Self {
        Self {
            settings,
            homoglyphs,
            words,
        }
    }

    pub fn words(&self) -> &BannedWords {
        &self.words
    }

    pub fn words_mut(&mut self) -> &mut BannedWords {
        &mut self.words
    }

    pub fn set_settings(&mut self, settings: AbuseSettings) {
        self.settings = settings;
    }

    /// Score one channel line.
    ///
    /// `local_server` is our own server numeric; lines from our own
    /// pseudo-clients are never scored. Unknown senders or channels pass.
    pub fn check(
        &self,
        state: &mut NetworkState,
        local_server: &str,
        sender: &str,
        channel: &str,
        text: &str,
        now: i64,
    ) -> Option<Verdict> {
        if ClientNumeric::belongs_to(sender, local_server) {
            return None;
        }
        let chan = state.channel(channel)?;
        let user = state.user(sender)?;
        if chan.has_role(sender, Role::Owner)
            || chan.has_role(sender, Role::Service)
            || user.service
            || user.oper
        {
            return None;
        }

        let recent = chan
            .joined_at
            .get(sender)
            .is_some_and(|joined| now - joined < self.settings.new_join_window);
        let remedy = if chan.is_moderated() && chan.has_role(sender, Role::Voice) {
            Remedy::Devoice
        } else {
            Remedy::Remove
        };
        let text = strip_formatting(text);

        let verdict = |violation| Some(Verdict { violation, remedy });

        if recent && self.homoglyphs.contains_any(&text) {
            return verdict(Violation::Homoglyph);
        }

        let user = state.user_mut(sender)?;

        let lowered = text.to_lowercase();
        if user.last_line.as_deref() == Some(lowered.as_str()) {
            user.repeat_score += 1;
            if user.repeat_score > self.settings.repeat_limit {
                user.repeat_score = 0;
                return verdict(Violation::Repeat);
            }
        } else {
            user.repeat_score = 0;
            user.last_line = Some(lowered);
        }

        user.flood_score += 1;
        let flooding = (recent && user.flood_score > self.settings.new_join_flood_limit)
            || user.flood_score > self.settings.flood_limit;
        if flooding {
            if remedy == Remedy::Devoice {
                user.flood_score = 0;
            }
            return verdict(Violation::Flood);
        }

        if let Some(word) = self.words.find(&text) {
            return verdict(Violation::BannedWord(word.to_string()));
        }
        None
    }
}
