//! Connection-scoped view of the network.
//!
//! Rebuilt from the burst every time a link comes up and mutated only by
//! the link's reader as lines arrive.

use std::collections::HashMap;

use slirc_p10::numeric;
use slirc_p10::{Message, irc_eq, irc_to_lower};
use tracing::{debug, trace};

use super::channel::{Channel, Role};
use super::user::RemoteUser;

/// Users, channels and servers known on the current link.
#[derive(Debug, Default)]
pub struct NetworkState {
    users: HashMap<String, RemoteUser>,
    channels: HashMap<String, Channel>,
    /// server numeric -> server name
    servers: HashMap<String, String>,
}

impl NetworkState {
    pub fn new() -> Self {
        Self::default()
    }

    // === Users ===

    /// Add a user, replacing any existing entry with the same numeric.
    pub fn introduce_user(
        &mut self,
        numeric: &str,
        nick: &str,
        account: Option<&str>,
        host: &str,
    ) -> &mut RemoteUser {
        if let Some(old) = self.users.remove(numeric) {
            debug!(numeric, old_nick = %old.nick, "Numeric reintroduced, replacing user");
            self.part_all(&old);
        }
        let mut user = RemoteUser::new(numeric, nick, "", host);
        user.account = account.map(str::to_string);
        self.users.entry(numeric.to_string()).or_insert(user)
    }

    /// Remove a user from the map and from every channel.
    pub fn remove_user(&mut self, numeric: &str) -> Option<RemoteUser> {
        let user = self.users.remove(numeric)?;
        self.part_all(&user);
        Some(user)
    }

    fn part_all(&mut self, user: &RemoteUser) {
        for name in &user.channels {
            if let Some(chan) = self.channels.get_mut(name) {
                chan.remove_member(&user.numeric);
            }
        }
    }

    pub fn user(&self, numeric: &str) -> Option<&RemoteUser> {
        self.users.get(numeric)
    }

    pub fn user_mut(&mut self, numeric: &str) -> Option<&mut RemoteUser> {
        self.users.get_mut(numeric)
    }

    /// Linear, case-insensitive nick lookup.
    pub fn find_by_nick(&self, nick: &str) -> Option<&RemoteUser> {
        self.users.values().find(|u| irc_eq(&u.nick, nick))
    }

    /// The user currently logged into `account`, if any.
    pub fn find_by_account(&self, account: &str) -> Option<&RemoteUser> {
        self.users
            .values()
            .find(|u| u.account.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(account)))
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Decrement every positive flood score by one.
    pub fn decay_flood_scores(&mut self) {
        for user in self.users.values_mut() {
            user.flood_score = user.flood_score.saturating_sub(1);
        }
    }

    // === Channels ===

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(&irc_to_lower(name))
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.get_mut(&irc_to_lower(name))
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Join a user to a channel, creating the channel if needed.
    ///
    /// `roles` are membership letters (`q`, `a`, `o`, `h`, `v`); other
    /// letters are ignored. Users with service mode also land in the
    /// service role set.
    pub fn join_channel(&mut self, numeric: &str, channel: &str, roles: &str, now: i64) {
        let key = irc_to_lower(channel);
        let Some(user) = self.users.get_mut(numeric) else {
            trace!(numeric, channel, "Join from unknown numeric ignored");
            return;
        };
        user.channels.insert(key.clone());

        let mut granted: Vec<Role> = roles.chars().filter_map(Role::from_letter).collect();
        if user.service {
            granted.push(Role::Service);
        }
        self.channels
            .entry(key)
            .or_insert_with(|| Channel::new(channel))
            .add_member(numeric, &granted, now);
    }

    /// Remove a user from one channel. Also used for kicks.
    pub fn leave_channel(&mut self, numeric: &str, channel: &str) {
        let key = irc_to_lower(channel);
        if let Some(user) = self.users.get_mut(numeric) {
            user.channels.remove(&key);
        }
        if let Some(chan) = self.channels.get_mut(&key) {
            chan.remove_member(numeric);
        }
    }

    /// Apply a channel mode change.
    pub fn apply_mode_change(&mut self, channel: &str, modes: &str, args: &[&str]) {
        if let Some(chan) = self.channel_mut(channel) {
            chan.apply_modes(modes, args);
        }
    }

    // === Line processing ===

    /// Fold one inbound line into the state.
    pub fn apply(&mut self, msg: &Message, now: i64) {
        let source = msg.source_str();
        match msg.command.as_str() {
            "N" => self.on_nick(source, msg),
            "B" => self.on_burst(msg, now),
            "C" | "J" => self.on_join(source, msg, now),
            "L" => {
                if let Some(chans) = msg.arg(0) {
                    for chan in chans.split(',') {
                        self.leave_channel(source, chan);
                    }
                }
            }
            "K" => {
                if let (Some(chan), Some(target)) = (msg.arg(0), msg.arg(1)) {
                    self.leave_channel(target, chan);
                }
            }
            "M" | "OM" => self.on_mode(msg),
            "Q" => {
                self.remove_user(source);
            }
            "D" => {
                if let Some(target) = msg.arg(0) {
                    self.remove_user(target);
                }
            }
            "AC" => self.on_account(msg),
            "FA" => {
                if let (Some(target), Some(host)) = (msg.arg(0), msg.arg(1))
                    && let Some(user) = self.users.get_mut(target)
                {
                    user.cloaked_host = Some(host.to_string());
                }
            }
            "S" => {
                if let (Some(name), Some(block)) = (msg.arg(0), msg.arg(5)) {
                    self.add_server(block, name);
                }
            }
            "SQ" => {
                if let Some(name) = msg.arg(0) {
                    self.on_squit(name);
                }
            }
            _ => {}
        }
    }

    /// Remember a server from its numeric block (numeric plus capacity).
    pub fn add_server(&mut self, block: &str, name: &str) {
        if let Some(first) = block.chars().next() {
            self.servers.insert(first.to_string(), name.to_string());
        }
    }

    fn on_nick(&mut self, source: &str, msg: &Message) {
        if msg.params.len() >= 8 {
            self.on_introduction(msg);
            return;
        }
        // Nick change: "<user> N <newnick> <ts>"
        if let Some(nick) = msg.arg(0)
            && let Some(user) = self.users.get_mut(source)
        {
            user.nick = nick.to_string();
        }
    }

    /// `N <nick> <hop> <ts> <ident> <host> [+modes [args]] <ip> <numeric> :<desc>`
    fn on_introduction(&mut self, msg: &Message) {
        let p = &msg.params;
        let n = p.len();
        let numeric = &p[n - 2];
        let mut account = None;
        let mut fakehost = None;
        let mut modes = "";

        let extra = &p[5..n - 3];
        if let Some((first, rest)) = extra.split_first()
            && first.starts_with('+')
        {
            modes = first.as_str();
            let mut args = rest.iter();
            for c in modes.chars() {
                match c {
                    // "account" or "account:timestamp"
                    'r' => {
                        account = args
                            .next()
                            .map(|a| a.split(':').next().unwrap_or(a).to_string());
                    }
                    'h' | 'f' => fakehost = args.next().cloned(),
                    _ => {}
                }
            }
        }

        let user = self.introduce_user(numeric, &p[0], account.as_deref(), &p[4]);
        user.ident = p[3].clone();
        user.cloaked_host = fakehost;
        user.apply_modes(modes);
        trace!(numeric = %numeric, nick = %p[0], "User introduced");
    }

    /// `B <chan> <ts> [+modes [args]] [members] [:%bans]`
    fn on_burst(&mut self, msg: &Message, now: i64) {
        let Some(name) = msg.arg(0) else { return };
        let key = irc_to_lower(name);
        self.channels
            .entry(key)
            .or_insert_with(|| Channel::new(name));

        let mut idx = 2;
        if let Some(modes) = msg.arg(idx)
            && modes.starts_with('+')
        {
            let argc = modes.chars().filter(|c| matches!(c, 'k' | 'l')).count();
            let args: Vec<&str> = msg.params[idx + 1..]
                .iter()
                .take(argc)
                .map(String::as_str)
                .collect();
            self.apply_mode_change(name, modes, &args);
            idx += 1 + argc;
        }

        if let Some(members) = msg.arg(idx)
            && !members.starts_with('%')
        {
            // Member roles carry over to following entries until changed.
            let mut roles = String::new();
            for entry in members.split(',') {
                let numeric = match entry.split_once(':') {
                    Some((numeric, r)) => {
                        roles = r.chars().filter(|c| c.is_ascii_alphabetic()).collect();
                        numeric
                    }
                    None => entry,
                };
                self.join_channel(numeric, name, &roles, now);
            }
        }
    }

    fn on_join(&mut self, source: &str, msg: &Message, now: i64) {
        let Some(chans) = msg.arg(0) else { return };
        if chans == "0" {
            if let Some(user) = self.users.get(source) {
                let joined: Vec<String> = user.channels.iter().cloned().collect();
                for chan in joined {
                    self.leave_channel(source, &chan);
                }
            }
            return;
        }
        let roles = if msg.is("C") { "o" } else { "" };
        for chan in chans.split(',') {
            self.join_channel(source, chan, roles, now);
        }
    }

    fn on_mode(&mut self, msg: &Message) {
        let (Some(target), Some(modes)) = (msg.arg(0), msg.arg(1)) else {
            return;
        };
        if target.starts_with('#') || target.starts_with('&') {
            let args: Vec<&str> = msg.params[2..].iter().map(String::as_str).collect();
            self.apply_mode_change(target, modes, &args);
            return;
        }
        // User modes are addressed by nick
        let numeric = self.find_by_nick(target).map(|u| u.numeric.clone());
        if let Some(user) = numeric.and_then(|n| self.users.get_mut(&n)) {
            user.apply_modes(modes);
        }
    }

    /// `AC <target> <account> [ts]` or `AC <target> R|M|U <account>`
    fn on_account(&mut self, msg: &Message) {
        let Some(target) = msg.arg(0) else { return };
        let account = match msg.arg(1) {
            Some("U") => None,
            Some("R") | Some("M") => msg.arg(2),
            other => other,
        };
        if let Some(user) = self.users.get_mut(target) {
            user.account = account.map(str::to_string);
        }
    }

    fn on_squit(&mut self, name: &str) {
        let Some(server) = self
            .servers
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(num, _)| num.clone())
        else {
            return;
        };
        self.servers.remove(&server);

        let gone: Vec<String> = self
            .users
            .keys()
            .filter(|num| !numeric::is_server_source(num) && num.starts_with(&server))
            .cloned()
            .collect();
        debug!(server = %name, users = gone.len(), "Server split");
        for numeric in gone {
            self.remove_user(&numeric);
        }
    }

    /// Whether `numeric` names a known server.
    pub fn is_server(&self, numeric: &str) -> bool {
        numeric::is_server_source(numeric) && self.servers.contains_key(numeric)
    }
}
