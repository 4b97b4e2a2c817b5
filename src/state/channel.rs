//! Channel membership and role tracking.

use std::collections::{HashMap, HashSet};

/// Membership roles a user can hold in a channel. Not mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Admin,
    Op,
    HalfOp,
    Voice,
    Service,
}

impl Role {
    /// Role named by a channel mode or burst member letter.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'q' => Some(Role::Owner),
            'a' => Some(Role::Admin),
            'o' => Some(Role::Op),
            'h' => Some(Role::HalfOp),
            'v' => Some(Role::Voice),
            _ => None,
        }
    }
}

/// Channel modes that take an argument when set.
const ARG_ON_SET: &[char] = &['k', 'l', 'b'];
/// Channel modes that take an argument when unset.
const ARG_ON_UNSET: &[char] = &['k', 'b'];

#[derive(Debug, Clone, Default)]
pub struct Channel {
    /// Name as first seen.
    pub name: String,
    /// Simple mode letters currently set, without the `+`.
    pub modes: String,
    pub members: HashSet<String>,
    pub owners: HashSet<String>,
    pub admins: HashSet<String>,
    pub ops: HashSet<String>,
    pub halfops: HashSet<String>,
    pub voices: HashSet<String>,
    pub services: HashSet<String>,
    /// numeric -> Unix time of the latest join.
    pub joined_at: HashMap<String, i64>,
}

impl Channel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Whether mode `+m` is set.
    pub fn is_moderated(&self) -> bool {
        self.modes.contains('m')
    }

    pub fn role_set(&self, role: Role) -> &HashSet<String> {
        match role {
            Role::Owner => &self.owners,
            Role::Admin => &self.admins,
            Role::Op => &self.ops,
            Role::HalfOp => &self.halfops,
            Role::Voice => &self.voices,
            Role::Service => &self.services,
        }
    }

    fn role_set_mut(&mut self, role: Role) -> &mut HashSet<String> {
        match role {
            Role::Owner => &mut self.owners,
            Role::Admin => &mut self.admins,
            Role::Op => &mut self.ops,
            Role::HalfOp => &mut self.halfops,
            Role::Voice => &mut self.voices,
            Role::Service => &mut self.services,
        }
    }

    pub fn has_role(&self, numeric: &str, role: Role) -> bool {
        self.role_set(role).contains(numeric)
    }

    /// Add a member, stamping the join time.
    pub fn add_member(&mut self, numeric: &str, roles: &[Role], now: i64) {
        self.members.insert(numeric.to_string());
        self.joined_at.insert(numeric.to_string(), now);
        for role in roles {
            self.role_set_mut(*role).insert(numeric.to_string());
        }
    }

    pub fn remove_member(&mut self, numeric: &str) {
        self.members.remove(numeric);
        self.joined_at.remove(numeric);
        for role in [
            Role::Owner,
            Role::Admin,
            Role::Op,
            Role::HalfOp,
            Role::Voice,
            Role::Service,
        ] {
            self.role_set_mut(role).remove(numeric);
        }
    }

    /// Grant or revoke a role. Non-members are ignored.
    pub fn set_role(&mut self, numeric: &str, role: Role, granted: bool) {
        if !self.members.contains(numeric) {
            return;
        }
        let set = self.role_set_mut(role);
        if granted {
            set.insert(numeric.to_string());
        } else {
            set.remove(numeric);
        }
    }

    /// Apply a mode change such as `+mv-o AAAAB AAAAC`.
    pub fn apply_modes(&mut self, modes: &str, args: &[&str]) {
        let mut args = args.iter();
        let mut adding = true;
        for c in modes.chars() {
            match c {
                '+' => adding = true,
                '-' => adding = false,
                c => {
                    if let Some(role) = Role::from_letter(c) {
                        if let Some(target) = args.next() {
                            self.set_role(target, role, adding);
                        }
                        continue;
                    }
                    let takes_arg = if adding {
                        ARG_ON_SET.contains(&c)
                    } else {
                        ARG_ON_UNSET.contains(&c)
                    };
                    if takes_arg {
                        args.next();
                    }
                    if c == 'b' {
                        continue;
                    }
                    if adding && !self.modes.contains(c) {
                        self.modes.push(c);
                    } else if !adding {
                        self.modes.retain(|m| m != c);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderated_tracks_mode_string() {
        let mut chan = Channel::new("#test");
        chan.apply_modes("+ntm", &[]);
        assert!(chan.is_moderated());
        chan.apply_modes("-m", &[]);
        assert!(!chan.is_moderated());
        assert_eq!(chan.modes, "nt");
    }

    #[test]
    fn role_changes_consume_arguments() {
        let mut chan = Channel::new("#test");
        chan.add_member("AAAAB", &[], 10);
        chan.add_member("AAAAC", &[Role::Op], 10);
        chan.apply_modes("+kvb-o", &["key", "AAAAB", "*!*@x", "AAAAC"]);
        assert!(chan.has_role("AAAAB", Role::Voice));
        assert!(!chan.has_role("AAAAC", Role::Op));
        assert_eq!(chan.modes, "k");
    }

    #[test]
    fn roles_require_membership() {
        let mut chan = Channel::new("#test");
        chan.set_role("AAAAZ", Role::Voice, true);
        assert!(chan.voices.is_empty());

        chan.add_member("AAAAB", &[Role::Owner, Role::Voice], 5);
        chan.remove_member("AAAAB");
        assert!(chan.owners.is_empty() && chan.voices.is_empty());
        assert!(!chan.joined_at.contains_key("AAAAB"));
    }
}
