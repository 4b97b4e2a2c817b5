//! Account privilege and status flags.
//!
//! Stored as a 16-bit mask on each account and shown to users as letters.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UserFlags: u16 {
        const INACTIVE = 0x0001;
        const GLINED = 0x0002;
        const NOTICE = 0x0004;
        const STAFF = 0x0008;
        const SUSPENDED = 0x0010;
        const OPER = 0x0020;
        const DEV = 0x0040;
        const PROTECTED = 0x0080;
        const HELPER = 0x0100;
        const ADMIN = 0x0200;
        const INFO = 0x0400;
        const DELAYED_GLINE = 0x0800;
        const NO_AUTH_LIMIT = 0x1000;
        const ACHIEVEMENTS = 0x2000;
        const CLEANUP_EXEMPT = 0x4000;
        const TRUST = 0x8000;
    }
}

/// Bit to letter table, in bit order.
const LETTERS: [(UserFlags, char); 16] = [
    (UserFlags::INACTIVE, 'I'),
    (UserFlags::GLINED, 'g'),
    (UserFlags::NOTICE, 'n'),
    (UserFlags::STAFF, 'q'),
    (UserFlags::SUSPENDED, 'z'),
    (UserFlags::OPER, 'o'),
    (UserFlags::DEV, 'd'),
    (UserFlags::PROTECTED, 'p'),
    (UserFlags::HELPER, 'h'),
    (UserFlags::ADMIN, 'a'),
    (UserFlags::INFO, 'i'),
    (UserFlags::DELAYED_GLINE, 'G'),
    (UserFlags::NO_AUTH_LIMIT, 'L'),
    (UserFlags::ACHIEVEMENTS, 'c'),
    (UserFlags::CLEANUP_EXEMPT, 'D'),
    (UserFlags::TRUST, 'T'),
];

impl UserFlags {
    /// Flags an unprivileged account may change on itself.
    pub const SELF_SERVICE: UserFlags = UserFlags::NOTICE;

    pub fn from_letter(letter: char) -> Option<Self> {
        LETTERS
            .iter()
            .find(|(_, l)| *l == letter)
            .map(|(flag, _)| *flag)
    }

    /// `+` followed by the set letters in bit order.
    pub fn render(self) -> String {
        std::iter::once('+')
            .chain(
                LETTERS
                    .iter()
                    .filter(|(flag, _)| self.contains(*flag))
                    .map(|(_, l)| *l),
            )
            .collect()
    }

    /// Oper, admin or dev.
    pub fn is_privileged(self) -> bool {
        self.intersects(UserFlags::OPER | UserFlags::ADMIN | UserFlags::DEV)
    }

    pub fn is_oper(self) -> bool {
        self.contains(UserFlags::OPER)
    }

    /// Whether replies should go out as notices instead of private messages.
    pub fn wants_notice(self) -> bool {
        self.contains(UserFlags::NOTICE)
    }

    pub fn is_suspended(self) -> bool {
        self.contains(UserFlags::SUSPENDED)
    }
}

/// A `+abc-def` style change request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagChange {
    pub add: UserFlags,
    pub remove: UserFlags,
    /// Letters that name no flag.
    pub unknown: Vec<char>,
}

impl FlagChange {
    /// Parse a change string. Returns `None` unless it starts with `+` or `-`.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut chars = spec.chars();
        let mut adding = match chars.next()? {
            '+' => true,
            '-' => false,
            _ => return None,
        };
        let mut change = FlagChange::default();
        for c in chars {
            match c {
                '+' => adding = true,
                '-' => adding = false,
                c => match UserFlags::from_letter(c) {
                    Some(flag) if adding => {
                        change.add.insert(flag);
                        change.remove.remove(flag);
                    }
                    Some(flag) => {
                        change.remove.insert(flag);
                        change.add.remove(flag);
                    }
                    None => change.unknown.push(c),
                },
            }
        }
        Some(change)
    }

    /// Drop every part of the change outside `allowed`.
    pub fn restrict_to(self, allowed: UserFlags) -> Self {
        Self {
            add: self.add & allowed,
            remove: self.remove & allowed,
            unknown: self.unknown,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    pub fn apply(&self, flags: UserFlags) -> UserFlags {
        (flags | self.add) - self.remove
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_cover_every_bit() {
        let all: UserFlags = LETTERS.iter().fold(UserFlags::empty(), |acc, (f, _)| acc | *f);
        assert_eq!(all, UserFlags::all());
        assert_eq!(UserFlags::all().render(), "+IgnqzodphaiGLcDT");
    }

    #[test]
    fn renders_in_bit_order() {
        let flags = UserFlags::CLEANUP_EXEMPT | UserFlags::OPER | UserFlags::ADMIN;
        assert_eq!(flags.render(), "+oaD");
        assert_eq!(UserFlags::empty().render(), "+");
    }

    #[test]
    fn privilege_predicates() {
        assert!(UserFlags::DEV.is_privileged());
        assert!(UserFlags::ADMIN.is_privileged());
        assert!(!(UserFlags::HELPER | UserFlags::STAFF).is_privileged());
        assert!(UserFlags::NOTICE.wants_notice());
    }

    #[test]
    fn parses_mixed_change() {
        let change = FlagChange::parse("+oa-nx").unwrap();
        assert_eq!(change.add, UserFlags::OPER | UserFlags::ADMIN);
        assert_eq!(change.remove, UserFlags::NOTICE);
        assert_eq!(change.unknown, vec!['x']);
        assert!(FlagChange::parse("oa").is_none());
        assert!(FlagChange::parse("").is_none());
    }

    #[test]
    fn unprivileged_change_keeps_only_notice() {
        let change = FlagChange::parse("+on").unwrap().restrict_to(UserFlags::SELF_SERVICE);
        assert_eq!(change.add, UserFlags::NOTICE);
        assert_eq!(change.apply(UserFlags::empty()), UserFlags::NOTICE);

        let change = FlagChange::parse("+o").unwrap().restrict_to(UserFlags::SELF_SERVICE);
        assert!(change.is_empty());
    }
}
