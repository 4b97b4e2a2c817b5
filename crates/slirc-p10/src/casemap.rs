//! RFC 1459 case mapping.
//!
//! Nicks and channel names compare case-insensitively, with `[]\~`
//! treated as the upper-case forms of `{}|^`.

/// Lower-case one character under RFC 1459 rules.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        'A'..='Z' => (c as u8 + 32) as char,
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        _ => c,
    }
}

/// Lower-case a nick or channel name.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Case-insensitive equality for nicks and channel names.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .chars()
            .zip(b.chars())
            .all(|(x, y)| irc_lower_char(x) == irc_lower_char(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_brackets() {
        assert_eq!(irc_to_lower("#Chan[A]"), "#chan{a}");
        assert!(irc_eq("Nick\\~", "nick|^"));
        assert!(!irc_eq("nick", "nick2"));
    }
}
