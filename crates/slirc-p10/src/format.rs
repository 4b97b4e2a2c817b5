//! Removal of mIRC-style formatting codes.
//!
//! Abuse checks compare what a human typed, so bold, colour, italics,
//! reverse, underline, strike and reset codes are dropped first.

use std::borrow::Cow;

const BOLD: char = '\x02';
const COLOR: char = '\x03';
const HEX_COLOR: char = '\x04';
const RESET: char = '\x0F';
const MONOSPACE: char = '\x11';
const REVERSE: char = '\x16';
const ITALIC: char = '\x1D';
const STRIKE: char = '\x1E';
const UNDERLINE: char = '\x1F';

fn is_format_char(c: char) -> bool {
    matches!(
        c,
        BOLD | COLOR | HEX_COLOR | RESET | MONOSPACE | REVERSE | ITALIC | STRIKE | UNDERLINE
    )
}

/// Strip formatting codes, borrowing when there are none.
///
/// Colour codes consume up to two foreground digits and, after a comma,
/// up to two background digits. Hex colours consume six hex digits per
/// component.
pub fn strip_formatting(text: &str) -> Cow<'_, str> {
    if !text.contains(is_format_char) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            COLOR => {
                skip_while_max(&mut chars, 2, |c| c.is_ascii_digit());
                if chars.peek() == Some(&',') {
                    let mut look = chars.clone();
                    look.next();
                    if look.peek().is_some_and(|c| c.is_ascii_digit()) {
                        chars.next();
                        skip_while_max(&mut chars, 2, |c| c.is_ascii_digit());
                    }
                }
            }
            HEX_COLOR => {
                skip_while_max(&mut chars, 6, |c| c.is_ascii_hexdigit());
                if chars.peek() == Some(&',') {
                    chars.next();
                    skip_while_max(&mut chars, 6, |c| c.is_ascii_hexdigit());
                }
            }
            c if is_format_char(c) => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn skip_while_max<I, F>(chars: &mut std::iter::Peekable<I>, max: usize, pred: F)
where
    I: Iterator<Item = char>,
    F: Fn(char) -> bool,
{
    for _ in 0..max {
        match chars.peek() {
            Some(&c) if pred(c) => {
                chars.next();
            }
            _ => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(strip_formatting("hello"), Cow::Borrowed("hello")));
    }

    #[test]
    fn strips_colours_and_styles() {
        assert_eq!(strip_formatting("\x0304,12red\x03 \x02bold\x02"), "red bold");
        assert_eq!(strip_formatting("\x031,x"), ",x");
        assert_eq!(strip_formatting("\x1Dit\x0F \x1Fu"), "it u");
    }
}
