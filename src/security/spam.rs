//! Banned-word matching.
//!
//! Aho-Corasick over the lowercased word list, so one pass over a line
//! finds the leftmost banned word regardless of case.

use aho_corasick::{AhoCorasick, MatchKind};
use std::collections::BTreeSet;
use tracing::warn;

pub struct BannedWords {
    matcher: Option<AhoCorasick>,
    /// Raw words for management/rebuilding
    words: BTreeSet<String>,
}

impl BannedWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: BTreeSet<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        let mut this = Self {
            matcher: None,
            words,
        };
        this.rebuild();
        this
    }

    fn rebuild(&mut self) {
        if self.words.is_empty() {
            self.matcher = None;
            return;
        }
        match AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostFirst)
            .build(&self.words)
        {
            Ok(matcher) => self.matcher = Some(matcher),
            Err(err) => {
                warn!(error = ?err, "Failed to build banned word matcher; word matching disabled");
                self.matcher = None;
            }
        }
    }

    /// First banned word contained in `text`, compared case-insensitively.
    pub fn find(&self, text: &str) -> Option<&str> {
        let matcher = self.matcher.as_ref()?;
        let lowered = text.to_lowercase();
        let found = matcher.find(&lowered)?;
        self.words
            .iter()
            .nth(found.pattern().as_usize())
            .map(String::as_str)
    }

    /// Add a word. Returns `false` if it was already present.
    pub fn add(&mut self, word: &str) -> bool {
        let word = word.trim().to_lowercase();
        if word.is_empty() || !self.words.insert(word) {
            return false;
        }
        self.rebuild();
        true
    }

    /// Remove a word. Returns `false` if it was not present.
    pub fn remove(&mut self, word: &str) -> bool {
        if !self.words.remove(&word.trim().to_lowercase()) {
            return false;
        }
        self.rebuild();
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_case_insensitively() {
        let words = BannedWords::new(["spam", "Casino"]);
        assert_eq!(words.find("SPAM!!"), Some("spam"));
        assert_eq!(words.find("visit the cAsInO"), Some("casino"));
        assert_eq!(words.find("hello"), None);
    }

    #[test]
    fn reports_leftmost_word() {
        let words = BannedWords::new(["zzz", "aaa"]);
        assert_eq!(words.find("x zzz aaa"), Some("zzz"));
    }

    #[test]
    fn add_and_remove_rebuild_matcher() {
        let mut words = BannedWords::new(Vec::<String>::new());
        assert_eq!(words.find("anything"), None);
        assert!(words.add("Phish"));
        assert!(!words.add("phish"));
        assert_eq!(words.find("no phishing"), Some("phish"));
        assert!(words.remove("PHISH"));
        assert!(!words.remove("phish"));
        assert_eq!(words.find("no phishing"), None);
        assert_eq!(words.len(), 0);
    }
}
