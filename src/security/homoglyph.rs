//! Homoglyph character set.
//!
//! Loaded once at startup from a text file: every non-whitespace character
//! on a line is a homoglyph, and lines starting with `#` are comments.

use std::collections::HashSet;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct HomoglyphSet {
    chars: HashSet<char>,
}

impl HomoglyphSet {
    /// Read the set from `path`. A missing file is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let chars = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .flat_map(|line| line.chars().filter(|c| !c.is_whitespace()))
            .collect();
        Self { chars }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Whether `text` contains any homoglyph.
    pub fn contains_any(&self, text: &str) -> bool {
        text.chars().any(|c| self.chars.contains(&c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_lines_and_skips_comments() {
        let set = HomoglyphSet::parse("# cyrillic\nа е\n\n  о\n#ignored ѕ\n");
        assert_eq!(set.len(), 3);
        assert!(set.contains_any("hellо"));
        assert!(!set.contains_any("hello"));
        assert!(!set.contains_any("ѕ"));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# test\nа").unwrap();
        let set = HomoglyphSet::load(file.path()).unwrap();
        assert!(set.contains_any("pаypal"));
    }

    #[test]
    fn missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(HomoglyphSet::load(dir.path().join("absent.txt")).is_err());
    }
}
