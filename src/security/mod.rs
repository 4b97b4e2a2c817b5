//! Security module for slirc-services.
//!
//! Provides:
//! - **Cloaking**: HMAC-SHA256 per-label host masking
//! - **Homoglyphs**: the look-alike character set loaded at startup
//! - **Banned words**: Aho-Corasick word matching
//! - **Abuse engine**: per-line channel scoring and remediation verdicts
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Security Module                    │
//! ├─────────────┬──────────────┬────────────┬───────────┤
//! │  Cloaking   │  Homoglyphs  │   Words    │   Abuse   │
//! │ HMAC-SHA256 │  char set    │ AhoCorasick│ scoring   │
//! └─────────────┴──────────────┴────────────┴───────────┘
//! ```

pub mod abuse;
pub mod cloaking;
pub mod homoglyph;
pub mod spam;

pub use abuse::{AbuseEngine, AbuseSettings, Remedy, Verdict, Violation};
pub use cloaking::cloak_host;
pub use homoglyph::HomoglyphSet;
pub use spam::BannedWords;
