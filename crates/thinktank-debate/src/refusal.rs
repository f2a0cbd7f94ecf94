//! Content-policy refusal detection
//!
//! Providers sometimes decline to argue a position. Those replies are caught
//! with a small set of case-insensitive patterns so the engine can retry the
//! turn and, failing that, substitute a neutral line.

use once_cell::sync::Lazy;
use regex::RegexSet;

/// Default refusal patterns.
///
/// Each targets an apology-and-decline or self-disclaiming phrasing; all are
/// matched case-insensitively anywhere in the response.
pub const DEFAULT_PATTERNS: &[&str] = &[
    // "I'm sorry, but I can't ..." / "I apologize, but I cannot ..."
    r"(i'?m|i am) sorry,? but i (can'?t|cannot|won'?t|will not|am unable|'m unable)",
    r"i apologi[sz]e,? but i (can'?t|cannot|won'?t|will not|am unable|'m unable)",
    // Flat declines
    r"i (can'?t|cannot|won'?t|will not) (help|assist|comply|engage|participate|continue) with",
    r"i('m| am) (not able|unable) to (help|assist|comply|engage|participate|provide)",
    r"i must (respectfully )?decline",
    // Self-disclaimers that usually precede a refusal
    r"as an ai( language model)?,? i (can'?t|cannot|don'?t|do not)",
    r"against my (content |usage )?(policy|policies|guidelines)",
];

static DEFAULT_SET: Lazy<RegexSet> = Lazy::new(|| {
    compile(DEFAULT_PATTERNS.iter().copied()).expect("built-in refusal patterns are valid")
});

fn compile<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<RegexSet, regex::Error> {
    RegexSet::new(patterns.into_iter().map(|p| format!("(?i){}", p)))
}

/// Matches generated text against a set of refusal patterns
#[derive(Debug, Clone)]
pub struct RefusalDetector {
    patterns: RegexSet,
}

impl RefusalDetector {
    /// Build a detector from custom patterns (matched case-insensitively)
    pub fn new<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<Self, regex::Error> {
        Ok(Self {
            patterns: compile(patterns)?,
        })
    }

    /// Whether the text reads as a refusal
    pub fn is_refusal(&self, text: &str) -> bool {
        // Curly apostrophes are common in model output
        let normalized = text.replace(['\u{2019}', '\u{2018}'], "'");
        self.patterns.is_match(&normalized)
    }

    /// Indices of the patterns that matched, for logging
    pub fn matching_patterns(&self, text: &str) -> Vec<usize> {
        let normalized = text.replace(['\u{2019}', '\u{2018}'], "'");
        self.patterns.matches(&normalized).into_iter().collect()
    }
}

impl Default for RefusalDetector {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_SET.clone(),
        }
    }
}
