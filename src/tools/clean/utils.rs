/// Line-cleaning helpers shared by the harvester and the assembler.
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// Unicode-aware: also matches NBSP, which recipe CMSes sprinkle between
// quantities and units.
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Compose to NFC so `é` typed two ways compares equal.
pub(super) fn normalize_unicode(text: &str) -> String {
    text.nfc().collect::<String>()
}

/// Drop zero-width marks (U+200B..U+200D, BOM) and control characters.
/// Newlines and tabs survive; whitespace normalization folds them later.
pub(super) fn strip_invisible(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(*c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}'))
        .filter(|c| !c.is_control() || matches!(*c, '\n' | '\t'))
        .collect()
}

/// Collapse every whitespace run to one space and trim both ends.
pub(super) fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}
