mod utils;

use utils::*;

/// Clean one extracted line.
///
/// NFC composition, zero-width and control characters removed, whitespace
/// runs collapsed, ends trimmed.
///
/// # Examples
/// ```
/// use resepi::tools::clean::clean_line;
///
/// let dirty = "  2 ulas\u{200B} bawang\n   putih ";
/// assert_eq!(clean_line(dirty), "2 ulas bawang putih");
/// ```
pub fn clean_line(text: &str) -> String {
    normalize_whitespace(&strip_invisible(&normalize_unicode(text)))
}

/// Clean every line, dropping the ones that end up empty. Order is kept.
///
/// # Examples
/// ```
/// use resepi::tools::clean::clean_lines;
///
/// let lines = clean_lines(vec![" garam ", "\u{FEFF}", "gula  secukup rasa"]);
/// assert_eq!(lines, vec!["garam", "gula secukup rasa"]);
/// ```
pub fn clean_lines<I, S>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts
        .into_iter()
        .map(|t| clean_line(t.as_ref()))
        .filter(|t| !t.is_empty())
        .collect()
}
