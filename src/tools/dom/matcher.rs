use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomNode;

/// Compound element matcher: `tag.class1.class2[attr]:last-child`.
///
/// Every part is optional (`*` or an empty tag matches any element), but at
/// least one must be present. Descendant combinators are not supported; site
/// configurations express nesting with separate matchers instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Matcher {
    tag: Option<String>,
    classes: Vec<String>,
    attrs: Vec<String>,
    last_child: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherError(pub String);

impl fmt::Display for MatcherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid matcher: {}", self.0)
    }
}
impl std::error::Error for MatcherError {}

impl Matcher {
    pub fn parse(input: &str) -> Result<Self, MatcherError> {
        let mut rest = input.trim();
        if rest.is_empty() {
            return Err(MatcherError(input.to_string()));
        }

        let mut last_child = false;
        if let Some(stripped) = rest.strip_suffix(":last-child") {
            last_child = true;
            rest = stripped;
        }

        let mut attrs = Vec::new();
        while let Some(open) = rest.rfind('[') {
            let close = rest[open..]
                .find(']')
                .map(|i| open + i)
                .ok_or_else(|| MatcherError(input.to_string()))?;
            let name = rest[open + 1..close].trim();
            if name.is_empty() || name.contains('=') {
                return Err(MatcherError(input.to_string()));
            }
            if close + 1 != rest.len() {
                return Err(MatcherError(input.to_string()));
            }
            attrs.insert(0, name.to_ascii_lowercase());
            rest = &rest[..open];
        }

        // `:last-child` is the only pseudo-class understood.
        if rest.contains([':', '(', ')']) {
            return Err(MatcherError(input.to_string()));
        }

        let mut parts = rest.split('.');
        let tag = match parts.next() {
            Some("") | Some("*") | None => None,
            Some(t) => Some(t.to_ascii_lowercase()),
        };
        let classes: Vec<String> = parts.map(str::to_string).collect();
        if classes.iter().any(|c| c.is_empty() || c.contains(char::is_whitespace)) {
            return Err(MatcherError(input.to_string()));
        }
        if tag.as_deref().is_some_and(|t| t.contains(char::is_whitespace)) {
            return Err(MatcherError(input.to_string()));
        }

        let matcher = Self {
            tag,
            classes,
            attrs,
            last_child,
        };
        if matcher.tag.is_none()
            && matcher.classes.is_empty()
            && matcher.attrs.is_empty()
            && !matcher.last_child
            && !input.trim().starts_with('*')
        {
            return Err(MatcherError(input.to_string()));
        }
        Ok(matcher)
    }

    /// Matcher on tag name alone.
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            classes: Vec::new(),
            attrs: Vec::new(),
            last_child: false,
        }
    }

    pub fn matches<N: DomNode>(&self, node: &N) -> bool {
        if let Some(tag) = &self.tag {
            if !node.tag_name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| node.has_class(c)) {
            return false;
        }
        if !self.attrs.iter().all(|a| node.attr(a).is_some()) {
            return false;
        }
        if self.last_child && node.next_sibling().is_some() {
            return false;
        }
        true
    }
}

impl FromStr for Matcher {
    type Err = MatcherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Matcher::parse(s)
    }
}

impl TryFrom<String> for Matcher {
    type Error = MatcherError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Matcher::parse(&value)
    }
}

impl From<Matcher> for String {
    fn from(m: Matcher) -> Self {
        m.to_string()
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{tag}")?,
            None if self.classes.is_empty() && self.attrs.is_empty() => write!(f, "*")?,
            None => {}
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for attr in &self.attrs {
            write!(f, "[{attr}]")?;
        }
        if self.last_child {
            write!(f, ":last-child")?;
        }
        Ok(())
    }
}
