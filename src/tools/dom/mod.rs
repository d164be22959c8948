//! DOM Tools
//!
//! A read-only view over a parsed page. Extraction rules only ever see a
//! [`DomNode`]; the `scraper` implementation lives here and nowhere else.

mod matcher;

pub use matcher::*;

use scraper::{ElementRef, Html};

/// Element-level traversal over a document tree.
///
/// Only element nodes are visible: text nodes are reached through
/// [`DomNode::text`], comments are skipped.
pub trait DomNode: Sized + Clone {
    fn tag_name(&self) -> &str;

    /// Concatenated text of this node and all its descendants.
    fn text(&self) -> String;

    fn attr(&self, name: &str) -> Option<&str>;

    /// Next element sibling.
    fn next_sibling(&self) -> Option<Self>;

    /// Element children in document order.
    fn children(&self) -> Vec<Self>;

    fn parent(&self) -> Option<Self>;

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Trimmed text content.
    fn trimmed_text(&self) -> String {
        self.text().trim().to_string()
    }

    /// All descendants in document (pre-)order, excluding `self`.
    fn descendants(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut stack: Vec<Self> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    fn following_siblings(&self) -> Siblings<Self> {
        Siblings {
            next: self.next_sibling(),
        }
    }

    /// First descendant matching `matcher`.
    fn find(&self, matcher: &Matcher) -> Option<Self> {
        self.descendants().into_iter().find(|n| matcher.matches(n))
    }

    /// Every descendant matching `matcher`, in document order.
    fn find_all(&self, matcher: &Matcher) -> Vec<Self> {
        self.descendants()
            .into_iter()
            .filter(|n| matcher.matches(n))
            .collect()
    }

    /// Nearest node, starting with `self`, that matches `matcher`.
    fn closest(&self, matcher: &Matcher) -> Option<Self> {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if matcher.matches(&node) {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }
}

/// Iterator over following element siblings.
pub struct Siblings<N> {
    next: Option<N>,
}

impl<N: DomNode> Iterator for Siblings<N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let current = self.next.take()?;
        self.next = current.next_sibling();
        Some(current)
    }
}

impl<'a> DomNode for ElementRef<'a> {
    fn tag_name(&self) -> &str {
        ElementRef::value(self).name()
    }

    fn text(&self) -> String {
        ElementRef::text(self).collect()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        ElementRef::value(self).attr(name)
    }

    fn next_sibling(&self) -> Option<Self> {
        let node = &**self;
        node.next_siblings().find_map(ElementRef::wrap)
    }

    fn children(&self) -> Vec<Self> {
        let node = &**self;
        node.children().filter_map(ElementRef::wrap).collect()
    }

    fn parent(&self) -> Option<Self> {
        let node = &**self;
        node.parent().and_then(ElementRef::wrap)
    }
}

/// Parse a full HTML page.
pub fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}
