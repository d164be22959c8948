//! Section Harvester
//!
//! Turns an anchor heading into the lines that belong to it. Two page layouts
//! are covered: a flat run of siblings after the heading (lists, interleaved
//! sub-headings) and a titled container holding sub-headed lists.


use once_cell::sync::Lazy;
use regex::Regex;

use crate::site::{InstructionsShape, SiteConfig};
use crate::tools::clean::clean_lines;
use crate::tools::dom::{DomNode, Matcher};
use crate::tools::locate::{ends_section, locate, Anchor};
use crate::types::{Instructions, SectionKind, Sections};

static NUMBERED_STEP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").expect("valid regex"));

fn is_list<N: DomNode>(node: &N) -> bool {
    matches!(node.tag_name(), "ul" | "ol")
}

/// Lines of every `li` under `list`, read from the item slot when one is set.
fn list_items<N: DomNode>(list: &N, slot: Option<&Matcher>) -> Vec<String> {
    let items = list.find_all(&Matcher::tag("li")).into_iter().map(|li| {
        slot.and_then(|s| li.find(s))
            .unwrap_or(li)
            .text()
    });
    clean_lines(items)
}

/// Everything under `anchor`, grouped by the heading each line sits under.
pub fn harvest<N: DomNode>(anchor: &Anchor<N>, site: &SiteConfig) -> Sections {
    let container = site
        .section_container
        .as_ref()
        .and_then(|m| anchor.node.closest(m));
    match container {
        Some(container) => harvest_container(&container, anchor, site),
        None => harvest_siblings(anchor, site),
    }
}

/// Walk the anchor's following siblings.
///
/// Lists feed the current bucket; a heading of the same (or no) section opens
/// a new bucket; a heading of another section or any other element ends the
/// walk.
fn harvest_siblings<N: DomNode>(anchor: &Anchor<N>, site: &SiteConfig) -> Sections {
    let slot = site.item_slots.for_kind(anchor.kind);
    let mut sections = Sections::new();
    let mut label = anchor.label.clone();

    for node in anchor.node.following_siblings() {
        if is_list(&node) {
            sections.extend_section(&label, list_items(&node, slot));
            continue;
        }
        if let Some(heading) = site.heading_text(&node) {
            if ends_section(anchor.kind, &heading, site) {
                break;
            }
            label = heading;
            continue;
        }
        if site.sub_heading.as_ref().is_some_and(|m| m.matches(&node)) {
            let text = node.trimmed_text();
            if !text.is_empty() {
                label = text;
            }
            continue;
        }
        break;
    }
    sections
}

/// Sub-headings inside the container, each labelling the list right after it.
/// Without sub-headings, the container's lists form one bucket under the
/// anchor's own label.
fn harvest_container<N: DomNode>(container: &N, anchor: &Anchor<N>, site: &SiteConfig) -> Sections {
    let slot = site.item_slots.for_kind(anchor.kind);
    let mut sections = Sections::new();

    if let Some(sub) = &site.sub_heading {
        for header in container.find_all(sub) {
            let mut label = header.trimmed_text();
            if label.is_empty() {
                label = anchor.label.clone();
            }
            if let Some(list) = header.next_sibling().filter(is_list) {
                sections.extend_section(&label, list_items(&list, slot));
            }
        }
        if !sections.is_empty() {
            return sections;
        }
    }

    let mut lists = Vec::new();
    top_level_lists(container, &mut lists);
    for list in lists {
        sections.extend_section(&anchor.label, list_items(&list, slot));
    }
    sections
}

fn top_level_lists<N: DomNode>(node: &N, out: &mut Vec<N>) {
    for child in node.children() {
        if is_list(&child) {
            out.push(child);
        } else {
            top_level_lists(&child, out);
        }
    }
}

/// Paragraphs in `region` that start with `N.`, in document order.
pub fn numbered_paragraphs<N: DomNode>(region: &N) -> Vec<String> {
    let steps = region
        .find_all(&Matcher::tag("p"))
        .into_iter()
        .map(|p| p.trimmed_text())
        .filter(|text| NUMBERED_STEP.is_match(text));
    clean_lines(steps)
}

/// Locate and harvest one section of `region`; empty when no heading matches.
pub fn harvest_section<N: DomNode>(region: &N, kind: SectionKind, site: &SiteConfig) -> Sections {
    locate(region, kind, site)
        .map(|anchor| harvest(&anchor, site))
        .unwrap_or_default()
}

pub fn harvest_ingredients<N: DomNode>(region: &N, site: &SiteConfig) -> Sections {
    harvest_section(region, SectionKind::Ingredients, site)
}

/// Instructions in the site's shape.
///
/// When the structured walk finds nothing and the site allows it, numbered
/// paragraphs anywhere in the region are taken instead; that result is always
/// flat.
pub fn harvest_instructions<N: DomNode>(region: &N, site: &SiteConfig) -> Instructions {
    let sections = harvest_section(region, SectionKind::Instructions, site);
    if sections.is_empty() && site.numbered_fallback {
        return Instructions::Flat(numbered_paragraphs(region));
    }
    match site.instructions_shape {
        InstructionsShape::Flat => Instructions::Flat(sections.flatten()),
        InstructionsShape::Sectioned => Instructions::Sectioned(sections),
    }
}

pub fn harvest_tips<N: DomNode>(region: &N, site: &SiteConfig) -> Vec<String> {
    harvest_section(region, SectionKind::Tips, site).flatten()
}
