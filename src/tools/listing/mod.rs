//! Listing Discovery
//!
//! Category pages list recipe cards; each card becomes a skeleton record that
//! the detail pass fills in later.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

use crate::site::{Pagination, SiteConfig};
use crate::tools::clean::clean_line;
use crate::tools::dom::{parse_document, DomNode, Matcher};
use crate::types::*;

static PAGE_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)").expect("valid regex"));

/// Skeleton records for every recipe card on a listing page, in page order.
///
/// Cards without a link are skipped; a URL seen twice keeps its first card.
pub fn discover(html: &str, page_url: &str, site: &SiteConfig) -> Result<Vec<RecipeRecord>> {
    let base = Url::parse(page_url).map_err(|_| ResepiError::InvalidUrl(page_url.into()))?;
    let doc = parse_document(html);
    let root = doc.root_element();
    let link = Matcher::tag("a");

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for card in root.find_all(&site.listing.card) {
        let Some(title_node) = card.find(&site.listing.title) else {
            continue;
        };
        let href = title_node
            .find(&link)
            .or_else(|| title_node.closest(&link))
            .and_then(|a| a.attr("href").map(str::trim).map(str::to_string));
        let Some(href) = href.filter(|h| !h.is_empty()) else {
            continue;
        };
        let Ok(recipe_url) = base.join(&href) else {
            continue;
        };
        let recipe_url = recipe_url.to_string();
        if !seen.insert(recipe_url.clone()) {
            continue;
        }

        records.push(
            RecipeRecord::skeleton(recipe_url)
                .with_title(&clean_line(&DomNode::text(&title_node)))
                .with_page_url(page_url),
        );
    }
    Ok(records)
}

/// Page count from the site's "Halaman 1 / 10" style label; 1 when absent.
pub fn total_pages(html: &str, site: &SiteConfig) -> usize {
    let Some(label) = &site.listing.page_label else {
        return 1;
    };
    let doc = parse_document(html);
    doc.root_element()
        .find_all(label)
        .into_iter()
        .find_map(|node| {
            let text = DomNode::text(&node);
            let caps = PAGE_COUNT.captures(&text)?;
            caps.get(2)?.as_str().parse::<usize>().ok()
        })
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

/// URL of listing page `n` (1-based) under `base`.
pub fn page_url(base: &str, n: usize, site: &SiteConfig) -> Result<String> {
    let mut url = Url::parse(base).map_err(|_| ResepiError::InvalidUrl(base.into()))?;
    if n <= 1 {
        return Ok(url.to_string());
    }
    match &site.listing.pagination {
        Pagination::Query { param } => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| k != param)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .append_pair(param, &n.to_string());
        }
        Pagination::Path => {
            let path = url.path().trim_end_matches('/').to_string();
            url.set_path(&format!("{path}/page/{n}/"));
        }
    }
    Ok(url.to_string())
}

/// Category name of a listing URL: its last non-empty path segment.
pub fn category_name(listing_url: &str) -> Option<String> {
    let url = Url::parse(listing_url).ok()?;
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}
