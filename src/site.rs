//! Per-site extraction conventions.
//!
//! Everything that differs between target sites (where the content lives, how
//! headings look, which words mark a section, where values sit) is data in a
//! [`SiteConfig`]. Supporting a new template means writing a new config.

use crate::tools::dom::{DomNode, Matcher};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Heading keywords, matched against lower-cased heading text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keywords {
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub tips: Vec<String>,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            ingredients: vec!["bahan".into()],
            instructions: vec!["cara".into()],
            tips: vec!["petua".into()],
        }
    }
}

impl Keywords {
    pub fn for_kind(&self, kind: SectionKind) -> &[String] {
        match kind {
            SectionKind::Ingredients => &self.ingredients,
            SectionKind::Instructions => &self.instructions,
            SectionKind::Tips => &self.tips,
        }
    }

    /// Ingredient and tip headings match on substring, instruction headings
    /// on prefix ("Cara Memasak", but not "Hidangan cara kampung").
    pub fn matches(&self, kind: SectionKind, heading: &str) -> bool {
        let heading = heading.trim().to_lowercase();
        self.for_kind(kind).iter().any(|kw| {
            let kw = kw.trim().to_lowercase();
            if kw.is_empty() {
                return false;
            }
            match kind {
                SectionKind::Instructions => heading.starts_with(&kw),
                SectionKind::Ingredients | SectionKind::Tips => heading.contains(&kw),
            }
        })
    }

    /// Which section a heading opens, first kind wins.
    pub fn classify(&self, heading: &str) -> Option<SectionKind> {
        SectionKind::ALL
            .into_iter()
            .find(|kind| self.matches(*kind, heading))
    }
}

/// How a heading looks: a block element, optionally carrying its text in a
/// label child (`<p><strong>Bahan-bahan</strong></p>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadingRule {
    pub block: Matcher,
    #[serde(default)]
    pub label: Option<Matcher>,
}

impl HeadingRule {
    /// Heading text of `node` under this rule, or `None` if it is not a heading.
    pub fn heading_text<N: DomNode>(&self, node: &N) -> Option<String> {
        if !self.block.matches(node) {
            return None;
        }
        let text = match &self.label {
            Some(label) => node.find(label)?.trimmed_text(),
            None => node.trimmed_text(),
        };
        (!text.is_empty()).then_some(text)
    }
}

/// Optional value slot inside a list item, per section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemSlots {
    #[serde(default)]
    pub ingredients: Option<Matcher>,
    #[serde(default)]
    pub instructions: Option<Matcher>,
    #[serde(default)]
    pub tips: Option<Matcher>,
}

impl ItemSlots {
    pub fn for_kind(&self, kind: SectionKind) -> Option<&Matcher> {
        match kind {
            SectionKind::Ingredients => self.ingredients.as_ref(),
            SectionKind::Instructions => self.instructions.as_ref(),
            SectionKind::Tips => self.tips.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarLabels {
    pub preparation_time: String,
    pub cooking_time: String,
    pub total_time: String,
    pub servings: String,
}

impl Default for ScalarLabels {
    fn default() -> Self {
        Self {
            preparation_time: "Masa Penyediaan".into(),
            cooking_time: "Masa Memasak".into(),
            total_time: "Jumlah Masa".into(),
            servings: "Hidangan".into(),
        }
    }
}

/// Label → value adjacency for the timing/servings cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarRule {
    pub label: Matcher,
    pub value: Matcher,
    #[serde(default)]
    pub labels: ScalarLabels,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionsShape {
    #[default]
    Flat,
    Sectioned,
}

/// How listing pages after the first are addressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum Pagination {
    /// `<base>?page=N`
    Query { param: String },
    /// `<base>/page/N/`
    Path,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRule {
    pub card: Matcher,
    pub title: Matcher,
    /// Element carrying "Halaman 1 / 10"-style page counts.
    #[serde(default)]
    pub page_label: Option<Matcher>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub hosts: Vec<String>,
    pub base_origin: String,
    /// Tried in order; the first match is the content region.
    pub content_region: Vec<Matcher>,
    /// Titled wrapper searched for anchors before the whole region.
    #[serde(default)]
    pub scope: Option<Matcher>,
    pub headings: Vec<HeadingRule>,
    #[serde(default)]
    pub keywords: Keywords,
    #[serde(default)]
    pub sub_heading: Option<Matcher>,
    #[serde(default)]
    pub section_container: Option<Matcher>,
    #[serde(default)]
    pub item_slots: ItemSlots,
    #[serde(default)]
    pub scalars: Option<ScalarRule>,
    pub images: Vec<Matcher>,
    pub title: Matcher,
    #[serde(default)]
    pub instructions_shape: InstructionsShape,
    #[serde(default)]
    pub numbered_fallback: bool,
    pub listing: ListingRule,
}

fn m(s: &'static str) -> Matcher {
    Matcher::parse(s).expect("valid builtin matcher")
}

/// WordPress/Avada template: bold paragraph headings followed by lists.
pub fn myresipi() -> SiteConfig {
    SiteConfig {
        name: "myresipi".into(),
        hosts: vec!["myresipi.com".into()],
        base_origin: "https://myresipi.com".into(),
        content_region: vec![m("div.fusion-content-tb")],
        scope: None,
        headings: vec![HeadingRule {
            block: m("p"),
            label: Some(m("strong")),
        }],
        keywords: Keywords::default(),
        sub_heading: None,
        section_container: None,
        item_slots: ItemSlots::default(),
        scalars: None,
        images: vec![m("img[srcset]"), m("img[src]")],
        title: m("h3"),
        instructions_shape: InstructionsShape::Flat,
        numbered_fallback: true,
        listing: ListingRule {
            card: m("article.fusion-post-grid"),
            title: m("h2.blog-shortcode-post-title"),
            page_label: None,
            pagination: Pagination::Path,
        },
    }
}

/// Tailwind card template: titled rounded cards with `h4` sub-headings.
pub fn resepichenom() -> SiteConfig {
    SiteConfig {
        name: "resepichenom".into(),
        hosts: vec!["resepichenom.com".into()],
        base_origin: "https://resepichenom.com".into(),
        content_region: vec![m("main"), m("body")],
        scope: None,
        headings: vec![
            HeadingRule {
                block: m("div.font-semibold"),
                label: None,
            },
            HeadingRule {
                block: m("div.text-2xl.font-bold"),
                label: None,
            },
        ],
        keywords: Keywords::default(),
        sub_heading: Some(m("h4.font-medium")),
        section_container: Some(m("div.rounded-xl")),
        item_slots: ItemSlots {
            ingredients: Some(m("span:last-child")),
            instructions: Some(m("span.flex-1")),
            tips: Some(m("span.text-gray-700")),
        },
        scalars: Some(ScalarRule {
            label: m("p"),
            value: m("p.font-semibold"),
            labels: ScalarLabels::default(),
        }),
        images: vec![m("img[alt]")],
        title: m("h1"),
        instructions_shape: InstructionsShape::Sectioned,
        numbered_fallback: false,
        listing: ListingRule {
            card: m("article"),
            title: m("h2"),
            page_label: Some(m("span.text-sm.text-gray-600")),
            pagination: Pagination::Query {
                param: "page".into(),
            },
        },
    }
}

impl SiteConfig {
    pub fn builtins() -> Vec<SiteConfig> {
        vec![myresipi(), resepichenom()]
    }

    pub fn builtin(name: &str) -> Option<SiteConfig> {
        Self::builtins()
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Built-in config whose host list covers the URL's host (`www.` ignored).
    pub fn for_url(url: &str) -> Result<SiteConfig> {
        let parsed = Url::parse(url).map_err(|_| ResepiError::InvalidUrl(url.into()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ResepiError::InvalidUrl(url.into()))?
            .to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
        Self::builtins()
            .into_iter()
            .find(|s| {
                s.hosts
                    .iter()
                    .any(|h| host == *h || host.ends_with(&format!(".{h}")))
            })
            .ok_or_else(|| ResepiError::UnknownSite(url.into()))
    }

    pub fn from_path(path: &Path) -> Result<SiteConfig> {
        let file = std::fs::File::open(path)?;
        let cfg: SiteConfig = serde_json::from_reader(file)?;
        Url::parse(&cfg.base_origin)
            .map_err(|_| ResepiError::InvalidUrl(cfg.base_origin.clone()))?;
        Ok(cfg)
    }

    /// Heading text of `node` under any of the site's heading rules.
    pub fn heading_text<N: DomNode>(&self, node: &N) -> Option<String> {
        self.headings.iter().find_map(|rule| rule.heading_text(node))
    }
}
