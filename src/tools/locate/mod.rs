//! Section Locator

use crate::site::SiteConfig;
use crate::tools::dom::DomNode;
use crate::types::SectionKind;

/// Heading node that opens a section, with its verbatim heading text.
#[derive(Debug, Clone)]
pub struct Anchor<N> {
    pub node: N,
    pub label: String,
    pub kind: SectionKind,
}

/// Content region of a page: the first configured region matcher that hits,
/// tried in order. `None` means the page is not a recipe page for this site.
pub fn content_region<N: DomNode>(root: &N, site: &SiteConfig) -> Option<N> {
    site.content_region.iter().find_map(|matcher| {
        if matcher.matches(root) {
            Some(root.clone())
        } else {
            root.find(matcher)
        }
    })
}

/// First heading in document order that opens a `kind` section.
///
/// When the site declares a scope container and the region has one, it is
/// searched first; the whole region is the fallback.
pub fn locate<N: DomNode>(region: &N, kind: SectionKind, site: &SiteConfig) -> Option<Anchor<N>> {
    let scoped = site.scope.as_ref().and_then(|scope| {
        let container = if scope.matches(region) {
            Some(region.clone())
        } else {
            region.find(scope)
        };
        container.and_then(|c| scan(&c, kind, site))
    });
    scoped.or_else(|| scan(region, kind, site))
}

// An instructions heading that mentions "bahan" never opens ingredients.
fn scan<N: DomNode>(root: &N, kind: SectionKind, site: &SiteConfig) -> Option<Anchor<N>> {
    let kw = &site.keywords;
    root.descendants().into_iter().find_map(|node| {
        let label = site.heading_text(&node)?;
        let opens = kw.matches(kind, &label)
            && !(kind == SectionKind::Ingredients && kw.matches(SectionKind::Instructions, &label));
        opens.then(|| Anchor {
            node,
            label,
            kind,
        })
    })
}

/// Whether `heading` closes a `kind` section that is being harvested.
///
/// A heading of another section ends it unless it also reads as `kind`; an
/// instructions heading always ends an ingredients block.
pub fn ends_section(kind: SectionKind, heading: &str, site: &SiteConfig) -> bool {
    let kw = &site.keywords;
    let other = SectionKind::ALL
        .into_iter()
        .filter(|k| *k != kind)
        .any(|k| kw.matches(k, heading));
    if !other {
        return false;
    }
    !kw.matches(kind, heading)
        || (kind == SectionKind::Ingredients && kw.matches(SectionKind::Instructions, heading))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{myresipi, resepichenom};
    use crate::tools::dom::{parse_document, Matcher};

    const FUSION: &str = r#"
        <div class="fusion-content-tb">
            <h3>Ayam Masak Merah</h3>
            <p>Resepi turun-temurun.</p>
            <p><strong>Bahan-bahan</strong></p>
            <ul><li>1 ekor ayam</li></ul>
            <p><strong>Cara Memasak</strong></p>
            <ol><li>Goreng ayam</li></ol>
        </div>"#;

    #[test]
    fn finds_first_heading_per_kind() {
        let site = myresipi();
        let doc = parse_document(FUSION);
        let region = content_region(&doc.root_element(), &site).unwrap();

        let ing = locate(&region, SectionKind::Ingredients, &site).unwrap();
        assert_eq!(ing.label, "Bahan-bahan");
        assert_eq!(ing.node.tag_name(), "p");

        let ins = locate(&region, SectionKind::Instructions, &site).unwrap();
        assert_eq!(ins.label, "Cara Memasak");

        assert!(locate(&region, SectionKind::Tips, &site).is_none());
    }

    #[test]
    fn missing_region_is_none() {
        let site = myresipi();
        let doc = parse_document("<div class='post'><p><strong>Bahan</strong></p></div>");
        assert!(content_region(&doc.root_element(), &site).is_none());
    }

    #[test]
    fn card_headings_use_block_text() {
        let site = resepichenom();
        let doc = parse_document(
            r#"<main>
                 <div class="rounded-xl"><div class="text-lg font-semibold">Bahan-bahan</div></div>
                 <div class="rounded-xl"><div class="font-semibold">Cara Memasak</div></div>
                 <div class="rounded-xl"><div class="text-2xl font-bold">Petua &amp; Panduan</div></div>
               </main>"#,
        );
        let region = content_region(&doc.root_element(), &site).unwrap();
        assert_eq!(region.tag_name(), "main");

        let tips = locate(&region, SectionKind::Tips, &site).unwrap();
        assert_eq!(tips.label, "Petua & Panduan");
        let ins = locate(&region, SectionKind::Instructions, &site).unwrap();
        assert_eq!(ins.label, "Cara Memasak");
    }

    #[test]
    fn scope_container_is_searched_first() {
        let mut site = myresipi();
        site.content_region = vec![Matcher::parse("body").unwrap()];
        site.scope = Some(Matcher::parse("div.recipe-box").unwrap());

        let doc = parse_document(
            r#"<body>
                 <p><strong>Bahan promosi</strong></p>
                 <div class="recipe-box"><p><strong>Bahan Utama</strong></p></div>
               </body>"#,
        );
        let region = content_region(&doc.root_element(), &site).unwrap();
        let anchor = locate(&region, SectionKind::Ingredients, &site).unwrap();
        assert_eq!(anchor.label, "Bahan Utama");

        // Scope present but without a match: whole region is scanned.
        let anchor = locate(&region, SectionKind::Ingredients, &{
            let mut s = site.clone();
            s.keywords.ingredients = vec!["promosi".into()];
            s
        })
        .unwrap();
        assert_eq!(anchor.label, "Bahan promosi");
    }

    #[test]
    fn instructions_heading_never_anchors_ingredients() {
        let site = myresipi();
        let doc = parse_document(
            r#"<div class="fusion-content-tb">
                 <p><strong>Cara sediakan bahan</strong></p>
                 <ol><li>Potong ayam</li></ol>
               </div>"#,
        );
        let region = content_region(&doc.root_element(), &site).unwrap();
        assert!(locate(&region, SectionKind::Ingredients, &site).is_none());
        let ins = locate(&region, SectionKind::Instructions, &site).unwrap();
        assert_eq!(ins.label, "Cara sediakan bahan");

        let doc = parse_document(
            r#"<div class="fusion-content-tb">
                 <p><strong>Cara sediakan bahan</strong></p>
                 <ol><li>Potong ayam</li></ol>
                 <p><strong>Bahan Sos</strong></p>
                 <ul><li>kicap</li></ul>
               </div>"#,
        );
        let region = content_region(&doc.root_element(), &site).unwrap();
        let ing = locate(&region, SectionKind::Ingredients, &site).unwrap();
        assert_eq!(ing.label, "Bahan Sos");
    }

    #[test]
    fn section_terminators() {
        let site = myresipi();
        assert!(ends_section(SectionKind::Ingredients, "Cara Memasak", &site));
        assert!(ends_section(SectionKind::Ingredients, "Cara sediakan bahan", &site));
        assert!(!ends_section(SectionKind::Ingredients, "Bahan Kuah", &site));
        assert!(!ends_section(SectionKind::Ingredients, "Untuk hiasan", &site));
        assert!(ends_section(SectionKind::Instructions, "Petua", &site));
        assert!(!ends_section(SectionKind::Tips, "Petua memilih bahan", &site));
    }
}
