use url::Url;

use crate::site::SiteConfig;
use crate::tools::dom::DomNode;

/// Last candidate URL of a responsive `srcset` list.
///
/// Sites list their widths in ascending order, so the last entry is taken as
/// the highest resolution without looking at the descriptors.
pub fn pick_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .last()
        .and_then(|c| c.split_whitespace().next())
}

/// Absolute image URL from an element's `srcset`/`src` pair.
///
/// `srcset` wins when it has a candidate. Relative URLs are joined onto
/// `base`; inline `data:` placeholders count as no image.
pub fn resolve_image_url(srcset: Option<&str>, src: Option<&str>, base: &str) -> Option<String> {
    let raw = srcset
        .and_then(pick_srcset_candidate)
        .or_else(|| src.map(str::trim).filter(|s| !s.is_empty()))?;
    if raw.starts_with("data:") {
        return None;
    }
    match Url::parse(raw) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Url::parse(base).ok()?.join(raw).ok().map(|u| u.to_string()),
    }
}

/// First image in `region` that resolves, trying the site's image matchers in order.
pub fn find_image<N: DomNode>(region: &N, site: &SiteConfig) -> Option<String> {
    site.images.iter().find_map(|matcher| {
        region.find_all(matcher).into_iter().find_map(|img| {
            resolve_image_url(img.attr("srcset"), img.attr("src"), &site.base_origin)
        })
    })
}
