//! Recipe Document Assembler

mod image;
mod scalar;
mod tests;

pub use image::*;
pub use scalar::*;

use thiserror::Error;

use crate::site::SiteConfig;
use crate::tools::clean::clean_line;
use crate::tools::dom::{parse_document, DomNode};
use crate::tools::harvest::{harvest_ingredients, harvest_instructions, harvest_tips};
use crate::tools::locate::content_region;
use crate::types::RecipeDetails;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    /// The page has no content region: not a recipe page, or the template changed.
    #[error("no content region for site {site}")]
    ContentMissing { site: String },
}

/// Build the `details` object for one page.
///
/// Every sub-extraction degrades on its own: missing title, image, scalars or
/// sections leave that field null or empty.
pub fn assemble<N: DomNode>(root: &N, site: &SiteConfig) -> Result<RecipeDetails, AssembleError> {
    let region = content_region(root, site).ok_or_else(|| AssembleError::ContentMissing {
        site: site.name.clone(),
    })?;

    let title = region
        .find(&site.title)
        .or_else(|| root.find(&site.title))
        .map(|n| clean_line(&n.text()))
        .filter(|t| !t.is_empty());

    let scalars = site
        .scalars
        .as_ref()
        .map(|rule| read_scalars(&region, rule))
        .unwrap_or_default();

    Ok(RecipeDetails {
        title,
        image_url: find_image(&region, site),
        preparation_time: scalars.preparation_time,
        cooking_time: scalars.cooking_time,
        total_time: scalars.total_time,
        servings: scalars.servings,
        ingredients: harvest_ingredients(&region, site),
        instructions: harvest_instructions(&region, site),
        tips_and_guides: harvest_tips(&region, site),
        main_ingredients: None,
    })
}

/// Parse `html` and assemble it.
pub fn assemble_html(html: &str, site: &SiteConfig) -> Result<RecipeDetails, AssembleError> {
    let doc = parse_document(html);
    assemble(&doc.root_element(), site)
}
