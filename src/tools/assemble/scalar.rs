use crate::site::ScalarRule;
use crate::tools::clean::clean_line;
use crate::tools::dom::DomNode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scalars {
    pub preparation_time: Option<String>,
    pub cooking_time: Option<String>,
    pub total_time: Option<String>,
    pub servings: Option<String>,
}

/// Value shown next to the label node whose text is exactly `label`.
///
/// The value slot is looked up inside the label, then among its following
/// siblings, then anywhere under its parent.
pub fn scalar_value<N: DomNode>(region: &N, rule: &ScalarRule, label: &str) -> Option<String> {
    let label_node = region
        .find_all(&rule.label)
        .into_iter()
        .find(|n| clean_line(&n.text()) == label)?;

    let inside = label_node.find(&rule.value);
    let siblings = label_node
        .following_siblings()
        .filter(|n| rule.value.matches(n));
    let under_parent = label_node
        .parent()
        .map(|p| p.find_all(&rule.value))
        .unwrap_or_default();

    inside
        .into_iter()
        .chain(siblings)
        .chain(under_parent)
        .map(|n| clean_line(&n.text()))
        .find(|text| !text.is_empty() && text != label)
}

pub fn read_scalars<N: DomNode>(region: &N, rule: &ScalarRule) -> Scalars {
    let labels = &rule.labels;
    Scalars {
        preparation_time: scalar_value(region, rule, &labels.preparation_time),
        cooking_time: scalar_value(region, rule, &labels.cooking_time),
        total_time: scalar_value(region, rule, &labels.total_time),
        servings: scalar_value(region, rule, &labels.servings),
    }
}
