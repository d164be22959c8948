use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub use crate::error::{ResepiError, Result};

/// The three heading-anchored blocks a recipe page is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Ingredients,
    Instructions,
    Tips,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [
        SectionKind::Ingredients,
        SectionKind::Instructions,
        SectionKind::Tips,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ingredients => "ingredients",
            Self::Instructions => "instructions",
            Self::Tips => "tips",
        }
    }
}

/// Ordered mapping of section label → lines.
///
/// Labels keep the order in which their headings appear on the page, and a
/// label never maps to an empty list. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections(Vec<(String, Vec<String>)>);

impl Sections {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append lines under `label`, merging into an existing bucket of the same
    /// label. Empty additions are ignored so no empty bucket is ever stored.
    pub fn extend_section(&mut self, label: &str, lines: Vec<String>) {
        if lines.is_empty() {
            return;
        }
        match self.0.iter_mut().find(|(l, _)| l == label) {
            Some((_, existing)) => existing.extend(lines),
            None => self.0.push((label.to_string(), lines)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, lines)| lines.as_slice())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(l, lines)| (l.as_str(), lines.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of lines across all sections.
    pub fn line_count(&self) -> usize {
        self.0.iter().map(|(_, lines)| lines.len()).sum()
    }

    /// All lines in document order, section labels dropped.
    pub fn flatten(self) -> Vec<String> {
        self.0.into_iter().flat_map(|(_, lines)| lines).collect()
    }
}

impl FromIterator<(String, Vec<String>)> for Sections {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut sections = Sections::new();
        for (label, lines) in iter {
            sections.extend_section(&label, lines);
        }
        sections
    }
}

impl Serialize for Sections {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, lines) in &self.0 {
            map.serialize_entry(label, lines)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Sections {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SectionsVisitor;

        impl<'de> Visitor<'de> for SectionsVisitor {
            type Value = Sections;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of section label to list of lines")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Sections, A::Error> {
                let mut sections = Sections::new();
                while let Some((label, lines)) = access.next_entry::<String, Vec<String>>()? {
                    sections.extend_section(&label, lines);
                }
                Ok(sections)
            }
        }

        deserializer.deserialize_map(SectionsVisitor)
    }
}

/// Instruction steps: one flat ordered list, or sub-headed groups of steps
/// depending on the site template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instructions {
    Flat(Vec<String>),
    Sectioned(Sections),
}

impl Default for Instructions {
    fn default() -> Self {
        Instructions::Flat(Vec::new())
    }
}

impl Instructions {
    pub fn step_count(&self) -> usize {
        match self {
            Instructions::Flat(steps) => steps.len(),
            Instructions::Sectioned(sections) => sections.line_count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.step_count() == 0
    }
}

/// Everything extracted from one recipe detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub preparation_time: Option<String>,
    #[serde(default)]
    pub cooking_time: Option<String>,
    #[serde(default)]
    pub total_time: Option<String>,
    #[serde(default)]
    pub servings: Option<String>,
    #[serde(default)]
    pub ingredients: Sections,
    #[serde(default)]
    pub instructions: Instructions,
    #[serde(default)]
    pub tips_and_guides: Vec<String>,
    /// Short ingredient names added by an enrichment pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_ingredients: Option<Vec<String>>,
}

/// One recipe as persisted: discovery fields plus the extracted details.
///
/// A record whose extraction failed keeps its place in the output with
/// `details` serialized as `{}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    pub recipe_url: String,
    #[serde(default, with = "empty_details")]
    pub details: Option<RecipeDetails>,
}

impl RecipeRecord {
    /// Skeleton record for a URL whose details have not been extracted yet.
    pub fn skeleton(recipe_url: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            page_url: None,
            recipe_url: recipe_url.into(),
            details: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.trim().to_string();
        self
    }

    pub fn with_page_url(mut self, page_url: &str) -> Self {
        self.page_url = Some(page_url.to_string());
        self
    }

    pub fn has_details(&self) -> bool {
        self.details.is_some()
    }
}

/// `None` ⇔ `{}` on the wire.
mod empty_details {
    use super::RecipeDetails;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        details: &Option<RecipeDetails>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match details {
            Some(d) => d.serialize(serializer),
            None => serde_json::Map::new().serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<RecipeDetails>, D::Error> {
        let raw = Option::<serde_json::Map<String, serde_json::Value>>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(map) if map.is_empty() => Ok(None),
            Some(map) => serde_json::from_value(serde_json::Value::Object(map))
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}
impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sections_keep_heading_order_and_drop_empty() {
        let mut sections = Sections::new();
        sections.extend_section("Bahan Kuah", vec!["air".into()]);
        sections.extend_section("Kosong", vec![]);
        sections.extend_section("Bahan-bahan", vec!["ayam".into()]);
        sections.extend_section("Bahan Kuah", vec!["garam".into()]);

        let labels: Vec<&str> = sections.labels().collect();
        assert_eq!(labels, vec!["Bahan Kuah", "Bahan-bahan"]);
        assert_eq!(
            sections.get("Bahan Kuah").unwrap(),
            &["air".to_string(), "garam".to_string()]
        );

        let text = serde_json::to_string(&sections).unwrap();
        assert_eq!(text, r#"{"Bahan Kuah":["air","garam"],"Bahan-bahan":["ayam"]}"#);
    }

    #[test]
    fn sections_deserialize_in_document_order() {
        let sections: Sections =
            serde_json::from_str(r#"{"Zed":["1"],"Alpha":["2"],"Mid":["3"]}"#).unwrap();
        let labels: Vec<&str> = sections.labels().collect();
        assert_eq!(labels, vec!["Zed", "Alpha", "Mid"]);
    }

    #[test]
    fn instructions_serialize_as_array_or_object() {
        let flat = Instructions::Flat(vec!["Panaskan minyak".into()]);
        assert_eq!(serde_json::to_value(&flat).unwrap(), json!(["Panaskan minyak"]));

        let sectioned = Instructions::Sectioned(
            vec![("Sos".to_string(), vec!["Kacau".to_string()])]
                .into_iter()
                .collect(),
        );
        assert_eq!(
            serde_json::to_value(&sectioned).unwrap(),
            json!({"Sos": ["Kacau"]})
        );

        let back: Instructions = serde_json::from_value(json!({"Sos": ["Kacau"]})).unwrap();
        assert_eq!(back, sectioned);
    }

    #[test]
    fn failed_record_serializes_empty_details() {
        let record = RecipeRecord::skeleton("https://myresipi.com/ayam-masak-merah/");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"recipe_url": "https://myresipi.com/ayam-masak-merah/", "details": {}})
        );

        let back: RecipeRecord = serde_json::from_value(value).unwrap();
        assert!(back.details.is_none());
    }

    #[test]
    fn extracted_record_keeps_null_scalars() {
        let mut record = RecipeRecord::skeleton("https://resepichenom.com/resepi/nasi-lemak")
            .with_title("  Nasi Lemak ")
            .with_page_url("https://resepichenom.com/kategori/sarapan?page=1");
        record.details = Some(RecipeDetails::default());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["title"], json!("Nasi Lemak"));
        assert_eq!(value["details"]["servings"], json!(null));
        assert_eq!(value["details"]["tips_and_guides"], json!([]));
        assert!(value["details"].get("main_ingredients").is_none());
    }
}
