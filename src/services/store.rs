use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::types::*;

/// Where records end up between runs.
pub trait RecordStore {
    /// Write `records` to a new `recipes_<timestamp>.json` file.
    fn save(&self, records: &[RecipeRecord]) -> Result<PathBuf>;
    /// Write `records` to `name`, replacing it.
    fn save_as(&self, name: &str, records: &[RecipeRecord]) -> Result<PathBuf>;
    /// Add `records` to the array already stored under `name`.
    fn append(&self, name: &str, records: &[RecipeRecord]) -> Result<PathBuf>;
    fn load(&self, name: &str) -> Result<Vec<RecipeRecord>>;
}

/// JSON files in one directory, 4-space indented, UTF-8 kept as is.
pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// `<prefix>_YYYYmmdd_HHMMSS.json`
pub fn timestamped_name(prefix: &str, at: DateTime<Local>) -> String {
    format!("{prefix}_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// `recipe_titles_<category>_<count>.json`
pub fn category_file_name(category: &str, count: usize) -> String {
    format!("recipe_titles_{category}_{count}.json")
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    fs::write(path, buf)
        .map_err(|e| ResepiError::storage_error("write", format!("{}: {e}", path.display())))
}

/// Existing array stored at `path`, tolerant of damage: a single object is
/// wrapped, anything that does not decode (bad UTF-8 included) starts a fresh
/// array. Read failures other than a missing file are returned.
fn read_existing(path: &Path) -> Result<Vec<Value>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ResepiError::storage_error(
                "read",
                format!("{}: {e}", path.display()),
            ))
        }
    };
    let items = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Object(obj)) => vec![Value::Object(obj)],
        Ok(_) => {
            warn!(path = %path.display(), "stored value is not a list, starting fresh");
            Vec::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "invalid JSON, starting fresh");
            Vec::new()
        }
    };
    Ok(items)
}

impl RecordStore for LocalFsStore {
    fn save(&self, records: &[RecipeRecord]) -> Result<PathBuf> {
        self.save_as(&timestamped_name("recipes", Local::now()), records)
    }

    fn save_as(&self, name: &str, records: &[RecipeRecord]) -> Result<PathBuf> {
        let path = self.path_for(name);
        write_pretty(&path, records)?;
        Ok(path)
    }

    fn append(&self, name: &str, records: &[RecipeRecord]) -> Result<PathBuf> {
        let path = self.path_for(name);
        let mut items = read_existing(&path)?;
        for record in records {
            items.push(serde_json::to_value(record)?);
        }
        write_pretty(&path, &items)?;
        Ok(path)
    }

    fn load(&self, name: &str) -> Result<Vec<RecipeRecord>> {
        load_records(&self.path_for(name))
    }
}

pub fn load_records(path: &Path) -> Result<Vec<RecipeRecord>> {
    let text = fs::read_to_string(path)
        .map_err(|e| ResepiError::storage_error("read", format!("{}: {e}", path.display())))?;
    Ok(serde_json::from_str(&text)?)
}

/// Detail-page URLs listed in a JSON array of records or plain strings, in
/// file order. Entries without a URL are skipped.
pub fn load_urls(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .map_err(|e| ResepiError::storage_error("read", format!("{}: {e}", path.display())))?;
    let items: Vec<Value> = serde_json::from_str(&text)?;
    let urls: Vec<String> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(url) => Some(url),
            Value::Object(obj) => obj
                .get("recipe_url")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .filter(|url| !url.trim().is_empty())
        .collect();
    if urls.is_empty() {
        return Err(ResepiError::EmptyInput(path.display().to_string()));
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(url: &str) -> RecipeRecord {
        RecipeRecord::skeleton(url).with_title("Kek Batik")
    }

    #[test]
    fn file_names() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(timestamped_name("recipes", at), "recipes_20240309_070501.json");
        assert_eq!(category_file_name("ayam", 42), "recipe_titles_ayam_42.json");
    }

    #[test]
    fn saves_with_four_space_indent_and_raw_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path()).unwrap();
        let mut r = record("https://myresipi.com/kek-batik/");
        r.title = "Kek Batik – Milo".into();
        let path = store.save_as("out.json", &[r]).unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("[\n    {\n        \"title\""));
        assert!(text.contains("Kek Batik – Milo"));
        assert!(text.contains("\"details\": {}"));
    }

    #[test]
    fn timestamped_save_lands_in_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path()).unwrap();
        let path = store.save(&[record("https://myresipi.com/a/")]).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("recipes_") && name.ends_with(".json"));
        assert_eq!(store.load(&name).unwrap().len(), 1);
    }

    #[test]
    fn append_recovers_from_damaged_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path()).unwrap();

        store.append("one.json", &[record("https://myresipi.com/a/")]).unwrap();
        store.append("one.json", &[record("https://myresipi.com/b/")]).unwrap();
        let urls: Vec<String> = store
            .load("one.json")
            .unwrap()
            .into_iter()
            .map(|r| r.recipe_url)
            .collect();
        assert_eq!(urls, vec!["https://myresipi.com/a/", "https://myresipi.com/b/"]);

        fs::write(dir.path().join("obj.json"), r#"{"recipe_url": "https://myresipi.com/x/", "details": {}}"#).unwrap();
        store.append("obj.json", &[record("https://myresipi.com/y/")]).unwrap();
        assert_eq!(store.load("obj.json").unwrap().len(), 2);

        fs::write(dir.path().join("bad.json"), "[{oops").unwrap();
        store.append("bad.json", &[record("https://myresipi.com/z/")]).unwrap();
        assert_eq!(store.load("bad.json").unwrap().len(), 1);
    }

    #[test]
    fn append_discards_undecodable_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path()).unwrap();
        let path = dir.path().join("latin1.json");
        fs::write(&path, b"[{\"title\": \"Caf\xe9\", \"recipe_url\": \"https://myresipi.com/old/\"}]").unwrap();

        store.append("latin1.json", &[record("https://myresipi.com/new/")]).unwrap();
        let urls: Vec<String> = store
            .load("latin1.json")
            .unwrap()
            .into_iter()
            .map(|r| r.recipe_url)
            .collect();
        assert_eq!(urls, vec!["https://myresipi.com/new/"]);
    }

    #[test]
    fn append_fails_when_target_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path()).unwrap();
        fs::create_dir(dir.path().join("folder.json")).unwrap();
        assert!(store
            .append("folder.json", &[record("https://myresipi.com/a/")])
            .is_err());
    }

    fn two_section_record(url: &str) -> RecipeRecord {
        let mut details = RecipeDetails::default();
        details
            .ingredients
            .extend_section("Bahan Utama", vec!["1 ekor ayam".into()]);
        details
            .ingredients
            .extend_section("Bahan Kisar", vec!["5 ulas bawang merah".into()]);
        let mut r = record(url);
        r.details = Some(details);
        r
    }

    fn labels_of(r: &RecipeRecord) -> Vec<String> {
        r.details
            .as_ref()
            .unwrap()
            .ingredients
            .labels()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn section_order_survives_save_load_and_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path()).unwrap();
        let expected = vec!["Bahan Utama".to_string(), "Bahan Kisar".to_string()];

        store
            .save_as("saved.json", &[two_section_record("https://myresipi.com/a/")])
            .unwrap();
        let loaded = store.load("saved.json").unwrap();
        assert_eq!(labels_of(&loaded[0]), expected);

        store
            .append("saved.json", &[two_section_record("https://myresipi.com/b/")])
            .unwrap();
        let loaded = store.load("saved.json").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(labels_of(&loaded[0]), expected);
        assert_eq!(labels_of(&loaded[1]), expected);

        let text = fs::read_to_string(dir.path().join("saved.json")).unwrap();
        assert!(text.find("Bahan Utama").unwrap() < text.find("Bahan Kisar").unwrap());
        assert!(text.find("\"title\"").unwrap() < text.find("\"recipe_url\"").unwrap());
        assert!(text.find("\"title\": null").unwrap() < text.find("\"image_url\"").unwrap());
    }

    #[test]
    fn urls_from_records_or_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.json");
        fs::write(
            &path,
            r#"[
                {"title": "A", "recipe_url": "https://myresipi.com/a/", "details": {}},
                "https://myresipi.com/b/",
                {"title": "tiada"},
                42
            ]"#,
        )
        .unwrap();
        assert_eq!(
            load_urls(&path).unwrap(),
            vec!["https://myresipi.com/a/", "https://myresipi.com/b/"]
        );

        fs::write(&path, "[]").unwrap();
        assert!(matches!(load_urls(&path), Err(ResepiError::EmptyInput(_))));
        assert!(load_urls(&dir.path().join("missing.json")).is_err());
    }
}
