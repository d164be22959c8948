//! Data Audit
//!
//! Quality checks for the short `main_ingredients` names attached to records
//! before they are indexed.

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

use crate::types::*;

const MAX_LINE_CHARS: usize = 50;
const ALLOWED_PUNCTUATION: &str = " -/(),.&";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum LineIssue {
    Empty,
    Newline,
    TooLong { chars: usize },
    LeadingWhitespace,
    TrailingWhitespace,
    UnexpectedChars { chars: Vec<char> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineReport {
    /// 1-based position in the list.
    pub position: usize,
    pub line: String,
    pub issues: Vec<LineIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinesAudit {
    pub lines: Vec<LineReport>,
    /// Values that occur more than once, in first-seen order.
    pub duplicates: Vec<String>,
}

impl LinesAudit {
    pub fn is_clean(&self) -> bool {
        self.lines.is_empty() && self.duplicates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordAudit {
    pub title: String,
    pub recipe_url: String,
    pub missing: bool,
    #[serde(flatten)]
    pub lines: LinesAudit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAudit {
    pub file: String,
    pub records: usize,
    pub problems: Vec<RecordAudit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn line_issues(line: &str) -> Vec<LineIssue> {
    let mut issues = Vec::new();
    if line.is_empty() {
        issues.push(LineIssue::Empty);
    }
    if line.contains('\n') {
        issues.push(LineIssue::Newline);
    }
    let chars = line.chars().count();
    if chars > MAX_LINE_CHARS {
        issues.push(LineIssue::TooLong { chars });
    }
    if line.starts_with([' ', '\t']) {
        issues.push(LineIssue::LeadingWhitespace);
    }
    if line.ends_with([' ', '\t']) {
        issues.push(LineIssue::TrailingWhitespace);
    }
    let odd: Vec<char> = line
        .chars()
        .filter(|c| !c.is_alphanumeric() && !ALLOWED_PUNCTUATION.contains(*c))
        .collect();
    if !odd.is_empty() {
        issues.push(LineIssue::UnexpectedChars { chars: odd });
    }
    issues
}

pub fn audit_lines(lines: &[String]) -> LinesAudit {
    let reports = lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            let issues = line_issues(line);
            (!issues.is_empty()).then(|| LineReport {
                position: i + 1,
                line: line.clone(),
                issues,
            })
        })
        .collect();

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for line in lines {
        if !seen.insert(line.as_str()) && !duplicates.contains(line) {
            duplicates.push(line.clone());
        }
    }

    LinesAudit {
        lines: reports,
        duplicates,
    }
}

/// Records whose `main_ingredients` are missing or have issues.
pub fn audit_records(records: &[RecipeRecord]) -> Vec<RecordAudit> {
    records
        .iter()
        .filter_map(|record| {
            let main = record
                .details
                .as_ref()
                .and_then(|d| d.main_ingredients.as_ref());
            let (missing, lines) = match main {
                Some(main) => (false, audit_lines(main)),
                None => (true, LinesAudit::default()),
            };
            (missing || !lines.is_clean()).then(|| RecordAudit {
                title: record.title.clone(),
                recipe_url: record.recipe_url.clone(),
                missing,
                lines,
            })
        })
        .collect()
}

/// Audit every `.json` file in `dir`, in file-name order.
///
/// A file that does not decode as a record array is reported, not fatal.
pub fn audit_dir(dir: &Path) -> Result<Vec<FileAudit>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let audits = paths
        .into_iter()
        .map(|path| {
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let decoded = std::fs::read_to_string(&path)
                .map_err(ResepiError::from)
                .and_then(|text| Ok(serde_json::from_str::<Vec<RecipeRecord>>(&text)?));
            match decoded {
                Ok(records) => FileAudit {
                    file,
                    records: records.len(),
                    problems: audit_records(&records),
                    error: None,
                },
                Err(e) => FileAudit {
                    file,
                    records: 0,
                    problems: Vec::new(),
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();
    Ok(audits)
}
