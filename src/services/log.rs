use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub url: Option<String>,
    pub event: String,
    pub details: Option<String>,
}

/// Append-only record of what each run did, one line per URL.
pub struct ActivityLogger {
    log_path: PathBuf,
}

impl ActivityLogger {
    /// Logger writing to `~/.resepi/activity.log`.
    pub fn new() -> Result<Self> {
        let user_dirs = directories::UserDirs::new().ok_or_else(|| {
            ResepiError::storage_error("initialization", "could not determine home directory")
        })?;
        Self::in_dir(&user_dirs.home_dir().join(".resepi"))
    }

    /// Logger writing to `activity.log` inside `dir`.
    pub fn in_dir(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            log_path: dir.join("activity.log"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    pub fn log(
        &self,
        level: LogLevel,
        url: Option<&str>,
        event: &str,
        details: Option<&str>,
    ) -> Result<()> {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            url: url.map(|u| u.to_string()),
            event: event.to_string(),
            details: details.map(|d| d.to_string()),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        let marker = match entry.level {
            LogLevel::Info => "🟢",
            LogLevel::Error => "🔴",
        };

        // Keep one entry per line.
        let details = entry.details.as_deref().unwrap_or("").replace('\n', " ");

        writeln!(
            file,
            "{} {} {} {} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            marker,
            entry.event,
            entry.url.as_deref().unwrap_or("*"),
            details
        )?;

        Ok(())
    }

    /// Matching lines, newest first.
    pub fn read_logs(&self, url_filter: Option<&str>, errors_only: bool) -> Result<Vec<String>> {
        if !self.log_path.exists() {
            return Ok(vec![]);
        }

        let reader = BufReader::new(fs::File::open(&self.log_path)?);
        let mut matching = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if errors_only && !line.contains("🔴") {
                continue;
            }
            if let Some(filter) = url_filter {
                if !line.contains(filter) {
                    continue;
                }
            }
            matching.push(line);
        }

        matching.reverse();
        Ok(matching)
    }

    pub fn info(&self, url: Option<&str>, event: &str, details: Option<&str>) -> Result<()> {
        self.log(LogLevel::Info, url, event, details)
    }

    pub fn error(&self, url: Option<&str>, event: &str, details: Option<&str>) -> Result<()> {
        self.log(LogLevel::Error, url, event, details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_filtered_and_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ActivityLogger::in_dir(dir.path()).unwrap();

        logger
            .info(Some("https://myresipi.com/a/"), "scraped", Some("5 ingredients"))
            .unwrap();
        logger
            .error(Some("https://myresipi.com/b/"), "failed", Some("timed out\nafter 3"))
            .unwrap();
        logger
            .info(Some("https://resepichenom.com/resepi/c"), "scraped", None)
            .unwrap();

        let all = logger.read_logs(None, false).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].contains("resepichenom.com/resepi/c"));

        let errors = logger.read_logs(None, true).unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("🔴 failed https://myresipi.com/b/ timed out after 3"));

        let mine = logger.read_logs(Some("myresipi.com"), false).unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine[0].contains("/b/"));
    }

    #[test]
    fn missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ActivityLogger::in_dir(&dir.path().join("nested")).unwrap();
        assert!(logger.read_logs(None, false).unwrap().is_empty());
    }
}
