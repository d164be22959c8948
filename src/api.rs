use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;

use crate::engine::*;
use crate::services::log::ActivityLogger;
use crate::services::store::{load_records, load_urls, RecordStore};
use crate::tools::audit::{audit_dir, FileAudit};
use crate::tools::fetch::{FetchConfig, HttpFetcher, PageFetcher};
use crate::tools::index::{Embedder, IngredientIndex, SearchHit};
use crate::types::*;

// Logging helpers; a missing or unwritable log never breaks the operation.
fn log_info(url: Option<&str>, event: &str, details: Option<&str>) {
    if let Ok(logger) = ActivityLogger::new() {
        let _ = logger.info(url, event, details);
    }
}

fn log_error(url: Option<&str>, event: &str, details: Option<&str>) {
    if let Ok(logger) = ActivityLogger::new() {
        let _ = logger.error(url, event, details);
    }
}

/* ------------ public facade components ------------ */

pub struct Components {
    pub fetcher: Box<dyn PageFetcher>,
    pub opts: EngineOptions,
    /// Per-URL lines go to the activity log when set.
    pub activity: Option<ActivityLogger>,
}

impl Components {
    /// Real HTTP fetcher and the user's activity log.
    pub fn http(config: FetchConfig, opts: EngineOptions) -> Result<Self> {
        let fetcher = HttpFetcher::new(config)?;
        Ok(Self {
            fetcher: Box::new(fetcher),
            opts,
            activity: ActivityLogger::new().ok(),
        })
    }
}

pub fn make_engine<'a, S: RecordStore>(store: &'a S, components: &'a Components) -> Engine<'a, S> {
    Engine::new(
        &*components.fetcher,
        store,
        components.activity.as_ref(),
        components.opts.clone(),
    )
}

/* ------------ runs ------------ */

/// Crawl each category listing in turn. A category whose listing cannot be
/// read is reported with a zero-count summary; the others still run.
pub async fn crawl<S: RecordStore>(
    store: &S,
    listing_urls: &[String],
    components: &Components,
) -> Result<Vec<RunReport>> {
    if listing_urls.is_empty() {
        return Err(ResepiError::EmptyInput("no category URLs given".into()));
    }
    let engine = make_engine(store, components);
    let mut reports = Vec::with_capacity(listing_urls.len());
    for url in listing_urls {
        let report = match engine.crawl_category(url).await {
            Ok(report) => report,
            Err(e) => RunReport::failed(format!("{url}: {e}")),
        };
        reports.push(report);
    }
    Ok(reports)
}

/// Scrape every `recipe_url` listed in `input`.
///
/// An unreadable or empty input file is reported as a zero-count run.
pub async fn details<S: RecordStore>(
    store: &S,
    input: &Path,
    components: &Components,
) -> Result<RunReport> {
    let start_time = Instant::now();
    let source = input.display().to_string();
    let report = match load_urls(input) {
        Ok(urls) => {
            let records = urls.into_iter().map(RecipeRecord::skeleton).collect();
            make_engine(store, components).scrape_details(records).await?
        }
        Err(e) => RunReport::failed(format!("{source}: {e}")),
    };
    let details = format!(
        "{source}: {} in {}ms",
        summary_line(&report.summary),
        start_time.elapsed().as_millis()
    );
    match &report.error {
        Some(err) => {
            warn!(input = %source, error = %err, "{}", summary_line(&report.summary));
            log_error(None, "details", Some(&details));
        }
        None => log_info(None, "details", Some(&details)),
    }
    Ok(report)
}

/// Scrape one recipe, optionally appending it to an existing file.
pub async fn recipe<S: RecordStore>(
    store: &S,
    url: &str,
    append_to: Option<&str>,
    components: &Components,
) -> Result<RunReport> {
    make_engine(store, components).scrape_recipe(url, append_to).await
}

/* ------------ data tools ------------ */

pub fn audit(dir: &Path) -> Result<Vec<FileAudit>> {
    audit_dir(dir)
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub file: PathBuf,
    pub model: String,
    pub records: usize,
    pub entries: usize,
}

/// Embed the records of every input file into one index at `out`.
pub async fn build_index<E: Embedder + ?Sized>(
    inputs: &[PathBuf],
    out: &Path,
    model: &str,
    embedder: &E,
) -> Result<IndexStats> {
    let mut records = Vec::new();
    for path in inputs {
        records.extend(load_records(path)?);
    }
    if records.is_empty() {
        return Err(ResepiError::EmptyInput("no records to index".into()));
    }

    let index = IngredientIndex::build(embedder, model, &records).await?;
    index.save(out)?;
    log_info(
        None,
        "index",
        Some(&format!("{} entries -> {}", index.len(), out.display())),
    );
    Ok(IndexStats {
        file: out.to_path_buf(),
        model: index.model.clone(),
        records: records.len(),
        entries: index.len(),
    })
}

pub async fn search<E: Embedder + ?Sized>(
    index_path: &Path,
    query: &str,
    limit: usize,
    threshold: f32,
    embedder: &E,
) -> Result<Vec<SearchHit>> {
    let index = IngredientIndex::load(index_path)?;
    Ok(index.search_text(embedder, query, limit, threshold).await?)
}

/// Activity log lines, newest first.
pub fn logs(url_filter: Option<&str>, errors_only: bool) -> Result<Vec<String>> {
    ActivityLogger::new()?.read_logs(url_filter, errors_only)
}
