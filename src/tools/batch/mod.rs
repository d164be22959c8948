//! Batch Tools
//!
//! One worker, one URL at a time. The builder owns everything gathered so far
//! and hands it back at the end; callers that want partial results on disk do
//! so from the per-record callback.


use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::site::SiteConfig;
use crate::tools::assemble::assemble_html;
use crate::tools::fetch::PageFetcher;
use crate::tools::retry::RetryPolicy;
use crate::types::RecipeRecord;

/// Records of one run, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchBuilder {
    records: Vec<RecipeRecord>,
    succeeded: usize,
    started: Option<Instant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            succeeded: 0,
            started: Some(Instant::now()),
        }
    }

    pub fn push(&mut self, record: RecipeRecord) {
        if record.has_details() {
            self.succeeded += 1;
        }
        self.records.push(record);
    }

    pub fn records(&self) -> &[RecipeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.records.len(),
            succeeded: self.succeeded,
            failed: self.records.len() - self.succeeded,
            elapsed_ms: self
                .started
                .map(|s| s.elapsed().as_millis() as u64)
                .unwrap_or(0),
        }
    }

    pub fn finish(self) -> Vec<RecipeRecord> {
        self.records
    }
}

/// Knobs for a detail pass.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub retry: RetryPolicy,
    /// Pause between URLs; none after the last.
    pub think_time: Duration,
    /// Site used for every URL. When unset, each URL picks a built-in site
    /// by host.
    pub site: Option<SiteConfig>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            think_time: Duration::from_millis(500),
            site: None,
        }
    }
}

/// Fetch and extract one record in place.
///
/// Never fails: exhausted retries, unusable pages, unknown sites and missing
/// content regions all leave `details` empty and are logged.
pub async fn scrape_record<F>(fetcher: &F, mut record: RecipeRecord, options: &BatchOptions) -> RecipeRecord
where
    F: PageFetcher + ?Sized,
{
    let url = record.recipe_url.clone();
    let site = match &options.site {
        Some(site) => site.clone(),
        None => match SiteConfig::for_url(&url) {
            Ok(site) => site,
            Err(e) => {
                warn!(url = %url, error = %e, "no site for url");
                return record;
            }
        },
    };

    let page = options
        .retry
        .run_while(|_| fetcher.fetch(&url), |e| e.is_transient())
        .await;

    match page {
        Ok(page) => match assemble_html(&page.html, &site) {
            Ok(details) => record.details = Some(details),
            Err(e) => warn!(url = %url, error = %e, "extraction failed"),
        },
        Err(e) => warn!(url = %url, attempts = e.attempts, error = %e.last_error, "fetch failed"),
    }
    record
}

/// Run the detail pass over `records`, calling `on_record` after each one.
pub async fn run_batch<F, C>(
    fetcher: &F,
    records: Vec<RecipeRecord>,
    options: &BatchOptions,
    mut on_record: C,
) -> BatchBuilder
where
    F: PageFetcher + ?Sized,
    C: FnMut(&RecipeRecord, &BatchBuilder),
{
    let total = records.len();
    let mut builder = BatchBuilder::new();

    for (idx, record) in records.into_iter().enumerate() {
        info!(index = idx + 1, total, url = %record.recipe_url, "scraping");
        let record = scrape_record(fetcher, record, options).await;
        builder.push(record);
        if let Some(last) = builder.records().last() {
            on_record(last, &builder);
        }

        if idx + 1 < total && !options.think_time.is_zero() {
            tokio::time::sleep(options.think_time).await;
        }
    }

    let summary = builder.summary();
    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        elapsed_ms = summary.elapsed_ms,
        "batch finished"
    );
    builder
}
