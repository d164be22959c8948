//! Run orchestration: listing walk, detail pass, persistence and the
//! activity log, over a pluggable fetcher and record store.

use chrono::Local;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::services::log::ActivityLogger;
use crate::services::store::{category_file_name, timestamped_name, RecordStore};
use crate::site::SiteConfig;
use crate::tools::batch::{run_batch, BatchBuilder, BatchOptions, BatchSummary};
use crate::tools::fetch::PageFetcher;
use crate::tools::listing::{category_name, discover, page_url, total_pages};
use crate::types::*;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub batch: BatchOptions,
    /// Upper bound on listing pages walked per category.
    pub max_pages: Option<usize>,
    /// Rewrite the output file after every this many records.
    pub flush_every: Option<usize>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            batch: BatchOptions::default(),
            max_pages: None,
            flush_every: None,
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub file: Option<PathBuf>,
    #[serde(flatten)]
    pub summary: BatchSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    /// A run that ended before any record was scraped.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            file: None,
            summary: BatchSummary {
                total: 0,
                succeeded: 0,
                failed: 0,
                elapsed_ms: 0,
            },
            error: Some(error.into()),
        }
    }
}

pub struct Engine<'a, S: RecordStore> {
    pub fetcher: &'a dyn PageFetcher,
    pub store: &'a S,
    pub logger: Option<&'a ActivityLogger>,
    pub opts: EngineOptions,
}

impl<'a, S: RecordStore> Engine<'a, S> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        store: &'a S,
        logger: Option<&'a ActivityLogger>,
        opts: EngineOptions,
    ) -> Self {
        Self {
            fetcher,
            store,
            logger,
            opts,
        }
    }

    fn site_for(&self, url: &str) -> Result<SiteConfig> {
        match &self.opts.batch.site {
            Some(site) => Ok(site.clone()),
            None => SiteConfig::for_url(url),
        }
    }

    /// Fetch one listing page under the retry policy.
    async fn fetch_listing(&self, url: &str) -> Result<String> {
        self.opts
            .batch
            .retry
            .run_while(|_| self.fetcher.fetch(url), |e| e.is_transient())
            .await
            .map(|page| page.into_html())
            .map_err(|e| ResepiError::Other(e.to_string()))
    }

    async fn pause(&self) {
        let think = self.opts.batch.think_time;
        if think > Duration::ZERO {
            tokio::time::sleep(think).await;
        }
    }

    /// Skeleton records from every page of a category listing, deduplicated
    /// by `recipe_url` across pages.
    ///
    /// Failing to fetch the first page is fatal; a later page that cannot be
    /// fetched is skipped.
    pub async fn discover_category(
        &self,
        listing_url: &str,
        site: &SiteConfig,
    ) -> Result<Vec<RecipeRecord>> {
        let first = self.fetch_listing(listing_url).await?;
        let mut pages = total_pages(&first, site);
        if let Some(max) = self.opts.max_pages {
            pages = pages.min(max.max(1));
        }
        info!(url = %listing_url, pages, "walking listing");

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut keep = |found: Vec<RecipeRecord>, records: &mut Vec<RecipeRecord>| {
            for record in found {
                if seen.insert(record.recipe_url.clone()) {
                    records.push(record);
                }
            }
        };
        keep(discover(&first, listing_url, site)?, &mut records);

        for n in 2..=pages {
            self.pause().await;
            let url = page_url(listing_url, n, site)?;
            match self.fetch_listing(&url).await {
                Ok(html) => keep(discover(&html, &url, site)?, &mut records),
                Err(e) => {
                    warn!(url = %url, error = %e, "listing page skipped");
                    self.log_error(&url, "listing", &e.to_string());
                }
            }
        }
        Ok(records)
    }

    /// Discover a category, scrape every recipe in it and save
    /// `recipe_titles_<category>_<count>.json`.
    pub async fn crawl_category(&self, listing_url: &str) -> Result<RunReport> {
        let site = self.site_for(listing_url)?;
        let category =
            category_name(listing_url).ok_or_else(|| ResepiError::InvalidUrl(listing_url.into()))?;
        let skeletons = match self.discover_category(listing_url, &site).await {
            Ok(records) => records,
            Err(e) => {
                self.log_error(listing_url, "crawl", &e.to_string());
                return Err(e);
            }
        };
        info!(category = %category, recipes = skeletons.len(), "category discovered");

        let name = category_file_name(&category, skeletons.len());
        let report = self.run_and_save(skeletons, &name, false).await?;
        self.log_info(listing_url, "crawl", &summary_line(&report.summary));
        Ok(report)
    }

    /// Scrape the given records and save them to a timestamped file.
    ///
    /// An empty input writes nothing and reports a zero-count run.
    pub async fn scrape_details(&self, records: Vec<RecipeRecord>) -> Result<RunReport> {
        if records.is_empty() {
            let report = RunReport::failed("no recipe URLs to scrape");
            warn!("{}", summary_line(&report.summary));
            return Ok(report);
        }
        let name = timestamped_name("recipes", Local::now());
        self.run_and_save(records, &name, false).await
    }

    /// Scrape a single URL; with `append_to`, add it to that file instead of
    /// writing a new one.
    pub async fn scrape_recipe(&self, url: &str, append_to: Option<&str>) -> Result<RunReport> {
        let record = RecipeRecord::skeleton(url);
        match append_to {
            Some(name) => self.run_and_save(vec![record], name, true).await,
            None => {
                let name = timestamped_name("recipes", Local::now());
                self.run_and_save(vec![record], &name, false).await
            }
        }
    }

    async fn run_and_save(
        &self,
        records: Vec<RecipeRecord>,
        name: &str,
        append: bool,
    ) -> Result<RunReport> {
        let flush_every = if append { None } else { self.opts.flush_every };
        let builder = run_batch(self.fetcher, records, &self.opts.batch, |record, builder| {
            self.log_record(record);
            if let Some(n) = flush_every.filter(|n| *n > 0) {
                if builder.len() % n == 0 {
                    self.flush(name, builder);
                }
            }
        })
        .await;

        let summary = builder.summary();
        let records = builder.finish();
        let file = if append {
            self.store.append(name, &records)?
        } else {
            self.store.save_as(name, &records)?
        };
        info!(file = %file.display(), "{}", summary_line(&summary));
        Ok(RunReport {
            file: Some(file),
            summary,
            error: None,
        })
    }

    fn flush(&self, name: &str, builder: &BatchBuilder) {
        if let Err(e) = self.store.save_as(name, builder.records()) {
            warn!(file = %name, error = %e, "partial flush failed");
        }
    }

    fn log_record(&self, record: &RecipeRecord) {
        if record.has_details() {
            self.log_info(&record.recipe_url, "scrape", "details extracted");
        } else {
            self.log_error(&record.recipe_url, "scrape", "no details");
        }
    }

    fn log_info(&self, url: &str, event: &str, details: &str) {
        if let Some(logger) = self.logger {
            let _ = logger.info(Some(url), event, Some(details));
        }
    }

    fn log_error(&self, url: &str, event: &str, details: &str) {
        if let Some(logger) = self.logger {
            let _ = logger.error(Some(url), event, Some(details));
        }
    }
}

/// `"<n> records (<ok> ok, <failed> empty) in <secs>s"`
pub fn summary_line(summary: &BatchSummary) -> String {
    format!(
        "{} records ({} ok, {} empty) in {:.1}s",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.elapsed_ms as f64 / 1000.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::{load_records, LocalFsStore};
    use crate::site::myresipi;
    use crate::tools::dom::Matcher;
    use crate::tools::fetch::testing::StaticFetcher;
    use crate::tools::fetch::FetchError;
    use crate::tools::retry::RetryPolicy;
    use tempfile::TempDir;

    const LISTING_1: &str = r#"<html><body>
        <article class="fusion-post-grid">
          <h2 class="blog-shortcode-post-title"><a href="/ayam-goreng/">Ayam Goreng</a></h2>
        </article>
        <article class="fusion-post-grid">
          <h2 class="blog-shortcode-post-title"><a href="/nasi-lemak/">Nasi Lemak</a></h2>
        </article>
        <div class="pagination">Halaman 1 / 2</div>
      </body></html>"#;

    const LISTING_2: &str = r#"<html><body>
        <article class="fusion-post-grid">
          <h2 class="blog-shortcode-post-title"><a href="/nasi-lemak/">Nasi Lemak</a></h2>
        </article>
        <article class="fusion-post-grid">
          <h2 class="blog-shortcode-post-title"><a href="/kuih-lapis/">Kuih Lapis</a></h2>
        </article>
        <div class="pagination">Halaman 2 / 2</div>
      </body></html>"#;

    const RECIPE: &str = r#"<html><body><div class="fusion-content-tb">
        <h3>Ayam Goreng</h3>
        <p><strong>Bahan-bahan</strong></p>
        <ul><li>1 ekor ayam</li></ul>
        <p><strong>Cara Memasak</strong></p>
        <ol><li>Goreng ayam</li></ol>
      </div></body></html>"#;

    fn site() -> SiteConfig {
        let mut site = myresipi();
        site.listing.page_label = Some(Matcher::parse("div.pagination").unwrap());
        site
    }

    fn options() -> EngineOptions {
        EngineOptions {
            batch: BatchOptions {
                retry: RetryPolicy::new(2, Duration::ZERO),
                think_time: Duration::ZERO,
                site: Some(site()),
            },
            ..EngineOptions::default()
        }
    }

    fn listing_fetcher() -> StaticFetcher {
        StaticFetcher::default()
            .page("https://myresipi.com/category/ayam/", LISTING_1)
            .page("https://myresipi.com/category/ayam/page/2/", LISTING_2)
            .page("https://myresipi.com/ayam-goreng/", RECIPE)
            .page("https://myresipi.com/nasi-lemak/", RECIPE)
    }

    #[tokio::test]
    async fn crawl_walks_pages_and_saves_category_file() {
        let dir = TempDir::new().unwrap();
        let store = LocalFsStore::new(dir.path()).unwrap();
        let fetcher = listing_fetcher();
        let engine = Engine::new(&fetcher, &store, None, options());

        let report = engine
            .crawl_category("https://myresipi.com/category/ayam/")
            .await
            .unwrap();

        let file = report.file.unwrap();
        assert_eq!(
            file.file_name().unwrap().to_str().unwrap(),
            "recipe_titles_ayam_3.json"
        );
        let records = load_records(&file).unwrap();
        let urls: Vec<_> = records.iter().map(|r| r.recipe_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://myresipi.com/ayam-goreng/",
                "https://myresipi.com/nasi-lemak/",
                "https://myresipi.com/kuih-lapis/",
            ]
        );
        // kuih-lapis has no page and times out
        assert_eq!(report.summary.succeeded, 2);
        assert_eq!(report.summary.failed, 1);
        assert!(!records[2].has_details());
    }

    #[tokio::test]
    async fn first_listing_page_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let store = LocalFsStore::new(dir.path()).unwrap();
        let url = "https://myresipi.com/category/ikan/";
        let fetcher = StaticFetcher::default().error(
            url,
            FetchError::Status {
                url: url.into(),
                status: 404,
            },
        );
        let engine = Engine::new(&fetcher, &store, None, options());

        assert!(engine.crawl_category(url).await.is_err());
        assert_eq!(fetcher.calls(url), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn max_pages_limits_the_walk() {
        let dir = TempDir::new().unwrap();
        let store = LocalFsStore::new(dir.path()).unwrap();
        let fetcher = listing_fetcher();
        let mut opts = options();
        opts.max_pages = Some(1);
        let engine = Engine::new(&fetcher, &store, None, opts);

        let found = engine
            .discover_category("https://myresipi.com/category/ayam/", &site())
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| !r.has_details()));
    }

    #[tokio::test]
    async fn empty_details_input_reports_zero_count() {
        let dir = TempDir::new().unwrap();
        let store = LocalFsStore::new(dir.path()).unwrap();
        let fetcher = StaticFetcher::default();
        let engine = Engine::new(&fetcher, &store, None, options());

        let report = engine.scrape_details(Vec::new()).await.unwrap();
        assert!(report.file.is_none());
        assert_eq!(report.summary.total, 0);
        assert_eq!(report.error.as_deref(), Some("no recipe URLs to scrape"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn single_recipe_appends_and_logs_activity() {
        let dir = TempDir::new().unwrap();
        let store = LocalFsStore::new(dir.path().join("out")).unwrap();
        let logger = ActivityLogger::in_dir(&dir.path().join("logs")).unwrap();
        let fetcher = listing_fetcher();
        let engine = Engine::new(&fetcher, &store, Some(&logger), options());

        engine
            .scrape_recipe("https://myresipi.com/ayam-goreng/", Some("koleksi.json"))
            .await
            .unwrap();
        let report = engine
            .scrape_recipe("https://myresipi.com/nasi-lemak/", Some("koleksi.json"))
            .await
            .unwrap();

        let records = load_records(&report.file.unwrap()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].details.as_ref().unwrap().title.as_deref(),
            Some("Ayam Goreng")
        );

        let logs = logger.read_logs(Some("nasi-lemak"), false).unwrap();
        assert_eq!(logs.len(), 1);
    }

    #[tokio::test]
    async fn flush_writes_partial_results() {
        let dir = TempDir::new().unwrap();
        let store = LocalFsStore::new(dir.path()).unwrap();
        let fetcher = listing_fetcher();
        let mut opts = options();
        opts.flush_every = Some(1);
        let engine = Engine::new(&fetcher, &store, None, opts);

        let report = engine
            .scrape_details(vec![
                RecipeRecord::skeleton("https://myresipi.com/ayam-goreng/"),
                RecipeRecord::skeleton("https://myresipi.com/nasi-lemak/"),
            ])
            .await
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert_eq!(load_records(&report.file.unwrap()).unwrap().len(), 2);
    }

    #[test]
    fn summary_line_reads_well() {
        let line = summary_line(&BatchSummary {
            total: 3,
            succeeded: 2,
            failed: 1,
            elapsed_ms: 1500,
        });
        assert_eq!(line, "3 records (2 ok, 1 empty) in 1.5s");
    }
}
