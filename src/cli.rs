use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{self, Components};
use crate::engine::EngineOptions;
use crate::runtime::block_on;
use crate::services::store::LocalFsStore;
use crate::site::SiteConfig;
use crate::tools::batch::BatchOptions;
use crate::tools::fetch::FetchConfig;
use crate::tools::index::{OpenAiEmbedder, DEFAULT_LIMIT, DEFAULT_MODEL, DEFAULT_THRESHOLD};
use crate::tools::retry::RetryPolicy;
use crate::ApiResponse;

#[derive(Parser)]
#[command(name = "resepi", version, about = "Recipe pages to normalized JSON records")]
pub struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk category listings and scrape every recipe in them
    Crawl {
        /// Category listing URLs
        #[arg(required = true)]
        urls: Vec<String>,
        #[command(flatten)]
        run: RunArgs,
        /// Stop after this many listing pages per category
        #[arg(long)]
        max_pages: Option<usize>,
    },
    /// Scrape every recipe_url in a JSON file
    Details {
        input: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Scrape a single recipe URL
    Recipe {
        url: String,
        /// Add the record to this file in the output directory
        #[arg(long)]
        append: Option<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Check main_ingredients of every JSON file in a directory
    Audit { dir: PathBuf },
    /// Embed recipe files into an ingredient index
    Index {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long, default_value = "ingredient_index.json")]
        out: PathBuf,
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,
    },
    /// Find recipes with similar ingredients
    Search {
        query: String,
        #[arg(long, default_value = "ingredient_index.json")]
        index: PathBuf,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f32,
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,
    },
    /// Show the activity log, newest first
    Logs {
        /// Only lines mentioning this URL fragment
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        errors: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Built-in site name or path to a site JSON file; picked by host if omitted
    #[arg(long)]
    site: Option<String>,
    #[arg(long, default_value = "data")]
    out_dir: PathBuf,
    #[arg(long, default_value_t = 3)]
    retries: usize,
    #[arg(long, default_value_t = 3000)]
    backoff_ms: u64,
    /// Pause between pages
    #[arg(long, default_value_t = 500)]
    think_ms: u64,
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,
    /// Rewrite the output file every N records
    #[arg(long)]
    flush_every: Option<usize>,
}

impl RunArgs {
    fn site(&self) -> anyhow::Result<Option<SiteConfig>> {
        let Some(site) = &self.site else {
            return Ok(None);
        };
        if let Some(builtin) = SiteConfig::builtin(site) {
            return Ok(Some(builtin));
        }
        let config = SiteConfig::from_path(Path::new(site))
            .with_context(|| format!("loading site config {site}"))?;
        Ok(Some(config))
    }

    fn components(&self, max_pages: Option<usize>) -> anyhow::Result<Components> {
        let fetch = FetchConfig {
            timeout_ms: self.timeout_ms,
            think_time_ms: self.think_ms,
            ..FetchConfig::default()
        };
        let opts = EngineOptions {
            batch: BatchOptions {
                retry: RetryPolicy::new(self.retries, Duration::from_millis(self.backoff_ms)),
                think_time: fetch.think_time(),
                site: self.site()?,
            },
            max_pages,
            flush_every: self.flush_every,
        };
        Components::http(fetch, opts).context("building HTTP client")
    }

    fn store(&self) -> anyhow::Result<LocalFsStore> {
        LocalFsStore::new(&self.out_dir)
            .with_context(|| format!("creating output directory {}", self.out_dir.display()))
    }
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Crawl {
            urls,
            run,
            max_pages,
        } => {
            let store = run.store()?;
            let components = run.components(max_pages)?;
            finish(block_on(api::crawl(&store, &urls, &components)));
        }
        Command::Details { input, run } => {
            let store = run.store()?;
            let components = run.components(None)?;
            finish(block_on(api::details(&store, &input, &components)));
        }
        Command::Recipe { url, append, run } => {
            let store = run.store()?;
            let components = run.components(None)?;
            finish(block_on(api::recipe(
                &store,
                &url,
                append.as_deref(),
                &components,
            )));
        }
        Command::Audit { dir } => finish(api::audit(&dir)),
        Command::Index { inputs, out, model } => {
            let embedder = OpenAiEmbedder::from_env(&model)?;
            finish(block_on(api::build_index(&inputs, &out, &model, &embedder)));
        }
        Command::Search {
            query,
            index,
            limit,
            threshold,
            model,
        } => {
            let embedder = OpenAiEmbedder::from_env(&model)?;
            finish(block_on(api::search(
                &index, &query, limit, threshold, &embedder,
            )));
        }
        Command::Logs { url, errors } => finish(api::logs(url.as_deref(), errors)),
    }
    Ok(())
}

fn finish<T: serde::Serialize>(res: crate::Result<T>) {
    match res {
        Ok(v) => print_json(ApiResponse::ok(v)),
        Err(e) => print_json(ApiResponse::<()>::err(e.to_string())),
    }
}

fn print_json<T: serde::Serialize>(val: T) {
    match serde_json::to_string_pretty(&val) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("failed to render output: {e}"),
    }
}
