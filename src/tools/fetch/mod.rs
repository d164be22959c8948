//! Page Fetcher
//!
//! Everything network-facing sits behind [`PageFetcher`] so the rest of the
//! crate (and its tests) never touches `reqwest` directly.

mod client;
mod headers;
mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub mod types;

pub use types::*;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tracing::debug;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page. Timeouts are reported as [`FetchError::Timeout`].
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError>;
}

/// `reqwest`-backed fetcher sending desktop browser headers.
///
/// # Examples
/// ```no_run
/// use resepi::tools::fetch::{FetchConfig, HttpFetcher, PageFetcher};
///
/// # async fn example() -> Result<(), resepi::tools::fetch::FetchError> {
/// let fetcher = HttpFetcher::new(FetchConfig::default())?;
/// let page = fetcher.fetch("https://myresipi.com/resepi/").await?;
/// println!("{} bytes in {}ms", page.html.len(), page.duration_ms);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = client::build_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        utils::validate_response(url, status, &html)?;

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(url, status = status.as_u16(), bytes = html.len(), duration_ms, "fetched");
        Ok(FetchResult {
            html,
            final_url,
            duration_ms,
        })
    }
}
