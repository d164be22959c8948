//! In-memory fetcher for tests.

use super::{FetchError, FetchResult, PageFetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves canned pages; unknown URLs time out. Counts calls per URL.
#[derive(Default)]
pub(crate) struct StaticFetcher {
    pages: HashMap<String, Result<String, FetchError>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StaticFetcher {
    pub(crate) fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(html.to_string()));
        self
    }

    pub(crate) fn error(mut self, url: &str, err: FetchError) -> Self {
        self.pages.insert(url.to_string(), Err(err));
        self
    }

    pub(crate) fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        match self.pages.get(url) {
            Some(Ok(html)) => Ok(FetchResult {
                html: html.clone(),
                final_url: url.to_string(),
                duration_ms: 0,
            }),
            Some(Err(e)) => Err(e.clone()),
            None => Err(FetchError::Timeout(url.to_string())),
        }
    }
}
