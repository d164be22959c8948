use super::headers::headers_for_config;
use super::types::{FetchConfig, FetchError};
use reqwest::{redirect, Client};
use std::time::Duration;

const REDIRECT_LIMIT: usize = 10;
const POOL_IDLE_TIMEOUT_SEC: u64 = 90;

/// Build the shared client for a run.
pub(crate) fn build_client(config: &FetchConfig) -> Result<Client, FetchError> {
    Client::builder()
        .default_headers(headers_for_config(config))
        .cookie_store(true)
        .redirect(redirect::Policy::limited(REDIRECT_LIMIT))
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .timeout(config.timeout())
        .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SEC))
        .build()
        .map_err(|e| FetchError::Http {
            url: String::new(),
            reason: format!("failed to build client: {e}"),
        })
}
