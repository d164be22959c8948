use super::types::FetchConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use tracing::warn;

/// Desktop Chrome on Windows, matching the default user agent.
const BROWSER_HEADERS: [(&str, &str); 6] = [
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.5"),
    (
        "Sec-Ch-Ua",
        "\"Not A(Brand\";v=\"99\", \"Google Chrome\";v=\"121\", \"Chromium\";v=\"121\"",
    ),
    ("Sec-Ch-Ua-Mobile", "?0"),
    ("Sec-Ch-Ua-Platform", "\"Windows\""),
    ("Upgrade-Insecure-Requests", "1"),
];

/// Full header map for `config`: browser headers, user agent, then extras.
/// Pairs that are not valid header names or values are skipped.
pub(crate) fn headers_for_config(config: &FetchConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let extras = config
        .extra_headers
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()));

    for (k, v) in BROWSER_HEADERS.into_iter().chain(extras) {
        let name = HeaderName::from_bytes(k.to_ascii_lowercase().as_bytes());
        let value = HeaderValue::from_str(v);
        match (name, value) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = k, "skipping invalid header"),
        }
    }

    if !headers.contains_key(USER_AGENT) {
        match HeaderValue::from_str(&config.user_agent) {
            Ok(ua) => {
                headers.insert(USER_AGENT, ua);
            }
            Err(_) => warn!(user_agent = %config.user_agent, "invalid user agent, sending none"),
        }
    }

    headers
}
