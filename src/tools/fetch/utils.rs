use super::types::FetchError;
use reqwest::StatusCode;

const CHALLENGE_PATTERNS: [&str; 8] = [
    "verify you are a human",
    "please complete the captcha",
    "captcha challenge",
    "cf-browser-verification",
    "cf-captcha-container",
    "blocked by cloudflare",
    "please enable javascript and cookies",
    "px-captcha",
];

/// Accept a response only if it is a successful HTML page and not a bot
/// challenge interstitial.
pub(super) fn validate_response(url: &str, status: StatusCode, body: &str) -> Result<(), FetchError> {
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let lower = body.to_ascii_lowercase();
    if !lower.contains("<html") && !lower.contains("<!doctype") {
        return Err(FetchError::Invalid {
            url: url.to_string(),
            reason: "missing HTML markers".into(),
        });
    }

    if let Some(pattern) = CHALLENGE_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(FetchError::Invalid {
            url: url.to_string(),
            reason: format!("bot challenge - {pattern}"),
        });
    }

    Ok(())
}
