use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResepiError>;

#[derive(Debug, Error)]
pub enum ResepiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("no site configuration matches {0}")]
    UnknownSite(String),
    #[error("nothing to process: {0}")]
    EmptyInput(String),
    #[error("storage error during {operation}: {reason}")]
    Storage { operation: String, reason: String },
    #[error("{0}")]
    Other(String),
}

impl ResepiError {
    pub fn storage_error(operation: &str, reason: impl Into<String>) -> Self {
        ResepiError::Storage {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

/* Conversions so `?` works smoothly */
impl From<std::io::Error> for ResepiError {
    fn from(e: std::io::Error) -> Self {
        ResepiError::Other(e.to_string())
    }
}
impl From<serde_json::Error> for ResepiError {
    fn from(e: serde_json::Error) -> Self {
        ResepiError::Other(e.to_string())
    }
}
impl From<reqwest::Error> for ResepiError {
    fn from(e: reqwest::Error) -> Self {
        ResepiError::Other(e.to_string())
    }
}
impl From<url::ParseError> for ResepiError {
    fn from(e: url::ParseError) -> Self {
        ResepiError::InvalidUrl(e.to_string())
    }
}
impl From<crate::tools::fetch::FetchError> for ResepiError {
    fn from(e: crate::tools::fetch::FetchError) -> Self {
        ResepiError::Other(e.to_string())
    }
}
impl From<crate::tools::index::EmbedError> for ResepiError {
    fn from(e: crate::tools::index::EmbedError) -> Self {
        ResepiError::Other(e.to_string())
    }
}
