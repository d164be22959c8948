use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::tools::retry::RetryPolicy;

pub const DEFAULT_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_BATCH_SIZE: usize = 64;
const TIMEOUT_SEC: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbedError {
    #[error("missing OpenAI API key")]
    MissingKey,
    #[error("embedding request failed: {0}")]
    Request(String),
    #[error("embedding endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed embedding response: {0}")]
    Malformed(String),
}

impl EmbedError {
    pub fn is_transient(&self) -> bool {
        match self {
            EmbedError::Request(_) => true,
            EmbedError::Status { status, .. } => *status == 429 || *status >= 500,
            EmbedError::MissingKey | EmbedError::Malformed(_) => false,
        }
    }
}

/// Turns text into vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Largest number of inputs accepted by one [`Embedder::embed`] call.
    fn batch_size(&self) -> usize {
        DEFAULT_BATCH_SIZE
    }

    /// One vector per input, in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Client for OpenAI-compatible `/embeddings` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    retry: RetryPolicy,
    batch_size: usize,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self, EmbedError> {
        if api_key.trim().is_empty() {
            return Err(EmbedError::MissingKey);
        }
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| EmbedError::Request("invalid API key header".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SEC))
            .default_headers(headers)
            .build()
            .map_err(|e| EmbedError::Request(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            endpoint: embeddings_endpoint(base_url),
            model: model.to_string(),
            dimensions: None,
            retry: RetryPolicy::new(3, Duration::from_millis(500)),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Key from `OPENAI_API_KEY`, endpoint from `OPENAI_BASE_URL` when set.
    pub fn from_env(model: &str) -> Result<Self, EmbedError> {
        let key = std::env::var("OPENAI_API_KEY").map_err(|_| EmbedError::MissingKey)?;
        let base = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(&key, &base, model)
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn embed_once(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
            dimensions: self.dimensions,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbedError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| EmbedError::Malformed(e.to_string()))?;
        into_vectors(parsed, inputs.len())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        self.retry
            .run_while(|_| self.embed_once(inputs), EmbedError::is_transient)
            .await
            .map_err(|e| e.last_error)
    }
}

fn embeddings_endpoint(base_url: &str) -> String {
    format!("{}/embeddings", base_url.trim_end_matches('/'))
}

/// Vectors in input order; the endpoint may answer out of order.
fn into_vectors(mut parsed: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>, EmbedError> {
    parsed.data.sort_by_key(|entry| entry.index);
    if parsed.data.len() != expected {
        return Err(EmbedError::Malformed(format!(
            "{} embeddings for {} inputs",
            parsed.data.len(),
            expected
        )));
    }
    Ok(parsed.data.into_iter().map(|e| e.embedding).collect())
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
