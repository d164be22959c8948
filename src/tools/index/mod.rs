//! Ingredient Similarity Index
//!
//! Records are embedded from their ingredient names and searched by cosine
//! similarity. The index is a plain JSON file; no vector database involved.

mod openai;

pub use openai::*;

use futures_util::{stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::info;

use crate::types::*;

/// Embedding requests in flight while building.
const EMBED_CONCURRENCY: usize = 4;

pub const DEFAULT_THRESHOLD: f32 = 0.5;
pub const DEFAULT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub recipe_url: String,
    pub title: String,
    pub main_ingredients: Vec<String>,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub recipe_url: String,
    pub title: String,
    pub main_ingredients: Vec<String>,
    pub score: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientIndex {
    pub model: String,
    pub entries: Vec<IndexEntry>,
}

/// Text embedded for a record: its `main_ingredients` joined by `", "`, or
/// every ingredient line when those are absent. `None` when there is nothing.
pub fn index_text(record: &RecipeRecord) -> Option<String> {
    let details = record.details.as_ref()?;
    let main = details
        .main_ingredients
        .as_ref()
        .filter(|m| !m.is_empty())
        .map(|m| m.join(", "));
    let text = main.unwrap_or_else(|| {
        details
            .ingredients
            .iter()
            .flat_map(|(_, lines)| lines.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(", ")
    });
    (!text.trim().is_empty()).then_some(text)
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl IngredientIndex {
    /// Embed every record that has ingredient text. Records without any are
    /// left out.
    pub async fn build<E>(embedder: &E, model: &str, records: &[RecipeRecord]) -> std::result::Result<Self, EmbedError>
    where
        E: Embedder + ?Sized,
    {
        let items: Vec<(&RecipeRecord, String)> = records
            .iter()
            .filter_map(|r| index_text(r).map(|text| (r, text)))
            .collect();
        let texts: Vec<String> = items.iter().map(|(_, t)| t.clone()).collect();
        let chunks: Vec<&[String]> = texts.chunks(embedder.batch_size().max(1)).collect();

        let vectors: Vec<Vec<Vec<f32>>> = stream::iter(chunks)
            .map(|chunk| embedder.embed(chunk))
            .buffered(EMBED_CONCURRENCY)
            .try_collect()
            .await?;

        let entries: Vec<IndexEntry> = items
            .into_iter()
            .zip(vectors.into_iter().flatten())
            .map(|((record, _), embedding)| IndexEntry {
                recipe_url: record.recipe_url.clone(),
                title: record.title.clone(),
                main_ingredients: record
                    .details
                    .as_ref()
                    .and_then(|d| d.main_ingredients.clone())
                    .unwrap_or_default(),
                embedding,
            })
            .collect();

        info!(entries = entries.len(), skipped = records.len() - entries.len(), "index built");
        Ok(Self {
            model: model.to_string(),
            entries,
        })
    }

    /// Entries scoring at least `threshold`, best first, at most `limit`.
    pub fn search(&self, query: &[f32], limit: usize, threshold: f32) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|e| (e, cosine_similarity(query, &e.embedding)))
            .filter(|(_, score)| *score >= threshold)
            .map(|(e, score)| SearchHit {
                recipe_url: e.recipe_url.clone(),
                title: e.title.clone(),
                main_ingredients: e.main_ingredients.clone(),
                score,
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(limit);
        hits
    }

    /// Embed `query` with `embedder` and search.
    pub async fn search_text<E>(
        &self,
        embedder: &E,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> std::result::Result<Vec<SearchHit>, EmbedError>
    where
        E: Embedder + ?Sized,
    {
        let vectors = embedder.embed(&[query.to_string()]).await?;
        let query = vectors
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Malformed("no embedding for query".into()))?;
        Ok(self.search(&query, limit, threshold))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string(self)?;
        std::fs::write(path, text)
            .map_err(|e| ResepiError::storage_error("save index", e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ResepiError::storage_error("load index", e.to_string()))?;
        Ok(serde_json::from_str(&text)?)
    }
}
