//! Ollama embeddings implementation for local inference.

use super::Embedder;
use crate::error::{HearsayError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Embedder backed by a local Ollama instance.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    pub fn with_config(base_url: &str, model: &str, dimensions: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
        }
    }

    async fn request_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&EmbeddingsRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(HearsayError::Embedding(format!(
                "Ollama returned HTTP {}: {}",
                status, snippet
            )));
        }

        let payload: EmbeddingsResponse = response.json().await?;
        if payload.embedding.len() != self.dimensions {
            return Err(HearsayError::Embedding(format!(
                "model {} returned {} dimensions, expected {}",
                self.model,
                payload.embedding.len(),
                self.dimensions
            )));
        }

        Ok(payload.embedding)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request_embedding(text).await
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        // The embeddings endpoint takes one input per call; Ollama queues
        // concurrent requests itself.
        let requests = texts.iter().map(|t| self.request_embedding(t));
        futures::future::try_join_all(requests).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
