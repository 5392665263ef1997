//! Embedding service port and the OpenAI-compatible HTTP client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HarvestError, Result};

/// Model used when a knowledge base does not specify one.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Vector width of the default model; the vector index is created with this
/// dimension.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

/// Computes dense vectors for text.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed one text with the given model. Failures surface as
    /// [`HarvestError::Embedding`] and fail the enclosing document.
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>>;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for any OpenAI-compatible `/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiEmbedder {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Read endpoint and key from `EMBEDDINGS_BASE_URL` / `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("EMBEDDINGS_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| HarvestError::Embedding("OPENAI_API_KEY is not set".to_string()))?;
        Ok(Self::new(base_url, api_key))
    }
}

#[async_trait]
impl EmbeddingService for OpenAiEmbedder {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { input: text, model })
            .send()
            .await
            .map_err(|e| HarvestError::Embedding(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HarvestError::Embedding(format!(
                "{model} returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| HarvestError::Embedding(format!("malformed response: {e}")))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| HarvestError::Embedding("response carried no embedding".to_string()))?;

        debug!(model, dims = vector.len(), "embedded text");
        Ok(vector)
    }
}
