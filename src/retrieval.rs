//! Cosine-similarity retrieval over a knowledge base.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::embed::EmbeddingService;
use crate::error::Result;
use crate::model::SearchHit;
use crate::store::{DocumentStore, KnowledgeBaseStore, VectorStore};

/// Cosine distance `1 - (a·b)/(‖a‖‖b‖)`.
///
/// Mismatched or zero-magnitude vectors are maximally distant rather than an
/// error; they can only appear if the index was populated outside the
/// pipeline's dimension checks.
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 1.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Dependencies for retrieval.
pub struct Retriever {
    pub knowledge_bases: Arc<dyn KnowledgeBaseStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub vectors: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn EmbeddingService>,
}

impl Retriever {
    /// Embed `query` with the knowledge base's model and return the `limit`
    /// most similar chunks of its completed documents, best first.
    pub async fn search(
        &self,
        knowledge_base_id: Uuid,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let kb = self.knowledge_bases.find_knowledge_base(knowledge_base_id).await?;
        let query_vector = self.embedder.embed(query, &kb.embedding_model).await?;

        let matches = self
            .vectors
            .nearest_by_cosine(knowledge_base_id, &query_vector, limit)
            .await?;
        debug!(kb = %knowledge_base_id, hits = matches.len(), "vector search complete");

        let mut hits = Vec::with_capacity(matches.len());
        for m in matches {
            let document = self.documents.find_document(m.document_id).await?;
            hits.push(SearchHit {
                chunk_id: m.chunk_id,
                content: m.content,
                score: 1.0 - m.distance,
                document_title: document.title,
                source_url: document.source_url,
            });
        }
        Ok(hits)
    }
}
