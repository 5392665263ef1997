//! Persistence ports.
//!
//! The pipeline never talks to a database directly; it goes through these
//! traits. [`memory::MemoryStore`] is the reference backend used by the
//! binary and the tests; a SQL adapter implements the same traits.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::job::JobEvent;
use crate::model::{Document, DocumentChunk, DocumentStatus, KnowledgeBase, ScrapeJob};

/// Scrape-job records and their state machine.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, job: ScrapeJob) -> Result<ScrapeJob>;

    async fn find_job(&self, id: Uuid) -> Result<ScrapeJob>;

    async fn list_jobs(&self, knowledge_base_id: Uuid) -> Result<Vec<ScrapeJob>>;

    /// Atomically re-read the job, apply `event` through
    /// [`crate::job::apply`], and persist the result. This is the only way
    /// job state changes; progress fields can therefore never regress.
    async fn apply_event(&self, id: Uuid, event: JobEvent) -> Result<ScrapeJob>;
}

/// Documents inside a knowledge base. Queries skip soft-deleted knowledge
/// bases.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(&self, document: Document) -> Result<Document>;

    async fn find_document(&self, id: Uuid) -> Result<Document>;

    /// Lookup by the `(knowledge_base_id, source_url)` unique key.
    async fn find_document_by_url(
        &self,
        knowledge_base_id: Uuid,
        source_url: &str,
    ) -> Result<Option<Document>>;

    async fn list_documents(&self, knowledge_base_id: Uuid) -> Result<Vec<Document>>;

    async fn update_document_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
        chunk_count: usize,
        error_message: Option<String>,
    ) -> Result<Document>;

    /// Remove the document row. Callers delete the chunks first; see
    /// [`crate::pipeline::delete_document`].
    async fn delete_document(&self, id: Uuid) -> Result<()>;
}

/// Knowledge-base records.
#[async_trait]
pub trait KnowledgeBaseStore: Send + Sync {
    async fn create_knowledge_base(&self, kb: KnowledgeBase) -> Result<KnowledgeBase>;

    /// Soft-deleted knowledge bases are reported as not found.
    async fn find_knowledge_base(&self, id: Uuid) -> Result<KnowledgeBase>;

    /// Update name/chunking settings. Changing `embedding_model` once the
    /// knowledge base holds documents is a conflict; mixed-model vectors in
    /// one index are unanswerable.
    async fn update_knowledge_base(&self, kb: KnowledgeBase) -> Result<KnowledgeBase>;

    async fn count_agents_using(&self, knowledge_base_id: Uuid) -> Result<usize>;
}

/// One nearest-neighbor match.
#[derive(Debug, Clone)]
pub struct ChunkMatch {
    pub chunk_id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: usize,
    pub content: String,
    /// Cosine distance, `1 - similarity`.
    pub distance: f32,
}

/// Chunk rows with their embeddings.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert one chunk. The embedding dimension must match the store's
    /// configured dimension.
    async fn insert_chunk(&self, chunk: DocumentChunk) -> Result<()>;

    async fn delete_chunks_by_document(&self, document_id: Uuid) -> Result<usize>;

    async fn count_chunks(&self, document_id: Uuid) -> Result<usize>;

    /// The `limit` chunks nearest to `query` by cosine distance, restricted
    /// to chunks whose parent document is `Completed` and belongs to the
    /// knowledge base. Ties break by `chunk_index`, then `document_id`.
    async fn nearest_by_cosine(
        &self,
        knowledge_base_id: Uuid,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkMatch>>;
}

/// Operator maintenance commands, rebuildable over any backend.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Promote the user with this email to admin.
    async fn grant_admin(&self, email: &str) -> Result<()>;

    /// Mark every user's email as verified; returns how many changed.
    async fn verify_all_users(&self) -> Result<usize>;

    /// Drop all rows from every table. Irreversible.
    async fn truncate_all(&self) -> Result<()>;
}
