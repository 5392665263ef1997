//! In-memory reference backend for every port.
//!
//! One coarse `RwLock` over the whole state keeps the invariants easy to
//! audit; job events are applied under the write lock so re-read and write
//! are a single atomic step. No await happens while the lock is held.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{HarvestError, Result};
use crate::job::{self, JobEvent};
use crate::model::{
    Document, DocumentChunk, DocumentStatus, KnowledgeBase, ScrapeJob, User,
};
use crate::retrieval::cosine_distance;
use crate::store::{
    AdminStore, ChunkMatch, DocumentStore, JobStore, KnowledgeBaseStore, VectorStore,
};

#[derive(Debug, Default)]
struct MemoryState {
    jobs: HashMap<Uuid, ScrapeJob>,
    knowledge_bases: HashMap<Uuid, KnowledgeBase>,
    documents: HashMap<Uuid, Document>,
    chunks: Vec<DocumentChunk>,
    users: HashMap<Uuid, User>,
    agents_using: HashMap<Uuid, usize>,
}

/// Shared in-memory backend.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    dimension: usize,
}

impl MemoryStore {
    /// `dimension` is the embedding width every inserted chunk must match.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            dimension,
        }
    }

    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    pub async fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.state
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    /// Register `count` agents as consumers of a knowledge base (test and
    /// demo scaffolding for `count_agents_using`).
    pub async fn set_agents_using(&self, knowledge_base_id: Uuid, count: usize) {
        self.state
            .write()
            .await
            .agents_using
            .insert(knowledge_base_id, count);
    }
}

fn not_found(entity: &'static str, id: impl ToString) -> HarvestError {
    HarvestError::NotFound {
        entity,
        id: id.to_string(),
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, job: ScrapeJob) -> Result<ScrapeJob> {
        let mut state = self.state.write().await;
        if !state.knowledge_bases.contains_key(&job.knowledge_base_id) {
            return Err(not_found("knowledge base", job.knowledge_base_id));
        }
        state.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn find_job(&self, id: Uuid) -> Result<ScrapeJob> {
        self.state
            .read()
            .await
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("job", id))
    }

    async fn list_jobs(&self, knowledge_base_id: Uuid) -> Result<Vec<ScrapeJob>> {
        let state = self.state.read().await;
        let mut jobs: Vec<ScrapeJob> = state
            .jobs
            .values()
            .filter(|j| j.knowledge_base_id == knowledge_base_id)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }

    async fn apply_event(&self, id: Uuid, event: JobEvent) -> Result<ScrapeJob> {
        let mut state = self.state.write().await;
        let current = state
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("job", id))?;
        let updated = job::apply(current, event)?;
        state.jobs.insert(id, updated.clone());
        Ok(updated)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(&self, document: Document) -> Result<Document> {
        let mut state = self.state.write().await;
        match state.knowledge_bases.get(&document.knowledge_base_id) {
            Some(kb) if kb.deleted_at.is_none() => {}
            _ => return Err(not_found("knowledge base", document.knowledge_base_id)),
        }
        if let Some(url) = &document.source_url {
            let duplicate = state.documents.values().any(|d| {
                d.knowledge_base_id == document.knowledge_base_id
                    && d.source_url.as_deref() == Some(url)
            });
            if duplicate {
                return Err(HarvestError::Conflict(format!(
                    "document for {url} already exists in knowledge base {}",
                    document.knowledge_base_id
                )));
            }
        }
        state.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn find_document(&self, id: Uuid) -> Result<Document> {
        self.state
            .read()
            .await
            .documents
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("document", id))
    }

    async fn find_document_by_url(
        &self,
        knowledge_base_id: Uuid,
        source_url: &str,
    ) -> Result<Option<Document>> {
        Ok(self
            .state
            .read()
            .await
            .documents
            .values()
            .find(|d| {
                d.knowledge_base_id == knowledge_base_id
                    && d.source_url.as_deref() == Some(source_url)
            })
            .cloned())
    }

    async fn list_documents(&self, knowledge_base_id: Uuid) -> Result<Vec<Document>> {
        let state = self.state.read().await;
        let mut docs: Vec<Document> = state
            .documents
            .values()
            .filter(|d| d.knowledge_base_id == knowledge_base_id)
            .cloned()
            .collect();
        docs.sort_by_key(|d| d.created_at);
        Ok(docs)
    }

    async fn update_document_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
        chunk_count: usize,
        error_message: Option<String>,
    ) -> Result<Document> {
        let mut state = self.state.write().await;
        let doc = state
            .documents
            .get_mut(&id)
            .ok_or_else(|| not_found("document", id))?;
        doc.status = status;
        doc.chunk_count = chunk_count;
        doc.error_message = error_message;
        Ok(doc.clone())
    }

    async fn delete_document(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .documents
            .remove(&id)
            .ok_or_else(|| not_found("document", id))?;
        Ok(())
    }
}

#[async_trait]
impl KnowledgeBaseStore for MemoryStore {
    async fn create_knowledge_base(&self, kb: KnowledgeBase) -> Result<KnowledgeBase> {
        if kb.chunk_size == 0 {
            return Err(HarvestError::InvalidInput("chunk_size must be positive".into()));
        }
        if kb.chunk_overlap >= kb.chunk_size {
            return Err(HarvestError::InvalidInput(
                "chunk_overlap must be smaller than chunk_size".into(),
            ));
        }
        self.state
            .write()
            .await
            .knowledge_bases
            .insert(kb.id, kb.clone());
        Ok(kb)
    }

    async fn find_knowledge_base(&self, id: Uuid) -> Result<KnowledgeBase> {
        self.state
            .read()
            .await
            .knowledge_bases
            .get(&id)
            .filter(|kb| kb.deleted_at.is_none())
            .cloned()
            .ok_or_else(|| not_found("knowledge base", id))
    }

    async fn update_knowledge_base(&self, kb: KnowledgeBase) -> Result<KnowledgeBase> {
        let mut state = self.state.write().await;
        let existing = state
            .knowledge_bases
            .get(&kb.id)
            .filter(|k| k.deleted_at.is_none())
            .ok_or_else(|| not_found("knowledge base", kb.id))?;
        if existing.embedding_model != kb.embedding_model {
            let has_documents = state
                .documents
                .values()
                .any(|d| d.knowledge_base_id == kb.id);
            if has_documents {
                return Err(HarvestError::Conflict(format!(
                    "knowledge base {} has documents; embedding model cannot change",
                    kb.id
                )));
            }
        }
        state.knowledge_bases.insert(kb.id, kb.clone());
        Ok(kb)
    }

    async fn count_agents_using(&self, knowledge_base_id: Uuid) -> Result<usize> {
        Ok(self
            .state
            .read()
            .await
            .agents_using
            .get(&knowledge_base_id)
            .copied()
            .unwrap_or(0))
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn insert_chunk(&self, chunk: DocumentChunk) -> Result<()> {
        if chunk.embedding.len() != self.dimension {
            return Err(HarvestError::Storage(format!(
                "embedding dimension {} does not match index dimension {}",
                chunk.embedding.len(),
                self.dimension
            )));
        }
        let mut state = self.state.write().await;
        if !state.documents.contains_key(&chunk.document_id) {
            return Err(not_found("document", chunk.document_id));
        }
        state.chunks.push(chunk);
        Ok(())
    }

    async fn delete_chunks_by_document(&self, document_id: Uuid) -> Result<usize> {
        let mut state = self.state.write().await;
        let before = state.chunks.len();
        state.chunks.retain(|c| c.document_id != document_id);
        Ok(before - state.chunks.len())
    }

    async fn count_chunks(&self, document_id: Uuid) -> Result<usize> {
        Ok(self
            .state
            .read()
            .await
            .chunks
            .iter()
            .filter(|c| c.document_id == document_id)
            .count())
    }

    async fn nearest_by_cosine(
        &self,
        knowledge_base_id: Uuid,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkMatch>> {
        let state = self.state.read().await;

        let mut matches: Vec<ChunkMatch> = state
            .chunks
            .iter()
            .filter(|c| {
                state.documents.get(&c.document_id).is_some_and(|d| {
                    d.knowledge_base_id == knowledge_base_id
                        && d.status == DocumentStatus::Completed
                })
            })
            .map(|c| ChunkMatch {
                chunk_id: c.id,
                document_id: c.document_id,
                chunk_index: c.chunk_index,
                content: c.content.clone(),
                distance: cosine_distance(query, &c.embedding),
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_index.cmp(&b.chunk_index))
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        matches.truncate(limit);
        Ok(matches)
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn grant_admin(&self, email: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .values_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| not_found("user", email.to_string()))?;
        user.is_admin = true;
        Ok(())
    }

    async fn verify_all_users(&self) -> Result<usize> {
        let mut state = self.state.write().await;
        let mut changed = 0;
        for user in state.users.values_mut() {
            if !user.email_verified {
                user.email_verified = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn truncate_all(&self) -> Result<()> {
        let mut state = self.state.write().await;
        *state = MemoryState::default();
        Ok(())
    }
}
