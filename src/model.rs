//! Core entities: scrape jobs, knowledge bases, documents, and chunks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Lifecycle of a scrape job. Transitions are applied through
/// [`crate::job::apply`]; no state moves backward, and `Completed`/`Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Discovering,
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A website ingestion job: discovery progress, the operator's URL
/// selection, and scrape counters.
///
/// Invariants: `selected_urls ⊆ discovered_urls`, `scraped_count` never
/// exceeds the selection size, and the base URL is a member of
/// `discovered_urls` from the moment discovery starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeJob {
    pub id: Uuid,
    pub base_url: String,
    pub knowledge_base_id: Uuid,
    pub user_id: Uuid,
    pub status: JobStatus,
    pub max_pages: usize,
    /// Ordered for stable display; discovery ordering itself is unspecified.
    pub discovered_urls: BTreeSet<String>,
    pub selected_urls: BTreeSet<String>,
    pub scraped_urls: BTreeSet<String>,
    pub total_urls: usize,
    pub scraped_count: usize,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScrapeJob {
    #[must_use]
    pub fn new(base_url: String, knowledge_base_id: Uuid, user_id: Uuid, max_pages: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            base_url,
            knowledge_base_id,
            user_id,
            status: JobStatus::Discovering,
            max_pages,
            discovered_urls: BTreeSet::new(),
            selected_urls: BTreeSet::new(),
            scraped_urls: BTreeSet::new(),
            total_urls: 0,
            scraped_count: 0,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// A named corpus owning documents and their chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    /// Immutable once the knowledge base holds documents; mixing vectors
    /// from different models in one index is never allowed.
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl KnowledgeBase {
    #[must_use]
    pub fn new(workspace_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            name: name.into(),
            embedding_model: crate::embed::DEFAULT_EMBEDDING_MODEL.to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Processing,
    Completed,
    Failed,
}

/// One ingested page (or uploaded text) inside a knowledge base.
///
/// `(knowledge_base_id, source_url)` is unique when `source_url` is set;
/// re-ingesting a URL replaces the previous document, chunks first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub knowledge_base_id: Uuid,
    pub title: String,
    pub content: String,
    pub source_url: Option<String>,
    pub status: DocumentStatus,
    pub chunk_count: usize,
    pub error_message: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    #[must_use]
    pub fn new(knowledge_base_id: Uuid, title: String, content: String, source_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            knowledge_base_id,
            title,
            content,
            source_url,
            status: DocumentStatus::Processing,
            chunk_count: 0,
            error_message: None,
            metadata: serde_json::Map::new(),
            tags: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }
}

/// A contiguous slice of a document's text with its embedding; the unit of
/// retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: usize,
    pub content: String,
    /// Char offsets into the parent document's content;
    /// `start_char < end_char <= content.chars().count()`.
    pub start_char: usize,
    pub end_char: usize,
    pub embedding: Vec<f32>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Minimal user record backing the operator commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
    pub email_verified: bool,
}

/// One retrieval result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: Uuid,
    pub content: String,
    /// Cosine similarity: `1 - distance`, in `[-1, 1]`.
    pub score: f32,
    pub document_title: String,
    pub source_url: Option<String>,
}
