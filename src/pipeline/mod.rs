//! Ingestion pipeline: for each selected URL, scrape → extract → chunk →
//! embed → persist.
//!
//! Failure isolation: a scrape failure skips the URL (no document is
//! written), an embedding or storage failure fails that one document, and
//! the job itself only fails when every selected URL failed.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chunker::chunk_text;
use crate::config::CrawlConfig;
use crate::embed::EmbeddingService;
use crate::error::{HarvestError, Result};
use crate::extract::{self, PageExtract};
use crate::job::JobEvent;
use crate::model::{Document, DocumentChunk, DocumentStatus, JobStatus, KnowledgeBase, ScrapeJob};
use crate::source::{FetchKind, PageSource, RenderedPage};
use crate::store::{DocumentStore, JobStore, KnowledgeBaseStore, VectorStore};

/// Outcome of one ingestion run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestionReport {
    pub selected: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_empty: usize,
}

impl std::fmt::Display for IngestionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} selected, {} ingested, {} failed, {} empty",
            self.selected, self.succeeded, self.failed, self.skipped_empty
        )
    }
}

/// Delete a document and exactly its chunks, chunks first so a crash never
/// leaves orphaned vectors behind a missing document row.
pub async fn delete_document(
    documents: &dyn DocumentStore,
    vectors: &dyn VectorStore,
    document_id: Uuid,
) -> Result<()> {
    let removed = vectors.delete_chunks_by_document(document_id).await?;
    debug!(document = %document_id, removed, "chunks deleted");
    documents.delete_document(document_id).await
}

/// The ingestion worker and its collaborators.
pub struct IngestionPipeline {
    pub source: Arc<dyn PageSource>,
    pub embedder: Arc<dyn EmbeddingService>,
    pub jobs: Arc<dyn JobStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub knowledge_bases: Arc<dyn KnowledgeBaseStore>,
    pub vectors: Arc<dyn VectorStore>,
    pub config: CrawlConfig,
}

impl IngestionPipeline {
    /// Move a `Pending` job to `InProgress` with the given URL selection.
    /// URLs outside the discovered set are a conflict.
    pub async fn submit_selection(
        &self,
        job_id: Uuid,
        selected: BTreeSet<String>,
    ) -> Result<ScrapeJob> {
        self.jobs
            .apply_event(job_id, JobEvent::SelectionSubmitted { selected })
            .await
    }

    /// Convenience selector: every discovered URL.
    pub async fn select_all(&self, job_id: Uuid) -> Result<ScrapeJob> {
        let job = self.jobs.find_job(job_id).await?;
        self.submit_selection(job_id, job.discovered_urls).await
    }

    /// Ingest every selected URL of an `InProgress` job, then settle the job
    /// to `Completed` (or `Failed`, when nothing at all succeeded).
    pub async fn run(&self, job_id: Uuid) -> Result<IngestionReport> {
        let job = self.jobs.find_job(job_id).await?;
        if job.status != JobStatus::InProgress {
            return Err(HarvestError::Conflict(format!(
                "job {job_id} is {:?}, expected IN_PROGRESS",
                job.status
            )));
        }
        let kb = self
            .knowledge_bases
            .find_knowledge_base(job.knowledge_base_id)
            .await?;

        let mut report = IngestionReport {
            selected: job.selected_urls.len(),
            ..IngestionReport::default()
        };

        for url in &job.selected_urls {
            // Observe external cancellation between pages.
            match self.jobs.find_job(job_id).await {
                Ok(current) if current.status == JobStatus::Failed => {
                    info!(job = %job_id, "job failed externally, aborting ingestion");
                    return Ok(report);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(job = %job_id, "could not re-read job: {e}");
                }
            }

            match self.ingest_url(&kb, url).await {
                Ok(IngestOutcome::Completed(document)) => {
                    report.succeeded += 1;
                    if let Err(e) = self
                        .jobs
                        .apply_event(job_id, JobEvent::PageScraped { url: url.clone() })
                        .await
                    {
                        warn!(job = %job_id, %url, "scrape-count update failed: {e}");
                    }
                    info!(%url, document = %document.id, chunks = document.chunk_count, "ingested");
                }
                Ok(IngestOutcome::SkippedEmpty) => {
                    report.skipped_empty += 1;
                    info!(%url, "skipped: no usable content");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(%url, "ingestion failed: {e}");
                }
            }
        }

        let event = if report.succeeded == 0 && report.failed > 0 && report.failed == report.selected
        {
            JobEvent::Failed {
                message: format!("all {} selected URLs failed", report.selected),
            }
        } else {
            JobEvent::IngestionFinished
        };
        self.jobs.apply_event(job_id, event).await?;

        info!(job = %job_id, %report, "ingestion run finished");
        Ok(report)
    }

    /// Scrape, extract, and persist one URL into the knowledge base.
    async fn ingest_url(&self, kb: &KnowledgeBase, url: &str) -> Result<IngestOutcome> {
        let page = self.scrape_with_retries(url).await?;
        let extracted = extract::extract(&page.html);
        if extracted.is_empty() {
            return Ok(IngestOutcome::SkippedEmpty);
        }

        // At most one document per source URL: a re-ingest replaces the
        // previous document, chunks first.
        if let Some(existing) = self.documents.find_document_by_url(kb.id, url).await? {
            debug!(url, document = %existing.id, "replacing existing document");
            delete_document(self.documents.as_ref(), self.vectors.as_ref(), existing.id).await?;
        }

        let document = self
            .documents
            .create_document(new_document(kb, url, &extracted))
            .await?;

        match self.embed_and_store(kb, &document).await {
            Ok(chunk_count) => {
                let document = self
                    .documents
                    .update_document_status(document.id, DocumentStatus::Completed, chunk_count, None)
                    .await?;
                Ok(IngestOutcome::Completed(document))
            }
            Err(e) => {
                // Partial chunks stay until the document is retried or
                // deleted; only the status records the failure.
                let message = e.to_string();
                if let Err(update_err) = self
                    .documents
                    .update_document_status(document.id, DocumentStatus::Failed, 0, Some(message))
                    .await
                {
                    warn!(document = %document.id, "failed to record failure: {update_err}");
                }
                Err(e)
            }
        }
    }

    /// Chunk the document and persist each chunk with its embedding.
    /// Chunk indices are assigned in order and are contiguous from zero.
    async fn embed_and_store(&self, kb: &KnowledgeBase, document: &Document) -> Result<usize> {
        let chunks = chunk_text(&document.content, kb.chunk_size, kb.chunk_overlap);

        for (index, chunk) in chunks.iter().enumerate() {
            let embedding = self.embedder.embed(&chunk.content, &kb.embedding_model).await?;

            let mut metadata = serde_json::Map::new();
            metadata.insert(
                "chunkLength".to_string(),
                json!(chunk.content.chars().count()),
            );

            self.vectors
                .insert_chunk(DocumentChunk {
                    id: Uuid::new_v4(),
                    document_id: document.id,
                    chunk_index: index,
                    content: chunk.content.clone(),
                    start_char: chunk.start_char,
                    end_char: chunk.end_char,
                    embedding,
                    metadata,
                })
                .await?;
        }

        Ok(chunks.len())
    }

    /// Fetch with the ingestion timeout, retrying transient failures.
    async fn scrape_with_retries(&self, url: &str) -> Result<RenderedPage> {
        let attempts = self.config.scrape_retries() + 1;
        let mut last_err = None;

        for attempt in 1..=attempts {
            match self.source.fetch(url, FetchKind::Ingestion).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(url, attempt, "scrape attempt failed, retrying: {e}");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| HarvestError::TransientNetwork {
            url: url.to_string(),
            message: "scrape attempts exhausted".to_string(),
        }))
    }
}

enum IngestOutcome {
    Completed(Document),
    SkippedEmpty,
}

fn new_document(kb: &KnowledgeBase, url: &str, extracted: &PageExtract) -> Document {
    let mut document = Document::new(
        kb.id,
        extracted.title.clone(),
        extracted.content.clone(),
        Some(url.to_string()),
    );
    if let Some(description) = &extracted.description {
        document
            .metadata
            .insert("description".to_string(), json!(description));
    }
    document
}
