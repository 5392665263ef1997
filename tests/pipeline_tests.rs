//! End-to-end ingestion against the in-memory backend with fakes for the
//! browser and the embedding service.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{article_html, body_of_length, FakeEmbedder, FakePage, FakePageSource};
use siteharvest::config::CrawlConfig;
use siteharvest::error::HarvestError;
use siteharvest::job::JobEvent;
use siteharvest::model::{DocumentStatus, JobStatus, KnowledgeBase, ScrapeJob};
use siteharvest::pipeline::{delete_document, IngestionPipeline};
use siteharvest::store::memory::MemoryStore;
use siteharvest::store::{DocumentStore, JobStore, KnowledgeBaseStore, VectorStore};
use uuid::Uuid;

const DIM: usize = 8;

struct Harness {
    store: Arc<MemoryStore>,
    source: Arc<FakePageSource>,
    pipeline: IngestionPipeline,
    kb: KnowledgeBase,
}

async fn harness(source: FakePageSource, embedder: FakeEmbedder) -> Harness {
    let store = Arc::new(MemoryStore::new(DIM));
    let mut kb = KnowledgeBase::new(Uuid::new_v4(), "test-kb");
    kb.chunk_size = 500;
    kb.chunk_overlap = 100;
    let kb = store.create_knowledge_base(kb).await.unwrap();

    let source = Arc::new(source);
    let pipeline = IngestionPipeline {
        source: source.clone(),
        embedder: embedder.shared(),
        jobs: store.clone(),
        documents: store.clone(),
        knowledge_bases: store.clone(),
        vectors: store.clone(),
        config: CrawlConfig::default(),
    };

    Harness {
        store,
        source,
        pipeline,
        kb,
    }
}

/// Create a job already holding a discovered set, selected in full.
async fn in_progress_job(h: &Harness, urls: &[&str]) -> ScrapeJob {
    let job = h
        .store
        .create_job(ScrapeJob::new(
            urls[0].to_string(),
            h.kb.id,
            Uuid::new_v4(),
            0,
        ))
        .await
        .unwrap();
    let discovered: BTreeSet<String> = urls.iter().map(|s| (*s).to_string()).collect();
    h.store
        .apply_event(job.id, JobEvent::DiscoveryFinished { discovered })
        .await
        .unwrap();
    h.pipeline.select_all(job.id).await.unwrap()
}

#[tokio::test]
async fn happy_path_three_chunks() {
    // ~1200 extracted chars at chunk_size 500 / overlap 100 make exactly
    // three chunks at indices 0, 1, 2.
    let source = FakePageSource::new().with_page(
        "https://site.test/doc",
        FakePage::html(article_html("Doc", &body_of_length(1200))),
    );
    let h = harness(source, FakeEmbedder::new(DIM)).await;
    let job = in_progress_job(&h, &["https://site.test/doc"]).await;

    let report = h.pipeline.run(job.id).await.unwrap();
    assert_eq!(report.succeeded, 1);

    let job = h.store.find_job(job.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.scraped_count, 1);
    assert!(job.completed_at.is_some());

    let docs = h.store.list_documents(h.kb.id).await.unwrap();
    assert_eq!(docs.len(), 1);
    let doc = &docs[0];
    assert_eq!(doc.status, DocumentStatus::Completed);
    assert_eq!(doc.chunk_count, 3);
    assert_eq!(doc.title, "Doc");
    assert_eq!(doc.source_url.as_deref(), Some("https://site.test/doc"));
    assert_eq!(h.store.count_chunks(doc.id).await.unwrap(), 3);

    // Chunk indices form a prefix of the naturals and offsets are ordered.
    let matches = h
        .store
        .nearest_by_cosine(h.kb.id, &vec![0.1; DIM], 10)
        .await
        .unwrap();
    let mut indices: Vec<usize> = matches.iter().map(|m| m.chunk_index).collect();
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn failure_of_one_url_is_isolated() {
    // Five URLs, the third always errors: four documents, scraped_count 4,
    // job COMPLETED.
    let urls: Vec<String> = (1..=5).map(|i| format!("https://site.test/p{i}")).collect();
    let mut source = FakePageSource::new();
    for (i, url) in urls.iter().enumerate() {
        if i == 2 {
            source = source.with_failing(url);
        } else {
            source = source.with_page(
                url,
                FakePage::html(article_html(&format!("P{i}"), &body_of_length(800))),
            );
        }
    }
    let h = harness(source, FakeEmbedder::new(DIM)).await;
    let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let job = in_progress_job(&h, &url_refs).await;

    let report = h.pipeline.run(job.id).await.unwrap();
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed, 1);

    let job = h.store.find_job(job.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.scraped_count, 4);

    let docs = h.store.list_documents(h.kb.id).await.unwrap();
    assert_eq!(docs.len(), 4, "the failing URL leaves no document behind");
    assert!(docs.iter().all(|d| d.source_url.as_deref() != Some(urls[2].as_str())));

    // Initial attempt plus two retries.
    assert_eq!(h.source.fetch_count(&urls[2]).await, 3);
}

#[tokio::test]
async fn embedding_failure_fails_only_that_document() {
    let poison = format!("{} poisoned-marker {}", body_of_length(300), body_of_length(600));
    let source = FakePageSource::new()
        .with_page(
            "https://site.test/bad",
            FakePage::html(article_html("Bad", &poison)),
        )
        .with_page(
            "https://site.test/good",
            FakePage::html(article_html("Good", &body_of_length(800))),
        );
    let h = harness(source, FakeEmbedder::new(DIM).with_failure_on("poisoned-marker")).await;
    let job = in_progress_job(&h, &["https://site.test/bad", "https://site.test/good"]).await;

    let report = h.pipeline.run(job.id).await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);

    let job = h.store.find_job(job.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.scraped_count, 1);

    let bad = h
        .store
        .find_document_by_url(h.kb.id, "https://site.test/bad")
        .await
        .unwrap()
        .expect("failed document is still recorded");
    assert_eq!(bad.status, DocumentStatus::Failed);
    assert!(bad.error_message.as_deref().unwrap_or_default().contains("poisoned-marker"));

    let good = h
        .store
        .find_document_by_url(h.kb.id, "https://site.test/good")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(good.status, DocumentStatus::Completed);
}

#[tokio::test]
async fn all_urls_failing_fails_the_job() {
    let source = FakePageSource::new()
        .with_failing("https://site.test/a")
        .with_failing("https://site.test/b");
    let h = harness(source, FakeEmbedder::new(DIM)).await;
    let job = in_progress_job(&h, &["https://site.test/a", "https://site.test/b"]).await;

    let report = h.pipeline.run(job.id).await.unwrap();
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.failed, 2);

    let job = h.store.find_job(job.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.is_some());
}

#[tokio::test]
async fn empty_pages_are_skipped_without_documents() {
    let source = FakePageSource::new()
        .with_page(
            "https://site.test/empty",
            FakePage::html("<html><body><p>.</p></body></html>"),
        )
        .with_page(
            "https://site.test/full",
            FakePage::html(article_html("Full", &body_of_length(700))),
        );
    let h = harness(source, FakeEmbedder::new(DIM)).await;
    let job = in_progress_job(&h, &["https://site.test/empty", "https://site.test/full"]).await;

    let report = h.pipeline.run(job.id).await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped_empty, 1);
    assert_eq!(report.failed, 0);

    let job = h.store.find_job(job.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    let docs = h.store.list_documents(h.kb.id).await.unwrap();
    assert_eq!(docs.len(), 1);
}

#[tokio::test]
async fn reingesting_a_url_replaces_the_document() {
    let url = "https://site.test/doc";
    let source = FakePageSource::new().with_page(
        url,
        FakePage::html(article_html("Doc", &body_of_length(900))),
    );
    let h = harness(source, FakeEmbedder::new(DIM)).await;

    let first_job = in_progress_job(&h, &[url]).await;
    h.pipeline.run(first_job.id).await.unwrap();
    let first_doc = h
        .store
        .find_document_by_url(h.kb.id, url)
        .await
        .unwrap()
        .unwrap();

    let second_job = in_progress_job(&h, &[url]).await;
    h.pipeline.run(second_job.id).await.unwrap();

    let docs = h.store.list_documents(h.kb.id).await.unwrap();
    assert_eq!(docs.len(), 1, "one document per source URL");
    let second_doc = &docs[0];
    assert_ne!(second_doc.id, first_doc.id);
    // The replaced document's chunks went with it.
    assert_eq!(h.store.count_chunks(first_doc.id).await.unwrap(), 0);
    assert!(h.store.count_chunks(second_doc.id).await.unwrap() > 0);
}

#[tokio::test]
async fn deleting_a_document_removes_exactly_its_chunks() {
    let source = FakePageSource::new()
        .with_page(
            "https://site.test/a",
            FakePage::html(article_html("A", &body_of_length(900))),
        )
        .with_page(
            "https://site.test/b",
            FakePage::html(article_html("B", &body_of_length(900))),
        );
    let h = harness(source, FakeEmbedder::new(DIM)).await;
    let job = in_progress_job(&h, &["https://site.test/a", "https://site.test/b"]).await;
    h.pipeline.run(job.id).await.unwrap();

    assert_eq!(h.store.list_documents(h.kb.id).await.unwrap().len(), 2);
    let a = h
        .store
        .find_document_by_url(h.kb.id, "https://site.test/a")
        .await
        .unwrap()
        .unwrap();
    let b = h
        .store
        .find_document_by_url(h.kb.id, "https://site.test/b")
        .await
        .unwrap()
        .unwrap();
    let b_chunks = h.store.count_chunks(b.id).await.unwrap();
    assert!(b_chunks > 0);

    delete_document(h.store.as_ref(), h.store.as_ref(), a.id).await.unwrap();

    assert_eq!(h.store.count_chunks(a.id).await.unwrap(), 0);
    assert_eq!(h.store.count_chunks(b.id).await.unwrap(), b_chunks, "bystander untouched");
    assert!(matches!(
        h.store.find_document(a.id).await,
        Err(HarvestError::NotFound { .. })
    ));
}

#[tokio::test]
async fn selection_must_come_from_discovered_urls() {
    let h = harness(FakePageSource::new(), FakeEmbedder::new(DIM)).await;
    let job = h
        .store
        .create_job(ScrapeJob::new(
            "https://site.test/".to_string(),
            h.kb.id,
            Uuid::new_v4(),
            0,
        ))
        .await
        .unwrap();
    h.store
        .apply_event(
            job.id,
            JobEvent::DiscoveryFinished {
                discovered: BTreeSet::from(["https://site.test/".to_string()]),
            },
        )
        .await
        .unwrap();

    let err = h
        .pipeline
        .submit_selection(job.id, BTreeSet::from(["https://elsewhere.test/x".to_string()]))
        .await
        .unwrap_err();
    assert!(matches!(err, HarvestError::Conflict(_)));
}

#[tokio::test]
async fn externally_failed_job_aborts_between_pages() {
    // The job is flipped to FAILED before the run starts; the worker must
    // observe it and ingest nothing.
    let source = FakePageSource::new().with_page(
        "https://site.test/doc",
        FakePage::html(article_html("Doc", &body_of_length(900))),
    );
    let h = harness(source, FakeEmbedder::new(DIM)).await;
    let job = in_progress_job(&h, &["https://site.test/doc"]).await;

    h.store
        .apply_event(
            job.id,
            JobEvent::Failed {
                message: "cancelled by operator".to_string(),
            },
        )
        .await
        .unwrap();

    let report = h.pipeline.run(job.id).await.unwrap_err();
    // A FAILED job is terminal; running it is a conflict.
    assert!(matches!(report, HarvestError::Conflict(_)));
    assert_eq!(h.store.list_documents(h.kb.id).await.unwrap().len(), 0);
}
