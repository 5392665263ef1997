//! siteharvest: ingest public websites into a searchable knowledge base.
//!
//! Pipeline: discover same-origin content pages in a real browser, extract
//! the primary text, chunk it with semantic-boundary alignment, embed each
//! chunk, and persist documents and chunks for cosine-similarity retrieval.

pub mod browser;
pub mod chunker;
pub mod classify;
pub mod config;
pub mod crawl;
pub mod embed;
pub mod error;
pub mod extract;
pub mod job;
pub mod model;
pub mod pipeline;
pub mod retrieval;
pub mod source;
pub mod store;

pub use browser::{BrowserPageSource, BrowserPool};
pub use chunker::{chunk_text, Chunk};
pub use classify::is_likely_content_url;
pub use config::{CrawlConfig, CrawlConfigBuilder};
pub use crawl::{discover, run_discovery, DiscoveryOutcome};
pub use embed::{
    EmbeddingService, OpenAiEmbedder, DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL,
};
pub use error::{HarvestError, Result};
pub use extract::{extract, MainContent, PageExtract};
pub use job::{apply as apply_job_event, JobEvent};
pub use model::{
    Document, DocumentChunk, DocumentStatus, JobStatus, KnowledgeBase, ScrapeJob, SearchHit,
};
pub use pipeline::{delete_document, IngestionPipeline, IngestionReport};
pub use retrieval::{cosine_distance, Retriever};
pub use source::{FetchKind, PageSource, RenderedPage};
