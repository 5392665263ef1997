//! Operator binary: run an end-to-end ingestion against the in-memory
//! backend, plus the maintenance commands wired through the admin port.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use siteharvest::browser::{BrowserPageSource, BrowserPool};
use siteharvest::config::CrawlConfig;
use siteharvest::crawl;
use siteharvest::embed::{OpenAiEmbedder, DEFAULT_EMBEDDING_DIMENSION};
use siteharvest::model::{KnowledgeBase, ScrapeJob};
use siteharvest::pipeline::IngestionPipeline;
use siteharvest::retrieval::Retriever;
use siteharvest::store::memory::MemoryStore;
use siteharvest::store::{AdminStore, JobStore, KnowledgeBaseStore};

#[derive(Parser)]
#[command(name = "siteharvest", about = "Ingest websites into a searchable knowledge base")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover, scrape, and embed a site, then optionally query it.
    Ingest {
        /// Seed URL; discovery never leaves its host.
        #[arg(long)]
        url: String,
        /// Page cap for discovery (0 uses the default of 500).
        #[arg(long, default_value_t = 0)]
        max_pages: usize,
        /// Query to run against the ingested content afterwards.
        #[arg(long)]
        query: Option<String>,
        /// Run the browser with a visible window.
        #[arg(long)]
        headed: bool,
    },
    /// Promote a user to admin.
    GrantAdmin {
        #[arg(long)]
        email: String,
    },
    /// Mark every user's email as verified.
    VerifyUsers,
    /// Drop all rows from every table.
    Truncate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let store = Arc::new(MemoryStore::new(DEFAULT_EMBEDDING_DIMENSION));

    match cli.command {
        Command::Ingest {
            url,
            max_pages,
            query,
            headed,
        } => ingest(store, url, max_pages, query, headed).await?,
        Command::GrantAdmin { email } => {
            store.grant_admin(&email).await?;
            info!(email, "admin granted");
        }
        Command::VerifyUsers => {
            let changed = store.verify_all_users().await?;
            info!(changed, "users verified");
        }
        Command::Truncate => {
            store.truncate_all().await?;
            info!("all tables truncated");
        }
    }

    Ok(())
}

async fn ingest(
    store: Arc<MemoryStore>,
    url: String,
    max_pages: usize,
    query: Option<String>,
    headed: bool,
) -> Result<()> {
    let config = CrawlConfig::builder().headless(!headed).build();
    let pool = BrowserPool::new(config.clone());
    let source = Arc::new(BrowserPageSource::new(Arc::clone(&pool), config.clone()));
    let embedder = Arc::new(OpenAiEmbedder::from_env()?);

    let kb = store
        .create_knowledge_base(KnowledgeBase::new(Uuid::new_v4(), "cli"))
        .await?;
    let job = store
        .create_job(ScrapeJob::new(url, kb.id, Uuid::new_v4(), max_pages))
        .await?;

    crawl::run_discovery(source.as_ref(), &config, store.clone(), job.id).await?;
    let discovered = store.find_job(job.id).await?;
    info!(urls = discovered.discovered_urls.len(), "discovery finished");

    let pipeline = IngestionPipeline {
        source: source.clone(),
        embedder: embedder.clone(),
        jobs: store.clone(),
        documents: store.clone(),
        knowledge_bases: store.clone(),
        vectors: store.clone(),
        config,
    };

    pipeline.select_all(job.id).await?;
    let report = pipeline.run(job.id).await?;
    println!("ingestion: {report}");

    if let Some(query) = query {
        let retriever = Retriever {
            knowledge_bases: store.clone(),
            documents: store.clone(),
            vectors: store.clone(),
            embedder,
        };
        for hit in retriever.search(kb.id, &query, 5).await? {
            println!(
                "{:.3}  {}  {}",
                hit.score,
                hit.document_title,
                hit.source_url.unwrap_or_default()
            );
        }
    }

    pool.shutdown().await;
    Ok(())
}
