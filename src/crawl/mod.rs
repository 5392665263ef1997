//! Same-origin discovery: BFS over the link graph from a seed URL.

mod discovery;
mod links;

pub use discovery::{discover, DiscoveryOutcome};
pub use links::{normalize_candidate, script_urls};

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::config::CrawlConfig;
use crate::error::Result;
use crate::job::JobEvent;
use crate::source::PageSource;
use crate::store::JobStore;

/// Run discovery for a job and settle its state.
///
/// On success the job moves to `Pending` with the discovered set. If
/// discovery fails catastrophically (browser unavailable), the job still
/// moves to `Pending` — with the base URL as the only discovered URL — so
/// the operator keeps control instead of facing a dead `Failed` job.
pub async fn run_discovery(
    source: &dyn PageSource,
    config: &CrawlConfig,
    jobs: Arc<dyn JobStore>,
    job_id: Uuid,
) -> Result<()> {
    let job = jobs.find_job(job_id).await?;
    let max_pages = config.effective_max_pages(job.max_pages);

    let discovered = match discover(
        source,
        config,
        &job.base_url,
        max_pages,
        Some((job_id, Arc::clone(&jobs))),
    )
    .await
    {
        Ok(outcome) => {
            info!(
                job = %job_id,
                urls = outcome.urls.len(),
                pages = outcome.pages_visited,
                "discovery complete"
            );
            outcome.urls
        }
        Err(e) => {
            error!(job = %job_id, "discovery failed, degrading to base URL: {e}");
            BTreeSet::from([job.base_url.clone()])
        }
    };

    jobs.apply_event(job_id, JobEvent::DiscoveryFinished { discovered })
        .await?;
    Ok(())
}
