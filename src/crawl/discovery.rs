//! Breadth-first discovery over the same-origin link graph.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::classify::is_likely_content_url;
use crate::config::{CrawlConfig, DEFAULT_MAX_CRAWL_PAGES};
use crate::error::{HarvestError, Result};
use crate::job::JobEvent;
use crate::model::JobStatus;
use crate::source::{FetchKind, PageSource};
use crate::store::JobStore;

use super::links::{normalize_candidate, script_urls};

/// What a discovery run produced.
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    /// Every content URL found, the base URL always included. Ordering
    /// within the set is not part of the contract.
    pub urls: BTreeSet<String>,
    /// Pages actually rendered.
    pub pages_visited: usize,
}

/// Crawl breadth-first from `base_url`, never leaving its host, visiting at
/// most `max_pages` pages.
///
/// Individual page failures are logged and skipped. A browser-pool failure
/// propagates so the caller can degrade the job. When a `job` is supplied,
/// progress is written every [`CrawlConfig::progress_batch`] new URLs and
/// the job's status is re-read between pages so an external `Failed`
/// transition aborts the crawl cleanly.
pub async fn discover(
    source: &dyn PageSource,
    config: &CrawlConfig,
    base_url: &str,
    max_pages: usize,
    job: Option<(Uuid, Arc<dyn JobStore>)>,
) -> Result<DiscoveryOutcome> {
    let base = Url::parse(base_url)
        .map_err(|e| HarvestError::InvalidInput(format!("invalid base URL {base_url}: {e}")))?;
    let origin_host = base
        .host_str()
        .ok_or_else(|| HarvestError::InvalidInput(format!("base URL {base_url} has no host")))?
        .to_string();

    let seed = {
        let mut seed = base.clone();
        seed.set_fragment(None);
        seed.to_string()
    };

    let mut discovered: BTreeSet<String> = BTreeSet::from([seed.clone()]);
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::from([seed]);
    let mut last_reported = discovered.len();
    // The result set is bounded even when one hub page links everywhere.
    let discovered_cap = max_pages.max(DEFAULT_MAX_CRAWL_PAGES);

    info!(base = base_url, max_pages, "starting discovery");

    while let Some(url) = queue.pop_front() {
        if visited.len() >= max_pages {
            debug!("reached page cap of {max_pages}");
            break;
        }
        if !visited.insert(url.clone()) {
            continue;
        }

        if let Some((job_id, jobs)) = &job {
            if externally_failed(*job_id, jobs).await {
                info!(job = %job_id, "job failed externally, aborting discovery");
                break;
            }
        }

        let page = match source.fetch(&url, FetchKind::Discovery).await {
            Ok(page) => page,
            Err(e @ HarvestError::BrowserUnavailable(_)) => return Err(e),
            Err(e) => {
                warn!(url, "failed to fetch page, skipping: {e}");
                continue;
            }
        };

        if !is_likely_content_url(&url, page.content_type.as_deref()) {
            debug!(url, content_type = ?page.content_type, "content type rejected");
            continue;
        }

        let resolve_base = Url::parse(&page.final_url).unwrap_or_else(|_| base.clone());

        let mut candidates = page.hrefs;
        candidates.extend(script_urls(&page.html));

        let mut found = 0usize;
        for candidate in &candidates {
            if discovered.len() >= discovered_cap {
                break;
            }
            let Some(normalized) = normalize_candidate(candidate, &resolve_base, &origin_host)
            else {
                continue;
            };
            if !is_likely_content_url(&normalized, None) {
                continue;
            }
            if visited.contains(&normalized) || !discovered.insert(normalized.clone()) {
                continue;
            }
            queue.push_back(normalized);
            found += 1;
        }
        debug!(url, found, total = discovered.len(), "page processed");

        if let Some((job_id, jobs)) = &job {
            if discovered.len() - last_reported >= config.progress_batch() {
                last_reported = discovered.len();
                report_progress(*job_id, jobs, &discovered).await;
            }
        }
    }

    Ok(DiscoveryOutcome {
        pages_visited: visited.len(),
        urls: discovered,
    })
}

async fn externally_failed(job_id: Uuid, jobs: &Arc<dyn JobStore>) -> bool {
    match jobs.find_job(job_id).await {
        Ok(job) => job.status == JobStatus::Failed,
        Err(e) => {
            warn!(job = %job_id, "could not re-read job status: {e}");
            false
        }
    }
}

async fn report_progress(job_id: Uuid, jobs: &Arc<dyn JobStore>, discovered: &BTreeSet<String>) {
    let event = JobEvent::DiscoveryProgress {
        discovered: discovered.clone(),
    };
    if let Err(e) = jobs.apply_event(job_id, event).await {
        warn!(job = %job_id, "progress write failed: {e}");
    }
}
