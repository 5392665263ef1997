//! The `CrawlConfig` struct and its accessors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{
    DEFAULT_MAX_CRAWL_PAGES, DISCOVERY_NAV_TIMEOUT, DYNAMIC_CONTENT_WAIT, INGEST_NAV_TIMEOUT,
    MAX_CONCURRENT_PAGES, POST_CLICK_WAIT, PROGRESS_BATCH, SCRAPE_RETRIES,
};

/// Tuning knobs for discovery and ingestion.
///
/// Fields are private; construct with [`CrawlConfig::builder`] and read
/// through the accessors, so invariants hold everywhere a config travels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub(crate) max_crawl_pages: usize,
    pub(crate) discovery_nav_timeout: Duration,
    pub(crate) ingest_nav_timeout: Duration,
    pub(crate) dynamic_content_wait: Duration,
    pub(crate) post_click_wait: Duration,
    pub(crate) max_concurrent_pages: usize,
    pub(crate) scrape_retries: usize,
    pub(crate) progress_batch: usize,
    pub(crate) headless: bool,
    pub(crate) browser_executable: Option<std::path::PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_crawl_pages: DEFAULT_MAX_CRAWL_PAGES,
            discovery_nav_timeout: DISCOVERY_NAV_TIMEOUT,
            ingest_nav_timeout: INGEST_NAV_TIMEOUT,
            dynamic_content_wait: DYNAMIC_CONTENT_WAIT,
            post_click_wait: POST_CLICK_WAIT,
            max_concurrent_pages: MAX_CONCURRENT_PAGES,
            scrape_retries: SCRAPE_RETRIES,
            progress_batch: PROGRESS_BATCH,
            headless: true,
            browser_executable: None,
        }
    }
}

impl CrawlConfig {
    #[must_use]
    pub fn builder() -> super::CrawlConfigBuilder {
        super::CrawlConfigBuilder::default()
    }

    /// Effective discovery page cap for a job: a `max_pages` of 0 means
    /// "no preference", which resolves to the crate default; any other
    /// request passes through unchanged.
    #[must_use]
    pub fn effective_max_pages(&self, requested: usize) -> usize {
        if requested == 0 {
            self.max_crawl_pages
        } else {
            requested
        }
    }

    #[must_use]
    pub fn max_crawl_pages(&self) -> usize {
        self.max_crawl_pages
    }

    #[must_use]
    pub fn discovery_nav_timeout(&self) -> Duration {
        self.discovery_nav_timeout
    }

    #[must_use]
    pub fn ingest_nav_timeout(&self) -> Duration {
        self.ingest_nav_timeout
    }

    #[must_use]
    pub fn dynamic_content_wait(&self) -> Duration {
        self.dynamic_content_wait
    }

    #[must_use]
    pub fn post_click_wait(&self) -> Duration {
        self.post_click_wait
    }

    #[must_use]
    pub fn max_concurrent_pages(&self) -> usize {
        self.max_concurrent_pages
    }

    #[must_use]
    pub fn scrape_retries(&self) -> usize {
        self.scrape_retries
    }

    #[must_use]
    pub fn progress_batch(&self) -> usize {
        self.progress_batch
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn browser_executable(&self) -> Option<&std::path::Path> {
        self.browser_executable.as_deref()
    }
}
