//! Fluent builder for [`CrawlConfig`].

use std::path::PathBuf;
use std::time::Duration;

use super::types::CrawlConfig;

/// Builder with crate defaults for every field.
#[derive(Debug, Clone)]
pub struct CrawlConfigBuilder {
    config: CrawlConfig,
}

impl Default for CrawlConfigBuilder {
    fn default() -> Self {
        Self {
            config: CrawlConfig::default(),
        }
    }
}

impl CrawlConfigBuilder {
    #[must_use]
    pub fn max_crawl_pages(mut self, pages: usize) -> Self {
        self.config.max_crawl_pages = pages;
        self
    }

    #[must_use]
    pub fn discovery_nav_timeout(mut self, timeout: Duration) -> Self {
        self.config.discovery_nav_timeout = timeout;
        self
    }

    #[must_use]
    pub fn ingest_nav_timeout(mut self, timeout: Duration) -> Self {
        self.config.ingest_nav_timeout = timeout;
        self
    }

    #[must_use]
    pub fn dynamic_content_wait(mut self, wait: Duration) -> Self {
        self.config.dynamic_content_wait = wait;
        self
    }

    #[must_use]
    pub fn post_click_wait(mut self, wait: Duration) -> Self {
        self.config.post_click_wait = wait;
        self
    }

    #[must_use]
    pub fn max_concurrent_pages(mut self, pages: usize) -> Self {
        self.config.max_concurrent_pages = pages.max(1);
        self
    }

    #[must_use]
    pub fn scrape_retries(mut self, retries: usize) -> Self {
        self.config.scrape_retries = retries;
        self
    }

    #[must_use]
    pub fn progress_batch(mut self, batch: usize) -> Self {
        self.config.progress_batch = batch.max(1);
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Pin the browser executable instead of probing the system.
    #[must_use]
    pub fn browser_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.browser_executable = Some(path.into());
        self
    }

    #[must_use]
    pub fn build(self) -> CrawlConfig {
        self.config
    }
}
