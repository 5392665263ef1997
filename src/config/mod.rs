//! Crawl and ingestion configuration.
//!
//! Every heuristic threshold the pipeline relies on is a named constant
//! here with a builder override; nothing is inlined at a call site.

mod builder;
mod types;

pub use builder::CrawlConfigBuilder;
pub use types::CrawlConfig;

use std::time::Duration;

/// Hard cap on pages visited during discovery when the job asks for 0.
pub const DEFAULT_MAX_CRAWL_PAGES: usize = 500;
/// Navigation timeout during discovery.
pub const DISCOVERY_NAV_TIMEOUT: Duration = Duration::from_secs(15);
/// Navigation timeout during ingestion scrapes.
pub const INGEST_NAV_TIMEOUT: Duration = Duration::from_secs(20);
/// Settle time for client-side rendering after DOMContentLoaded.
pub const DYNAMIC_CONTENT_WAIT: Duration = Duration::from_secs(3);
/// Settle time after clicking load-more style controls.
pub const POST_CLICK_WAIT: Duration = Duration::from_secs(1);
/// Concurrent browser tabs across all jobs.
pub const MAX_CONCURRENT_PAGES: usize = 5;
/// Retries after the initial scrape attempt (3 attempts total).
pub const SCRAPE_RETRIES: usize = 2;
/// Discovery writes progress whenever this many new URLs accumulated.
pub const PROGRESS_BATCH: usize = 10;
