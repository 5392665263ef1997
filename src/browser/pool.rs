//! Shared browser pool: one lazily launched browser process, a capped number
//! of concurrent pages, and per-page request interception.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CrawlConfig;
use crate::error::{HarvestError, Result};

use super::setup::launch_browser;

struct BrowserHandle {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
}

/// Process-wide browser pool shared by every job.
///
/// The browser launches lazily on the first page request and is relaunched
/// if its process dies. At most [`CrawlConfig::max_concurrent_pages`] pages
/// exist at once; further callers wait for capacity.
pub struct BrowserPool {
    config: CrawlConfig,
    /// Also the launch guard: at most one launch is ever in flight.
    browser: Mutex<Option<BrowserHandle>>,
    pages: Arc<Semaphore>,
    shut_down: AtomicBool,
}

impl BrowserPool {
    #[must_use]
    pub fn new(config: CrawlConfig) -> Arc<Self> {
        let pages = Arc::new(Semaphore::new(config.max_concurrent_pages()));
        Arc::new(Self {
            config,
            browser: Mutex::new(None),
            pages,
            shut_down: AtomicBool::new(false),
        })
    }

    /// Get a fresh page with request interception installed.
    ///
    /// Blocks while the pool is at its page cap. Fails with
    /// [`HarvestError::BrowserUnavailable`] when the browser cannot be
    /// launched or relaunched.
    pub async fn get_page(&self) -> Result<PageGuard> {
        if self.shut_down.load(Ordering::Relaxed) {
            return Err(HarvestError::BrowserUnavailable(
                "pool is shut down".to_string(),
            ));
        }

        let permit = self
            .pages
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| HarvestError::BrowserUnavailable("pool is shut down".to_string()))?;

        let browser = self.ensure_browser().await?;

        let page = browser.new_page("about:blank").await.map_err(|e| {
            HarvestError::BrowserUnavailable(format!("failed to open page: {e}"))
        })?;

        if let Err(e) = install_interception(&page).await {
            // A page without interception still renders; it just fetches
            // assets the crawler does not need.
            warn!("failed to install request interception: {e}");
        }

        Ok(PageGuard {
            page: Some(page),
            _permit: permit,
        })
    }

    /// Return the live browser, launching or relaunching under the guard.
    async fn ensure_browser(&self) -> Result<Arc<Browser>> {
        let mut slot = self.browser.lock().await;

        if let Some(handle) = slot.as_ref() {
            match handle.browser.version().await {
                Ok(_) => return Ok(Arc::clone(&handle.browser)),
                Err(e) => {
                    warn!("browser failed liveness check, relaunching: {e}");
                    if let Some(dead) = slot.take() {
                        dead.handler.abort();
                    }
                }
            }
        }

        let (browser, handler) = launch_browser(
            self.config.headless(),
            self.config.browser_executable().map(Into::into),
        )
        .await
        .map_err(|e| HarvestError::BrowserUnavailable(format!("{e:#}")))?;

        info!("browser launched");
        let browser = Arc::new(browser);
        *slot = Some(BrowserHandle {
            browser: Arc::clone(&browser),
            handler,
        });
        Ok(browser)
    }

    /// Close the browser and every page. Idempotent.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::Relaxed) {
            return;
        }
        info!("shutting down browser pool");
        self.pages.close();

        let mut slot = self.browser.lock().await;
        if let Some(handle) = slot.take() {
            handle.handler.abort();
            match Arc::try_unwrap(handle.browser) {
                Ok(mut browser) => {
                    if let Err(e) = browser.close().await {
                        warn!("failed to close browser: {e}");
                    }
                    let _ = browser.wait().await;
                }
                Err(arc) => {
                    warn!(
                        "browser still has {} references, closing on drop",
                        Arc::strong_count(&arc)
                    );
                }
            }
        }
        info!("browser pool shutdown complete");
    }
}

/// Abort asset requests so only the DOM and scripts are fetched.
async fn install_interception(page: &Page) -> anyhow::Result<()> {
    page.execute(EnableParams::default()).await?;

    let mut paused = page.event_listener::<EventRequestPaused>().await?;
    let page_handle = page.clone();

    tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let blocked = matches!(
                event.resource_type,
                ResourceType::Image
                    | ResourceType::Font
                    | ResourceType::Stylesheet
                    | ResourceType::Media
            );

            let outcome = if blocked {
                match FailRequestParams::builder()
                    .request_id(event.request_id.clone())
                    .error_reason(ErrorReason::Aborted)
                    .build()
                {
                    Ok(params) => page_handle.execute(params).await.map(|_| ()),
                    Err(e) => {
                        debug!("fail-request params build failed: {e}");
                        continue;
                    }
                }
            } else {
                match ContinueRequestParams::builder()
                    .request_id(event.request_id.clone())
                    .build()
                {
                    Ok(params) => page_handle.execute(params).await.map(|_| ()),
                    Err(e) => {
                        debug!("continue-request params build failed: {e}");
                        continue;
                    }
                }
            };

            if outcome.is_err() {
                // The page is gone; the listener has nothing left to serve.
                break;
            }
        }
    });

    Ok(())
}

/// RAII page handle: closes the page and frees pool capacity on drop.
/// Dropping a guard never affects sibling pages.
pub struct PageGuard {
    page: Option<Page>,
    _permit: OwnedSemaphorePermit,
}

impl PageGuard {
    #[must_use]
    pub fn page(&self) -> &Page {
        self.page
            .as_ref()
            .expect("page is present until the guard drops")
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            tokio::spawn(async move {
                if let Err(e) = page.close().await {
                    debug!("page close failed: {e}");
                }
            });
        }
    }
}
