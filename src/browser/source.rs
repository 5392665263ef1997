//! Browser-backed implementation of the page-source port.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::CrawlConfig;
use crate::error::{HarvestError, Result};
use crate::source::{FetchKind, PageSource, RenderedPage};

use super::js_scripts::{
    CLICK_LOAD_MORE_SCRIPT, COLLECT_HREFS_SCRIPT, CONTENT_TYPE_SCRIPT, SCROLL_TO_BOTTOM_SCRIPT,
};
use super::pool::BrowserPool;

/// Wrap a page operation with an explicit timeout so a wedged renderer can
/// never hang a worker.
async fn with_timeout<F, T>(operation: F, timeout: Duration, name: &str, url: &str) -> Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(HarvestError::TransientNetwork {
            url: url.to_string(),
            message: format!("{name} failed: {e}"),
        }),
        Err(_) => Err(HarvestError::TransientNetwork {
            url: url.to_string(),
            message: format!("{name} timed out after {}s", timeout.as_secs()),
        }),
    }
}

/// Fetches pages through the shared [`BrowserPool`].
pub struct BrowserPageSource {
    pool: Arc<BrowserPool>,
    config: CrawlConfig,
}

impl BrowserPageSource {
    #[must_use]
    pub fn new(pool: Arc<BrowserPool>, config: CrawlConfig) -> Self {
        Self { pool, config }
    }
}

#[async_trait]
impl PageSource for BrowserPageSource {
    async fn fetch(&self, url: &str, kind: FetchKind) -> Result<RenderedPage> {
        let guard = self.pool.get_page().await?;
        let page = guard.page();

        let timeout = match kind {
            FetchKind::Discovery => self.config.discovery_nav_timeout(),
            FetchKind::Ingestion => self.config.ingest_nav_timeout(),
        };

        with_timeout(
            async {
                page.goto(url).await.map_err(|e| anyhow::anyhow!("{e}"))?;
                Ok(())
            },
            timeout,
            "navigation",
            url,
        )
        .await?;

        with_timeout(
            async {
                page.wait_for_navigation()
                    .await
                    .map_err(|e| anyhow::anyhow!("{e}"))?;
                Ok(())
            },
            timeout,
            "page load",
            url,
        )
        .await?;

        let content_type: Option<String> = page
            .evaluate(CONTENT_TYPE_SCRIPT)
            .await
            .ok()
            .and_then(|result| result.into_value().ok());

        // Non-document responses (PDF viewers, JSON) have nothing to render
        // or interact with; hand back the MIME type and let the caller's
        // classifier reject the URL.
        if let Some(ct) = &content_type {
            let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            if mime != "text/html" && mime != "text/plain" {
                debug!(url, content_type = %ct, "skipping non-document response");
                return Ok(RenderedPage {
                    final_url: url.to_string(),
                    content_type,
                    html: String::new(),
                    hrefs: Vec::new(),
                });
            }
        }

        // Let client-side rendering settle.
        tokio::time::sleep(self.config.dynamic_content_wait()).await;

        if kind == FetchKind::Discovery {
            if let Err(e) = page.evaluate(SCROLL_TO_BOTTOM_SCRIPT).await {
                warn!(url, "scroll failed: {e}");
            }
            match page.evaluate(CLICK_LOAD_MORE_SCRIPT).await {
                Ok(result) => {
                    let clicked: i64 = result.into_value().unwrap_or(0);
                    if clicked > 0 {
                        debug!(url, clicked, "clicked load-more controls");
                    }
                }
                Err(e) => warn!(url, "load-more click failed: {e}"),
            }
            tokio::time::sleep(self.config.post_click_wait()).await;
        }

        let hrefs: Vec<String> = page
            .evaluate(COLLECT_HREFS_SCRIPT)
            .await
            .ok()
            .and_then(|result| result.into_value().ok())
            .unwrap_or_default();

        let html = with_timeout(
            async {
                page.content()
                    .await
                    .map_err(|e| anyhow::anyhow!("{e}"))
            },
            timeout,
            "content read",
            url,
        )
        .await?;

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(RenderedPage {
            final_url,
            content_type,
            html,
            hrefs,
        })
    }

    async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}
