//! Page-source port: how the crawler and the ingestion pipeline obtain
//! rendered pages.
//!
//! The production implementation drives a headless browser
//! ([`crate::browser::BrowserPageSource`]); tests substitute a fake serving
//! canned pages. Either way the caller sees fully rendered HTML with
//! client-side content present.

use async_trait::async_trait;

use crate::error::Result;

/// What the fetch is for; ingestion tolerates slower pages and skips the
/// load-more interaction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Discovery,
    Ingestion,
}

/// A rendered page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL after redirects.
    pub final_url: String,
    /// MIME type as the document reports it, e.g. `text/html`.
    pub content_type: Option<String>,
    /// Serialized DOM after rendering and (for discovery) interaction.
    pub html: String,
    /// Raw `href` attributes of every anchor on the page, unresolved.
    pub hrefs: Vec<String>,
}

/// Produces rendered pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Render `url` and return the page. A failure covers exactly this URL;
    /// callers decide whether to retry or skip.
    async fn fetch(&self, url: &str, kind: FetchKind) -> Result<RenderedPage>;

    /// Release underlying resources. Idempotent.
    async fn shutdown(&self);
}
