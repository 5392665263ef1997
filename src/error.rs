//! Error taxonomy for discovery, ingestion, and retrieval.
//!
//! Per-URL failures stay local to the URL, per-document failures taint one
//! document, and only a catastrophic discovery failure degrades the job —
//! and then to `Pending` with a base-URL fallback, never straight to
//! `Failed`. See the propagation rules on each variant.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// A single URL failed to load. Retried up to [`crate::config::SCRAPE_RETRIES`]
    /// times within a scrape, then the URL is skipped with a warning.
    #[error("transient network failure for {url}: {message}")]
    TransientNetwork { url: String, message: String },

    /// Extraction yielded fewer than the minimum useful characters; the URL
    /// is skipped without writing a document.
    #[error("extraction produced no usable content for {url}")]
    EmptyExtract { url: String },

    /// The embedding service failed; fails the enclosing document.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The browser could not be launched, or died and restarts are
    /// exhausted. Discovery degrades the job to `Pending` with the base URL
    /// as the only discovered URL; ingestion fails the current document and
    /// moves on.
    #[error("browser unavailable: {0}")]
    BrowserUnavailable(String),

    /// A store operation failed. Ingestion logs and continues with the next
    /// URL; the job only fails if every remaining URL fails.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Entity lookup missed.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A request violated an invariant (selection outside the discovered
    /// set, embedding-model change on a populated knowledge base, illegal
    /// job transition).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed input from the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl HarvestError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    /// Whether a scrape attempt that produced this error is worth retrying.
    ///
    /// Mirrors the split between transient transport problems and permanent
    /// content/contract problems: only the former get another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransientNetwork { .. } | Self::BrowserUnavailable(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HarvestError>;
