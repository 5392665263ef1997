//! Heuristic main-content extraction from rendered HTML.
//!
//! The extractor is a pipeline of pure transforms over a parsed DOM: strip
//! boilerplate, pick a main-content candidate, render its structure
//! (headings, paragraphs, lists, tables), then fall back document-wide when
//! the candidate is thin. Re-running it on identical HTML yields identical
//! output.

mod content;
mod dom;

pub use content::extract;

/// Minimum visible text for a selector-matched candidate to win.
pub const MIN_MAIN_CONTENT_CHARS: usize = 200;
/// Text-to-markup ratio floor for the scored candidate search; filters
/// nav-heavy containers whose markup dwarfs their text.
pub const TEXT_RATIO_MIN: f64 = 0.1;
/// Below this, the candidate is replaced by document-wide paragraphs+lists.
pub const PARAGRAPH_FALLBACK_MIN: usize = 500;
/// Below this, the full body text is used.
pub const BODY_FALLBACK_MIN: usize = 100;
/// Hard cap on extracted content.
pub const CONTENT_CAP: usize = 50_000;
/// Final content shorter than this means the page is empty and is skipped.
pub const EMPTY_THRESHOLD: usize = 20;
/// Paragraphs shorter than this are noise (button labels, bylines).
pub const MIN_PARAGRAPH_CHARS: usize = 30;
/// Title cap after whitespace normalization.
pub const TITLE_MAX_CHARS: usize = 200;
/// Description cap.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Where the extracted content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainContent {
    /// One of the known content selectors matched with enough text.
    Selector,
    /// Best-scoring container under the text-to-markup ratio filter.
    Scored,
    /// Document-wide paragraphs and lists.
    FallbackParagraphs,
    /// Whole-body text, last resort.
    FallbackBody,
    /// Nothing usable; the caller skips the page.
    Empty,
}

/// Extraction result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExtract {
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub source: MainContent,
}

impl PageExtract {
    /// True when the page produced no usable content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.chars().count() < EMPTY_THRESHOLD
    }
}
