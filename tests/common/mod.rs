//! Shared fakes for integration tests: a canned page source and a
//! deterministic embedder, substituted through the same ports the browser
//! and the OpenAI client implement.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use siteharvest::embed::EmbeddingService;
use siteharvest::error::{HarvestError, Result};
use siteharvest::source::{FetchKind, PageSource, RenderedPage};

/// One canned page.
#[derive(Debug, Clone)]
pub struct FakePage {
    pub html: String,
    pub hrefs: Vec<String>,
    pub content_type: Option<String>,
}

impl FakePage {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            hrefs: Vec::new(),
            content_type: Some("text/html".to_string()),
        }
    }

    pub fn with_hrefs(mut self, hrefs: &[&str]) -> Self {
        self.hrefs = hrefs.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

/// Page source serving a fixed site map, with failure injection.
#[derive(Default)]
pub struct FakePageSource {
    pages: HashMap<String, FakePage>,
    failing: HashSet<String>,
    browser_down: bool,
    fetch_counts: Mutex<HashMap<String, usize>>,
}

impl FakePageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Every fetch of this URL fails with a transient network error.
    pub fn with_failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Every fetch fails as if the browser could not be launched.
    pub fn with_browser_down(mut self) -> Self {
        self.browser_down = true;
        self
    }

    pub async fn fetch_count(&self, url: &str) -> usize {
        self.fetch_counts
            .lock()
            .await
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl PageSource for FakePageSource {
    async fn fetch(&self, url: &str, _kind: FetchKind) -> Result<RenderedPage> {
        *self
            .fetch_counts
            .lock()
            .await
            .entry(url.to_string())
            .or_insert(0) += 1;

        if self.browser_down {
            return Err(HarvestError::BrowserUnavailable(
                "no executable found".to_string(),
            ));
        }
        if self.failing.contains(url) {
            return Err(HarvestError::TransientNetwork {
                url: url.to_string(),
                message: "connection reset".to_string(),
            });
        }

        let page = self
            .pages
            .get(url)
            .ok_or_else(|| HarvestError::TransientNetwork {
                url: url.to_string(),
                message: "no such page".to_string(),
            })?;

        Ok(RenderedPage {
            final_url: url.to_string(),
            content_type: page.content_type.clone(),
            html: page.html.clone(),
            hrefs: page.hrefs.clone(),
        })
    }

    async fn shutdown(&self) {}
}

/// Deterministic embedder: the same text always gets the same vector.
pub struct FakeEmbedder {
    dimension: usize,
    fixed: HashMap<String, Vec<f32>>,
    fail_on_substring: Option<String>,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fixed: HashMap::new(),
            fail_on_substring: None,
        }
    }

    /// Pin the vector returned for an exact text.
    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        assert_eq!(vector.len(), self.dimension);
        self.fixed.insert(text.to_string(), vector);
        self
    }

    /// Fail any text containing this substring.
    pub fn with_failure_on(mut self, substring: &str) -> Self {
        self.fail_on_substring = Some(substring.to_string());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl EmbeddingService for FakeEmbedder {
    async fn embed(&self, text: &str, _model: &str) -> Result<Vec<f32>> {
        if let Some(bad) = &self.fail_on_substring {
            if text.contains(bad) {
                return Err(HarvestError::Embedding(format!(
                    "refusing to embed text containing {bad:?}"
                )));
            }
        }
        if let Some(vector) = self.fixed.get(text) {
            return Ok(vector.clone());
        }

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();
        let vector = (0..self.dimension)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 33) as f32 / u32::MAX as f32) - 0.5
            })
            .collect();
        Ok(vector)
    }
}

/// An article-shaped page whose extracted content is predictable.
pub fn article_html(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head>\
         <body><nav><a href=\"/\">home</a></nav>\
         <article><p>{body}</p></article></body></html>"
    )
}

/// A body of roughly `chars` characters built from repeated words.
pub fn body_of_length(chars: usize) -> String {
    let mut body = String::with_capacity(chars + 8);
    let mut word = 0usize;
    while body.len() < chars {
        word += 1;
        body.push_str(&format!("word{word} "));
    }
    body.truncate(chars);
    body.trim_end().to_string()
}
