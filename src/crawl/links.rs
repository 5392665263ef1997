//! Candidate link resolution and script-text URL scanning.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Quoted absolute URLs and absolute paths inside script text; single-page
/// apps often keep their route table there rather than in anchors.
fn script_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"["']((https?://|/)[^"']+)["']"#).expect("script URL pattern is valid")
    })
}

/// Collect URL-looking strings from every `<script>` body in `html`.
#[must_use]
pub fn script_urls(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let Ok(sel) = Selector::parse("script") else {
        return Vec::new();
    };

    let mut urls = Vec::new();
    for script in doc.select(&sel) {
        let text: String = script.text().collect();
        for captures in script_url_regex().captures_iter(&text) {
            if let Some(m) = captures.get(1) {
                urls.push(m.as_str().to_string());
            }
        }
    }
    urls
}

/// Resolve a candidate link against the page it came from, strip the
/// fragment, and keep it only when it stays on `origin_host` over http(s).
#[must_use]
pub fn normalize_candidate(candidate: &str, base: &Url, origin_host: &str) -> Option<String> {
    let mut resolved = base.join(candidate.trim()).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    if resolved.host_str() != Some(origin_host) {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved.to_string())
}
