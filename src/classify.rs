//! Heuristic URL classifier.
//!
//! [`is_likely_content_url`] is a pure predicate used by discovery to decide
//! whether a URL is worth rendering. It rejects clearly-non-content URLs
//! (system paths, asset extensions, API-shaped queries) rather than
//! allowlisting known content paths, which keeps recall high on sites the
//! crawler has never seen.

use url::Url;

/// Path segments that mark administrative, machine, or commerce endpoints.
/// Matched as whole segments so `/admin` rejects but `/administration` does
/// not.
const SYSTEM_SEGMENTS: &[&str] = &[
    "wp-admin",
    "wp-login",
    "wp-includes",
    "wp-json",
    "admin",
    "login",
    "logout",
    "signin",
    "signup",
    "dashboard",
    "panel",
    "cpanel",
    "node_modules",
    ".git",
    ".env",
    "cgi-bin",
    "api",
    "rest",
    "graphql",
    "feed",
    "rss",
    "atom",
    "cart",
    "checkout",
    "payment",
    "ajax",
];

/// File extensions that never resolve to a content page.
const NON_PAGE_EXTENSIONS: &[&str] = &[
    // images
    "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "bmp",
    // styles
    "css", "scss", "less",
    // scripts
    "js", "mjs",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    // archives
    "zip", "rar", "tar", "gz", "7z",
    // media
    "mp3", "wav", "ogg", "mp4", "avi", "mov", "webm",
    // data
    "xml", "json", "txt", "log", "csv",
    // fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // source maps
    "map",
];

/// Query parameter names that indicate a machine endpoint.
const MACHINE_QUERY_PARAMS: &[&str] = &["action", "ajax", "callback", "jsonp"];

const MAX_QUERY_PARAMS: usize = 5;

/// Decide whether `url` is likely a human-readable content page.
///
/// Pure and deterministic: no I/O, no clock, no global state. Any URL that
/// fails to parse is rejected.
#[must_use]
pub fn is_likely_content_url(url: &str, content_type: Option<&str>) -> bool {
    // 1. Only HTML and plain text render to content.
    if let Some(ct) = content_type {
        let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        if mime != "text/html" && mime != "text/plain" {
            return false;
        }
    }

    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    let path = parsed.path().to_ascii_lowercase();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // 2. System path segments.
    if segments
        .iter()
        .any(|seg| SYSTEM_SEGMENTS.contains(seg))
    {
        return false;
    }

    // A trailing `search` segment with a query string is a search endpoint,
    // not a page.
    if segments.last() == Some(&"search") && parsed.query().is_some() {
        return false;
    }

    // 3. Asset and data extensions.
    if let Some(last) = segments.last() {
        if let Some((_, ext)) = last.rsplit_once('.') {
            if NON_PAGE_EXTENSIONS.contains(&ext) {
                return false;
            }
        }
    }

    // 4/5. Machine-shaped or parameter-heavy queries.
    let mut names: Vec<String> = Vec::new();
    for (name, _) in parsed.query_pairs() {
        let name = name.to_ascii_lowercase();
        if MACHINE_QUERY_PARAMS.contains(&name.as_str()) {
            return false;
        }
        if !names.contains(&name) {
            names.push(name);
        }
    }
    if names.len() > MAX_QUERY_PARAMS {
        return false;
    }

    true
}
