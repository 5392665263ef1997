//! Candidate selection, structural rendering, and the fallback chain.

use scraper::{ElementRef, Html, Selector};

use super::dom::{in_stripped_subtree, is_stripped, normalize_ws, truncate_chars, visible_text};
use super::{
    MainContent, PageExtract, BODY_FALLBACK_MIN, CONTENT_CAP, DESCRIPTION_MAX_CHARS,
    MIN_MAIN_CONTENT_CHARS, MIN_PARAGRAPH_CHARS, PARAGRAPH_FALLBACK_MIN, TEXT_RATIO_MIN,
    TITLE_MAX_CHARS,
};

/// Selectors that usually wrap the primary content, most specific first.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    r#"[role="main"]"#,
    ".content",
    ".main-content",
    "#content",
    "#main",
    ".post-content",
    ".entry-content",
    ".page-content",
    ".article-body",
    ".post-body",
    ".text-content",
];

/// Containers considered by the scored fallback search.
const SCORED_CONTAINERS: &[&str] = &["main", "article", "section", "div"];

/// Extract `(title, description, content)` from rendered HTML.
pub fn extract(html: &str) -> PageExtract {
    let doc = Html::parse_document(html);

    let title = extract_title(&doc);
    let description = extract_description(&doc);

    let candidate = select_candidate(&doc);
    let (mut source, structured) = match candidate {
        Some(el) => (MainContent::Selector, render_structure(el)),
        None => match select_scored(&doc) {
            Some(el) => (MainContent::Scored, render_structure(el)),
            None => (MainContent::FallbackParagraphs, String::new()),
        },
    };

    // Fallback chain: a thin candidate is replaced by the document-wide
    // paragraphs and lists, and a still-thin result by the whole body text.
    let mut content = structured;
    if content.chars().count() < PARAGRAPH_FALLBACK_MIN {
        content = document_paragraphs_and_lists(&doc);
        source = MainContent::FallbackParagraphs;
    }
    if content.chars().count() < BODY_FALLBACK_MIN {
        if let Some(body) = body_element(&doc) {
            content = visible_text(body);
            source = MainContent::FallbackBody;
        }
    }

    let content = truncate_chars(&clean_content(&content), CONTENT_CAP);

    let mut extract = PageExtract {
        title,
        description,
        content,
        source,
    };
    if extract.is_empty() {
        extract.source = MainContent::Empty;
    }
    extract
}

fn extract_title(doc: &Html) -> String {
    let candidates = [
        first_text(doc, "title"),
        first_text(doc, "h1"),
        meta_content(doc, r#"meta[property="og:title"]"#),
    ];
    let title = candidates
        .into_iter()
        .flatten()
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());
    truncate_chars(&title, TITLE_MAX_CHARS)
}

fn extract_description(doc: &Html) -> Option<String> {
    let description = meta_content(doc, r#"meta[name="description"]"#)
        .filter(|d| !d.is_empty())
        .or_else(|| {
            meta_content(doc, r#"meta[property="og:description"]"#).filter(|d| !d.is_empty())
        })?;
    Some(truncate_chars(&description, DESCRIPTION_MAX_CHARS))
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel).next().map(visible_text)
}

fn meta_content(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(normalize_ws)
}

/// First known content selector whose visible text is long enough.
/// Boilerplate and hidden matches are never candidates.
fn select_candidate(doc: &Html) -> Option<ElementRef<'_>> {
    for selector in CONTENT_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        if let Some(el) = doc.select(&sel).find(|el| {
            !is_stripped(el.value())
                && !in_stripped_subtree(*el)
                && visible_text(*el).chars().count() > MIN_MAIN_CONTENT_CHARS
        }) {
            return Some(el);
        }
    }
    None
}

/// Largest-text container passing the text-to-markup ratio filter.
fn select_scored(doc: &Html) -> Option<ElementRef<'_>> {
    let mut best: Option<(usize, ElementRef<'_>)> = None;
    for container in SCORED_CONTAINERS {
        let Ok(sel) = Selector::parse(container) else {
            continue;
        };
        for el in doc.select(&sel) {
            if is_stripped(el.value()) || in_stripped_subtree(el) {
                continue;
            }
            let text_len = visible_text(el).chars().count();
            if text_len == 0 {
                continue;
            }
            let html_len = el.html().len().max(1);
            if (text_len as f64) / (html_len as f64) <= TEXT_RATIO_MIN {
                continue;
            }
            if best.map_or(true, |(len, _)| text_len > len) {
                best = Some((text_len, el));
            }
        }
    }
    best.map(|(_, el)| el)
}

/// Render the structure inside `root`: headings, paragraphs, lists, tables,
/// appended in that order.
fn render_structure(root: ElementRef<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();

    for heading in select_within(root, "h1, h2, h3, h4, h5, h6") {
        let text = visible_text(heading);
        if !text.is_empty() {
            parts.push(format!("## {text}"));
        }
    }

    for paragraph in select_within(root, "p") {
        let text = visible_text(paragraph);
        if text.chars().count() > MIN_PARAGRAPH_CHARS {
            parts.push(text);
        }
    }

    for item in select_within(root, "ul li, ol li") {
        let text = visible_text(item);
        if !text.is_empty() {
            parts.push(format!("• {text}"));
        }
    }

    for table in select_within(root, "table") {
        let rendered = render_table(table);
        if !rendered.is_empty() {
            parts.push(rendered);
        }
    }

    parts.join("\n\n")
}

fn select_within<'a>(root: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    let Ok(sel) = Selector::parse(selector) else {
        return Vec::new();
    };
    root.select(&sel)
        .filter(|el| !is_stripped(el.value()) && !in_stripped_subtree(*el))
        .collect()
}

/// Pipe-delimited rows; a separator row follows the header when the table
/// has `<th>` cells.
fn render_table(table: ElementRef<'_>) -> String {
    let Ok(row_sel) = Selector::parse("tr") else {
        return String::new();
    };
    let Ok(cell_sel) = Selector::parse("th, td") else {
        return String::new();
    };
    let Ok(header_sel) = Selector::parse("th") else {
        return String::new();
    };

    let has_header = table.select(&header_sel).next().is_some();
    let mut lines: Vec<String> = Vec::new();

    for (i, row) in table.select(&row_sel).enumerate() {
        let cells: Vec<String> = row.select(&cell_sel).map(visible_text).collect();
        if cells.is_empty() {
            continue;
        }
        lines.push(format!("| {} |", cells.join(" | ")));
        if i == 0 && has_header {
            let dashes: Vec<&str> = cells.iter().map(|_| "---").collect();
            lines.push(format!("| {} |", dashes.join(" | ")));
        }
    }

    lines.join("\n")
}

/// Document-wide paragraphs and list items, for the first fallback.
fn document_paragraphs_and_lists(doc: &Html) -> String {
    match body_element(doc) {
        Some(body) => {
            let mut parts: Vec<String> = Vec::new();
            for paragraph in select_within(body, "p") {
                let text = visible_text(paragraph);
                if text.chars().count() > MIN_PARAGRAPH_CHARS {
                    parts.push(text);
                }
            }
            for item in select_within(body, "ul li, ol li") {
                let text = visible_text(item);
                if !text.is_empty() {
                    parts.push(format!("• {text}"));
                }
            }
            parts.join("\n\n")
        }
        None => String::new(),
    }
}

fn body_element(doc: &Html) -> Option<ElementRef<'_>> {
    let sel = Selector::parse("body").ok()?;
    doc.select(&sel).next()
}

/// Final cleanup: tabs and non-breaking spaces become spaces, space runs
/// collapse to one, blank-line runs collapse to exactly one blank line, and
/// the result is trimmed.
fn clean_content(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| if c == '\t' || c == '\u{a0}' { ' ' } else { c })
        .collect();

    let lines: Vec<String> = spaced
        .split('\n')
        .map(|line| {
            let mut out = String::with_capacity(line.len());
            let mut pending = false;
            for ch in line.trim().chars() {
                if ch == ' ' {
                    pending = true;
                } else {
                    if pending && !out.is_empty() {
                        out.push(' ');
                    }
                    pending = false;
                    out.push(ch);
                }
            }
            out
        })
        .collect();

    let mut out = String::with_capacity(spaced.len());
    let mut blank_run = 0usize;
    for line in &lines {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run > 0 {
                out.push('\n');
            }
        }
        blank_run = 0;
        out.push_str(line);
    }
    out.trim().to_string()
}
