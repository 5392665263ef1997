//! Boilerplate stripping and visible-text collection.
//!
//! Nothing here mutates the parsed document; stripped elements are skipped
//! during traversal instead.

use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::{ElementRef, Node};

/// Tags that never carry visible content.
const STRIPPED_TAGS: &[&str] = &["script", "style", "link", "meta", "noscript", "iframe"];

/// Class tokens that mark ad and overlay chrome. Matched as whole tokens for
/// the short names (`ad`, `ads`) and as substrings for the unambiguous ones,
/// so `header` and `read-more` survive.
const BOILERPLATE_EXACT: &[&str] = &["ad", "ads"];
const BOILERPLATE_SUBSTRINGS: &[&str] = &["advertisement", "cookie-banner", "popup", "modal"];

/// Whether this element (and its whole subtree) is boilerplate.
///
/// Navigation, header, and footer elements are deliberately kept; they often
/// carry useful structure.
pub fn is_stripped(element: &Element) -> bool {
    let tag = element.name();
    if STRIPPED_TAGS.contains(&tag) {
        return true;
    }

    for class in element.classes() {
        let class = class.to_ascii_lowercase();
        if BOILERPLATE_EXACT.contains(&class.as_str())
            || BOILERPLATE_SUBSTRINGS.iter().any(|s| class.contains(s))
        {
            return true;
        }
    }

    if element.attr("hidden").is_some() {
        return true;
    }
    if let Some(style) = element.attr("style") {
        let style: String = style.chars().filter(|c| !c.is_whitespace()).collect();
        if style.to_ascii_lowercase().contains("display:none") {
            return true;
        }
    }

    false
}

/// Whether any ancestor of `el` is boilerplate; an element inside a
/// stripped subtree is stripped with it.
pub fn in_stripped_subtree(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| is_stripped(ancestor.value()))
}

/// Visible text of `el`, boilerplate subtrees skipped, whitespace
/// normalized to single spaces.
pub fn visible_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(*el, &mut raw);
    normalize_ws(&raw)
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(&text);
                out.push(' ');
            }
            Node::Element(element) => {
                if !is_stripped(&element) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

/// Collapse every whitespace run to a single space and trim.
pub fn normalize_ws(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}
