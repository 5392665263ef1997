//! JavaScript evaluated inside pages during discovery and scraping.

/// MIME type the document reports for itself.
pub const CONTENT_TYPE_SCRIPT: &str = "document.contentType";

/// Scroll to the bottom so lazy-loaded sections render.
pub const SCROLL_TO_BOTTOM_SCRIPT: &str = r"
    window.scrollTo(0, document.body.scrollHeight);
";

/// Click visible load-more style controls (English and Dutch labels).
pub const CLICK_LOAD_MORE_SCRIPT: &str = r#"
    (() => {
        const pattern = /load more|show more|next|meer|volgende/i;
        let clicked = 0;
        const candidates = document.querySelectorAll('button, a, [role="button"]');
        for (const el of candidates) {
            const text = (el.innerText || '').trim();
            if (text && text.length < 40 && pattern.test(text)) {
                try {
                    el.click();
                    clicked += 1;
                } catch (e) {
                    // Detached or covered elements are not worth failing over.
                }
            }
        }
        return clicked;
    })()
"#;

/// Raw `href` attribute of every anchor, unresolved.
pub const COLLECT_HREFS_SCRIPT: &str = r"
    Array.from(document.querySelectorAll('a[href]'))
        .map(a => a.getAttribute('href'))
        .filter(href => href !== null)
";
