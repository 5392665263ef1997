//! Sliding-window text chunking with semantic-boundary snapping.
//!
//! Offsets are in characters, not bytes, so they remain meaningful for
//! multi-byte text and can be stored alongside the chunk.

/// Boundary candidates in precedence order: paragraph break, line break,
/// sentence end, clause end, word break.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", ";", ":", " "];

/// How far back from the window end to look for a separator.
const BOUNDARY_LOOKBACK: usize = 100;

/// One window over the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    pub start_char: usize,
    pub end_char: usize,
}

/// Split `text` into overlapping chunks of at most `chunk_size` characters
/// (plus the length of the separator a window snapped to), preferring to cut
/// at the highest-precedence separator found in the last
/// [`BOUNDARY_LOOKBACK`] characters of each window.
///
/// Start offsets are strictly increasing, consecutive chunks overlap by
/// `overlap` characters (less when a window snapped short), and the chunks
/// jointly cover the whole input. Whitespace-only windows are suppressed.
#[must_use]
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < total {
        let mut end = (start + chunk_size).min(total);
        if end < total {
            if let Some(snapped) = snap_to_separator(&chars, start, end) {
                end = snapped;
            }
        }

        let content: String = chars[start..end].iter().collect();
        if !content.trim().is_empty() {
            chunks.push(Chunk {
                content,
                start_char: start,
                end_char: end,
            });
        }

        if end >= total {
            break;
        }

        let mut next = end.saturating_sub(overlap);
        if next <= start {
            // Overlap swallowed the whole window; force progress.
            next = start + (chunk_size / 2).max(1);
        }
        start = next;
    }

    chunks
}

/// Find the cut position just past the last occurrence of the
/// highest-precedence separator inside the lookback window, if any.
fn snap_to_separator(chars: &[char], start: usize, end: usize) -> Option<usize> {
    let window_start = end.saturating_sub(BOUNDARY_LOOKBACK).max(start);

    for sep in SEPARATORS {
        let sep_chars: Vec<char> = sep.chars().collect();
        let len = sep_chars.len();
        if end - window_start < len {
            continue;
        }

        let mut idx = end - len;
        loop {
            if chars[idx..idx + len] == sep_chars[..] {
                let snapped = idx + len;
                if snapped > start {
                    return Some(snapped);
                }
                break;
            }
            if idx == window_start {
                break;
            }
            idx -= 1;
        }
    }

    None
}
