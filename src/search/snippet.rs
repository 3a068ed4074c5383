// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Snippets: a short window of prose around the first match.
//!
//! All offsets are in chars, never bytes, so a window can't split a
//! multi-byte character.

use crate::tokenizer::tokenize_with_offsets;

/// Chars kept on each side of the match.
pub const SNIPPET_RADIUS: usize = 50;

const ELLIPSIS: &str = "...";

/// Cut a window around char offset `at`, with ellipses on truncated sides
/// and newlines flattened to spaces.
pub fn make_snippet(text: &str, at: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let at = at.min(chars.len());
    let start = at.saturating_sub(SNIPPET_RADIUS);
    let end = (at + SNIPPET_RADIUS).min(chars.len());

    let mut snippet = String::with_capacity(end - start + 2 * ELLIPSIS.len());
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.extend(chars[start..end].iter().map(|&c| match c {
        '\n' | '\r' => ' ',
        c => c,
    }));
    if end < chars.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

/// Char offset of the first occurrence of `needle` in `text`, ignoring case.
pub fn find_substring(text: &str, needle: &str) -> Option<usize> {
    let needle: Vec<char> = needle.chars().map(fold_char).collect();
    if needle.is_empty() {
        return None;
    }
    let hay: Vec<char> = text.chars().map(fold_char).collect();
    hay.windows(needle.len()).position(|window| window == needle.as_slice())
}

/// Char offset of the first token equal to `token` (already lowercased).
pub fn find_token(text: &str, token: &str) -> Option<usize> {
    tokenize_with_offsets(text)
        .into_iter()
        .find(|(t, _)| t == token)
        .map(|(_, offset)| offset)
}

/// One-to-one lowercase, so folded and original text stay aligned.
fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}
