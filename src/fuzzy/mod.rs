// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzzy search: typo tolerance via edit distance.
//!
//! `fuzzy_match` is the only matcher the executor uses. It has a cheap path
//! and an expensive one:
//!
//! 1. **Word-start substring.** If the term appears in the target starting at
//!    a word boundary, it matches. This covers prefixes ("cat" → "Catapult")
//!    and multi-word targets ("city" → "Dune City") without any DP.
//! 2. **Per-word edit distance.** Otherwise each whitespace-separated word of
//!    the target is compared against the term, allowing a number of edits
//!    that grows with the term's length.
//!
//! Short terms get no slack at all. With three letters, one edit turns "cat"
//! into "car", "hat", "cut", ... and every result list explodes.

mod levenshtein;

pub use levenshtein::*;

/// Allowed edits for a term of the given character length.
///
/// | Term length | Edits |
/// |-------------|-------|
/// | ≤ 3         | 0     |
/// | 4 – 6       | 1     |
/// | ≥ 7         | 2     |
pub fn fuzzy_threshold(term_chars: usize) -> usize {
    match term_chars {
        0..=3 => 0,
        4..=6 => 1,
        _ => 2,
    }
}

/// Case-insensitive fuzzy match of a query term against a target string.
pub fn fuzzy_match(term: &str, target: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return false;
    }
    let target = target.to_lowercase();

    if contains_at_word_start(&target, &term) {
        return true;
    }

    let max = fuzzy_threshold(term.chars().count());
    if max == 0 {
        return false;
    }
    target
        .split_whitespace()
        .any(|word| levenshtein_within(&term, word, max))
}

/// Does `needle` occur in `haystack` at the start of a word?
///
/// A word starts at the beginning of the text or right after a character
/// that is not a letter or number.
pub fn contains_at_word_start(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(offset, _)| {
        haystack[..offset]
            .chars()
            .next_back()
            .map_or(true, |prev| !prev.is_alphanumeric())
    })
}
