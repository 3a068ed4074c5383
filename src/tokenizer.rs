// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Text normalization: raw text in, lowercase alphanumeric terms out.
//!
//! The rules are deliberately blunt. Lowercase everything, turn anything that
//! isn't a Unicode letter or number into a space, split, and drop one-character
//! leftovers. No stemming, no stop words, no language-specific rules. "Aya's"
//! becomes `["aya"]` (the lone `s` is dropped), "time-travel" becomes
//! `["time", "travel"]`.
//!
//! Every term the index stores and every term a query looks up goes through
//! here, so both sides always agree on what a word is.

/// Minimum term length, in characters.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Lowercase and blank out non-alphanumeric characters.
///
/// The output has the same number of characters as the lowercased input;
/// only the separators change.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect()
}

/// Split text into normalized terms.
///
/// Pure and idempotent: tokenizing the joined output yields the same terms.
/// Empty input yields an empty vector.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    normalize(text)
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Tokenize a field that may be absent.
pub fn tokenize_opt(text: Option<&str>) -> Vec<String> {
    text.map(tokenize).unwrap_or_default()
}

/// Tokenize, keeping each term's starting offset in `text`, counted in chars
/// of the original (not lowercased) text.
///
/// Snippets use these offsets to cut a window around a match.
pub fn tokenize_with_offsets(text: &str) -> Vec<(String, usize)> {
    let mut out = Vec::new();
    let mut run = String::new();
    let mut run_start = 0;

    for (i, c) in text.chars().enumerate() {
        if c.is_alphanumeric() {
            if run.is_empty() {
                run_start = i;
            }
            run.push(c);
        } else if !run.is_empty() {
            push_run(&mut out, &mut run, run_start);
        }
    }
    if !run.is_empty() {
        push_run(&mut out, &mut run, run_start);
    }
    out
}

fn push_run(out: &mut Vec<(String, usize)>, run: &mut String, start: usize) {
    let token = run.to_lowercase();
    if token.chars().count() >= MIN_TOKEN_CHARS {
        out.push((token, start));
    }
    run.clear();
}
