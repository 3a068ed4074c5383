// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for the tokenizer.
//!
//! Index and query both go through `tokenize`. Every term must be at least
//! two alphanumeric characters, and re-tokenizing the output must change
//! nothing, or queries stop finding what the index stored.

#![no_main]

use libfuzzer_sys::fuzz_target;
use loresift::tokenizer::{tokenize, tokenize_with_offsets, MIN_TOKEN_CHARS};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let text: String = text.chars().take(4096).collect();

    let tokens = tokenize(&text);
    for token in &tokens {
        assert!(token.chars().count() >= MIN_TOKEN_CHARS, "short token {:?}", token);
        assert!(
            token.chars().all(char::is_alphanumeric),
            "separator left in {:?}",
            token
        );
    }

    let again = tokenize(&tokens.join(" "));
    assert_eq!(tokens, again, "tokenize is not idempotent on {:?}", text);

    // Offsets index chars of the original text, in increasing order
    let char_count = text.chars().count();
    let mut last = None;
    for (_, offset) in tokenize_with_offsets(&text) {
        assert!(offset < char_count, "offset {} past end", offset);
        if let Some(prev) = last {
            assert!(offset > prev, "offsets out of order");
        }
        last = Some(offset);
    }
});
