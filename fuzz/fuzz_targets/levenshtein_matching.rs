// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for edit distance and the fuzzy matcher.
//!
//! The bounded check exits early, so it must agree with the full distance
//! for every budget. If the two disagree, typo tolerance silently drifts.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use loresift::{edit_distance, fuzzy_match, levenshtein_within};

#[derive(Debug, Arbitrary)]
struct MatchInput {
    term: String,
    target: String,
    max: u8,
}

fuzz_target!(|input: MatchInput| {
    // Cap lengths to avoid timeouts
    let term: String = input.term.chars().take(50).collect();
    let target: String = input.target.chars().take(100).collect();
    let max = usize::from(input.max % 4);

    let distance = edit_distance(&term, &target);
    assert_eq!(
        levenshtein_within(&term, &target, max),
        distance <= max,
        "bounded check disagrees: term={:?} target={:?} max={} distance={}",
        term,
        target,
        max,
        distance
    );

    // Length difference is a lower bound
    let len_diff = term.chars().count().abs_diff(target.chars().count());
    assert!(distance >= len_diff);

    // Symmetric, and zero only for equal strings
    assert_eq!(distance, edit_distance(&target, &term));
    assert_eq!(distance == 0, term == target);

    // Must never panic, whatever the input
    let _ = fuzzy_match(&term, &target);

    // A trimmed, non-empty term always finds itself
    if !term.trim().is_empty() {
        assert!(fuzzy_match(&term, &term), "term {:?} misses itself", term);
    }
});
