// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for the query parser and tiered executor.
//!
//! Arbitrary bytes go through the full search path against a fixed index.
//! Whatever the query, the result list must be bounded, ranked, free of
//! cross-tier duplicates, and point at nodes the index actually holds.

#![no_main]

use libfuzzer_sys::fuzz_target;
use loresift::testing::{generated_nodes, index_from_nodes, sample_nodes};
use loresift::{search, SearchIndex, SearchOptions, Tier};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use std::time::Duration;

const LIMIT: usize = 20;

fn fixture() -> &'static SearchIndex {
    static INDEX: OnceLock<SearchIndex> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut docs = sample_nodes();
        docs.extend(generated_nodes(25));
        index_from_nodes("fuzz", &docs)
    })
}

fuzz_target!(|query: &[u8]| {
    let query = String::from_utf8_lossy(query);
    // Cap in chars so the cut never lands inside a code point
    let query: String = query.chars().take(200).collect();

    let index = fixture();
    let options = SearchOptions::default()
        .with_limit(LIMIT)
        .with_timeout(Duration::from_secs(5));
    let results = search(index, &query, &options);

    assert!(results.len() <= LIMIT, "limit exceeded for query {:?}", query);

    let known: HashSet<&str> = index.titles.iter().map(|t| t.id.as_str()).collect();
    let mut tiers: HashMap<&str, Tier> = HashMap::new();
    for result in &results {
        assert!(
            known.contains(result.id.as_str()),
            "unknown id {} for query {:?}",
            result.id,
            query
        );
        assert!(
            result.score.is_finite() && result.score > 0.0,
            "bad score {} for query {:?}",
            result.score,
            query
        );
        if let Some(&tier) = tiers.get(result.id.as_str()) {
            assert_eq!(tier, result.tier, "{} returned by two tiers", result.id);
        }
        tiers.insert(result.id.as_str(), result.tier);
    }

    for pair in results.windows(2) {
        assert!(
            pair[0].score >= pair[1].score,
            "unranked results for query {:?}",
            query
        );
    }
});
