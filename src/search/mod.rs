// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Search: where the rubber meets the road.
//!
//! Everything culminates here. Files have been parsed, walked, tokenized and
//! inverted. Now a string from a search box has to become a ranked list in a
//! few milliseconds. The three-tier strategy (names → tags → prose) puts the
//! likeliest answers first and only pays for BM25 when it has to.

pub mod dedup;
pub mod snippet;
pub mod tiered;

pub use tiered::execute_search;

use crate::config::SearchOptions;
use crate::query::parse_query;
use crate::types::{SearchIndex, SearchResult};

/// Parse `raw` and run it against `index`.
pub fn search(index: &SearchIndex, raw: &str, options: &SearchOptions) -> Vec<SearchResult> {
    execute_search(&parse_query(raw), index, options)
}
