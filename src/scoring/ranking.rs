// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Result ranking: how search results get sorted.
//!
//! Score decides. At equal score the lower tier wins, so a name match sits
//! above a tag match sits above a prose match. The remaining keys exist only
//! so that the same index and query always produce the same order.

use crate::types::SearchResult;
use std::cmp::Ordering;

/// Compare two search results for ranking.
///
/// Sort order:
/// 1. **Score** - descending
/// 2. **Tier** - ascending (Title < Metadata < Content)
/// 3. **Id** - ascending
/// 4. **Field** - ascending, `None` first
pub fn compare_results(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.tier.cmp(&b.tier))
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.field.cmp(&b.field))
}

/// Sort in place and keep the best `limit`.
pub fn rank(results: &mut Vec<SearchResult>, limit: usize) {
    results.sort_by(compare_results);
    results.truncate(limit);
}
