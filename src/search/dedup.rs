// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Result deduplication across tiers.
//!
//! A node that matched by name shouldn't show up again because one of its
//! tags or its body also matched: the tier-1 hit already says everything the
//! lower tiers would. So the first tier to claim a node id owns it.
//!
//! Tier 3 is the one exception inside a tier. A node's `body` and `summary`
//! are separate entries with separate snippets, and both may be listed, keyed
//! by `(id, field)`.
//!
//! Tiers must be pushed in order (1, then 2, then 3). The set never re-sorts
//! on insert; ranking happens once, at the end.

use std::collections::HashSet;

use crate::scoring::ranking::rank;
use crate::types::{SearchResult, Tier};

#[derive(Debug, Default)]
pub struct ResultSet {
    results: Vec<SearchResult>,
    /// Node ids owned by tier 1 or 2.
    claimed: HashSet<String>,
    /// `(id, field)` pairs already listed by tier 3.
    fields: HashSet<(String, String)>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Has an earlier tier already listed this node?
    pub fn is_claimed(&self, id: &str) -> bool {
        self.claimed.contains(id)
    }

    /// Add a result unless it duplicates one already held. Returns whether it was added.
    pub fn push(&mut self, result: SearchResult) -> bool {
        if self.claimed.contains(&result.id) {
            return false;
        }
        match result.tier {
            Tier::Title | Tier::Metadata => {
                self.claimed.insert(result.id.clone());
            }
            Tier::Content => {
                let field = result.field.clone().unwrap_or_default();
                if !self.fields.insert((result.id.clone(), field)) {
                    return false;
                }
            }
        }
        self.results.push(result);
        true
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Sorted by [`compare_results`](crate::scoring::ranking::compare_results), at most `limit`.
    pub fn into_ranked(self, limit: usize) -> Vec<SearchResult> {
        let mut results = self.results;
        rank(&mut results, limit);
        results
    }
}
