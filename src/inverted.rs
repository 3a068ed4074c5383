// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Inverted index construction and corpus statistics.
//!
//! # Invariants
//!
//! 1. **ONE_POSTING_PER_DOC_TIER**: a posting list holds at most one entry per
//!    `(id, tier)`. Repeats of a term inside the same node and tier append to
//!    that entry's `positions`.
//! 2. **POSTINGS_SORTED**: entries are sorted by `(id, tier)`, positions
//!    ascending within an entry.
//! 3. **NON_EMPTY**: every term in the index has at least one posting.
//! 4. **TOTAL_DOCS_POSITIVE**: `total_docs >= 1`, even for an empty corpus.
//!
//! Positions are token offsets within the source text: the name for tier 1,
//! the concatenated tag and `"key value"` token stream for tier 2, and the
//! field text for tier 3. A posting's score is the strongest boost seen for
//! that `(id, tier)`.

use std::collections::{BTreeMap, HashMap};

use crate::scoring::{field_boost, ATTRIBUTE_MATCH_BOOST, TAG_MATCH_BOOST};
use crate::tokenizer::tokenize;
use crate::types::{
    ContentEntry, MetadataEntry, PostingEntry, PostingList, Tier, TitleEntry,
    DEFAULT_AVG_DOC_LENGTH,
};

/// Accumulates postings keyed by `(id, tier)` before they're frozen into lists.
#[derive(Default)]
struct PostingAccumulator {
    terms: HashMap<String, BTreeMap<(String, Tier), PostingEntry>>,
}

impl PostingAccumulator {
    fn add(&mut self, term: &str, id: &str, tier: Tier, position: usize, boost: f64) {
        let docs = self.terms.entry(term.to_string()).or_default();
        let entry = docs
            .entry((id.to_string(), tier))
            .or_insert_with(|| PostingEntry {
                id: id.to_string(),
                tier,
                positions: Vec::new(),
                score: boost,
            });
        entry.positions.push(position);
        if boost > entry.score {
            entry.score = boost;
        }
    }

    fn finish(self) -> BTreeMap<String, PostingList> {
        self.terms
            .into_iter()
            .map(|(term, docs)| {
                let docs = docs
                    .into_values()
                    .map(|mut entry| {
                        entry.positions.sort_unstable();
                        entry
                    })
                    .collect();
                let list = PostingList {
                    term: term.clone(),
                    docs,
                };
                (term, list)
            })
            .collect()
    }
}

/// Build the term index from the three entry arrays.
pub fn build_term_index(
    titles: &[TitleEntry],
    metadata: &[MetadataEntry],
    content: &[ContentEntry],
) -> BTreeMap<String, PostingList> {
    let mut acc = PostingAccumulator::default();

    for title in titles {
        for (position, term) in tokenize(&title.name).iter().enumerate() {
            acc.add(term, &title.id, Tier::Title, position, title.boost);
        }
    }

    for meta in metadata {
        let mut position = 0;
        for tag in &meta.tags {
            for term in tokenize(tag) {
                acc.add(&term, &meta.id, Tier::Metadata, position, TAG_MATCH_BOOST);
                position += 1;
            }
        }
        for (key, value) in &meta.attributes {
            for term in tokenize(&format!("{key} {value}")) {
                acc.add(&term, &meta.id, Tier::Metadata, position, ATTRIBUTE_MATCH_BOOST);
                position += 1;
            }
        }
    }

    for entry in content {
        let boost = field_boost(&entry.field);
        for (position, term) in entry.tokens.iter().enumerate() {
            acc.add(term, &entry.id, Tier::Content, position, boost);
        }
    }

    acc.finish()
}

/// `(total_docs, avg_doc_length)` for BM25.
///
/// `total_docs` counts title entries (one per node) and never drops below 1.
/// `avg_doc_length` is the mean content entry length, or the default when
/// there is no prose at all.
pub fn corpus_stats(titles: &[TitleEntry], content: &[ContentEntry]) -> (usize, f64) {
    let total_docs = titles.len().max(1);
    let avg_doc_length = if content.is_empty() {
        DEFAULT_AVG_DOC_LENGTH
    } else {
        let total: usize = content.iter().map(|c| c.length).sum();
        total as f64 / content.len() as f64
    };
    (total_docs, avg_doc_length)
}
