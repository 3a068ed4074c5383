// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The math behind search ranking.
//!
//! # BM25
//!
//! ```text
//! idf = ln((N - df + 0.5) / (df + 0.5) + 1)
//! tf' = tf·(k1 + 1) / (tf + k1·(1 - b + b·len/avg))
//! ```
//!
//! The `+ 1` inside the log is not textbook BM25. Without it a term present
//! in more than half the corpus gets a negative IDF, and a match would lower
//! a document's score. With it, IDF bottoms out near zero instead.
//!
//! # Constants
//!
//! | Boost        | Value | Applies to                              |
//! |--------------|-------|-----------------------------------------|
//! | Title        | 3.0   | term hits a node's name or id           |
//! | Root         | 1.5   | node at the top of its document         |
//! | Shallow      | 1.0   | depth 1–2                               |
//! | Deep         | 0.8   | depth ≥ 3                               |
//! | Tag          | 1.3   | term hits a tag                         |
//! | Phrase       | 2.0   | quoted phrase found verbatim            |
//! | Summary      | 1.2   | match inside the `summary` field        |
//! | Body / other | 1.0   | any other prose field                   |
//! | Recent       | 1.1   | recently edited file (reserved)         |

/// BM25 term-frequency saturation.
pub const BM25_K1: f64 = 1.2;

/// BM25 length normalization strength.
pub const BM25_B: f64 = 0.75;

pub const TITLE_MATCH_BOOST: f64 = 3.0;
pub const ROOT_NODE_BOOST: f64 = 1.5;
pub const SHALLOW_NODE_BOOST: f64 = 1.0;
pub const DEEP_NODE_BOOST: f64 = 0.8;
pub const TAG_MATCH_BOOST: f64 = 1.3;
pub const ATTRIBUTE_MATCH_BOOST: f64 = 1.0;
pub const PHRASE_MATCH_BOOST: f64 = 2.0;
pub const SUMMARY_FIELD_BOOST: f64 = 1.2;
pub const DEFAULT_FIELD_BOOST: f64 = 1.0;
pub const RECENT_FILE_BOOST: f64 = 1.1;

/// Score added when a `field:value` filter finds its value.
pub const FIELD_FILTER_MATCH_SCORE: f64 = 2.0;

/// Base score for type-filter browsing, before the depth boost.
pub const TYPE_BROWSE_SCORE: f64 = 1.0;

/// Deepest `node_path` length still counted as shallow.
const SHALLOW_DEPTH_LIMIT: usize = 2;

/// Okapi BM25 for one term in one document.
///
/// Returns 0 when IDF is undefined (`total_docs == 0` or `doc_freq == 0`).
/// A non-positive `avg_doc_length` is treated as "no length normalization".
pub fn bm25(
    term_freq: usize,
    doc_length: usize,
    avg_doc_length: f64,
    doc_freq: usize,
    total_docs: usize,
) -> f64 {
    if total_docs == 0 || doc_freq == 0 {
        return 0.0;
    }

    let n = total_docs as f64;
    let df = doc_freq as f64;
    let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

    let tf = term_freq as f64;
    let length_ratio = if avg_doc_length > 0.0 {
        doc_length as f64 / avg_doc_length
    } else {
        1.0
    };
    let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * length_ratio);
    let tf_component = (tf * (BM25_K1 + 1.0)) / (tf + norm);

    idf * tf_component
}

/// Weight for a node at this position in its document tree.
///
/// `node_path` holds the ancestors only, so the document root has an empty path.
pub fn depth_boost(node_path: &[String]) -> f64 {
    match node_path.len() {
        0 => ROOT_NODE_BOOST,
        n if n <= SHALLOW_DEPTH_LIMIT => SHALLOW_NODE_BOOST,
        _ => DEEP_NODE_BOOST,
    }
}

/// Weight for a prose field.
pub fn field_boost(field: &str) -> f64 {
    if field == "summary" {
        SUMMARY_FIELD_BOOST
    } else {
        DEFAULT_FIELD_BOOST
    }
}
