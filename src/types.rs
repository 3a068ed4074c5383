// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The building blocks of a search index.
//!
//! A node shows up in the index up to three times, once per tier:
//!
//! | Tier | Entry           | What gets matched                      |
//! |------|-----------------|----------------------------------------|
//! | 1    | `TitleEntry`    | display name and id                    |
//! | 2    | `MetadataEntry` | tags, attribute keys and values        |
//! | 3    | `ContentEntry`  | one entry per non-empty prose field    |
//!
//! On top of the entries sits the inverted index (`term → PostingList`) and
//! the corpus statistics BM25 needs.
//!
//! # Invariants (the stuff that breaks if you ignore it)
//!
//! - **Postings**: within one `PostingList`, at most one `PostingEntry` per
//!   `(id, tier)`. Repeat occurrences extend `positions`.
//!
//! - **Coverage**: every id in `content` (and `metadata`) also appears in
//!   `titles`. Tier 2/3 results resolve their display name through it.
//!
//! - **Stats**: `total_docs >= 1` and `avg_doc_length > 0`, so BM25 never
//!   divides by zero.
//!
//! The index is an immutable snapshot once built. Rebuilds produce a new
//! `SearchIndex` that replaces the old one wholesale.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format tag written into every cache file. A mismatch forces a rebuild.
pub const INDEX_VERSION: &str = "1";

/// Average prose length assumed when a corpus has no prose at all.
pub const DEFAULT_AVG_DOC_LENGTH: f64 = 100.0;

// =============================================================================
// TIERS
// =============================================================================

/// Which indexed view of a node a match came from.
///
/// The derived `Ord` is the ranking tiebreaker: at equal score, titles sort
/// before metadata before content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    Title = 1,
    Metadata = 2,
    Content = 3,
}

impl Tier {
    /// Numeric tier (1, 2 or 3).
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.as_u8()
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::Title),
            2 => Ok(Tier::Metadata),
            3 => Ok(Tier::Content),
            other => Err(format!("invalid tier {other}, expected 1, 2 or 3")),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.as_u8())
    }
}

// =============================================================================
// TIERED ENTRIES
// =============================================================================

/// Tier 1: a node's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Source file, relative to the scope root.
    pub path: String,
    /// Ancestor ids from the document root down to (not including) this node.
    pub node_path: Vec<String>,
    pub name: String,
    /// Depth-derived weight, see `scoring::depth_boost`.
    pub boost: f64,
}

/// Tier 2: a node's tags and attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub path: String,
    pub node_path: Vec<String>,
    /// Ordered, duplicate-free.
    pub tags: Vec<String>,
    pub attributes: BTreeMap<String, String>,
}

/// Tier 3: one prose field of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub path: String,
    pub node_path: Vec<String>,
    /// Which prose field this came from ("body", "summary", ...).
    pub field: String,
    /// Raw field text, used for phrases, field filters and snippets.
    pub text: String,
    /// `tokenize(text)`.
    pub tokens: Vec<String>,
    /// `tokens.len()`, the BM25 document length.
    pub length: usize,
}

// =============================================================================
// INVERTED INDEX
// =============================================================================

/// One document's occurrences of a term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingEntry {
    pub id: String,
    pub tier: Tier,
    /// Token positions within the entry the term was read from.
    pub positions: Vec<usize>,
    /// Static weight of the posting (depth, tag or field boost).
    pub score: f64,
}

/// All documents containing a term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingList {
    pub term: String,
    /// Sorted by `(id, tier)`, unique on that pair.
    pub docs: Vec<PostingEntry>,
}

impl PostingList {
    /// Empty posting list for a term.
    pub fn new(term: impl Into<String>) -> Self {
        PostingList {
            term: term.into(),
            docs: Vec::new(),
        }
    }

    /// Number of distinct documents in the given tier holding this term.
    pub fn doc_freq(&self, tier: Tier) -> usize {
        self.docs.iter().filter(|d| d.tier == tier).count()
    }
}

// =============================================================================
// THE INDEX
// =============================================================================

/// The aggregate root: one per scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIndex {
    /// Format tag, compared against `INDEX_VERSION` on load.
    pub version: String,
    /// Build time. Caches past their maximum age are rebuilt.
    pub created: DateTime<Utc>,
    /// Which scope this index covers.
    pub scope_id: String,
    /// Relative path → content hash, for cheap staleness checks.
    pub file_hashes: BTreeMap<String, String>,
    pub titles: Vec<TitleEntry>,
    pub metadata: Vec<MetadataEntry>,
    pub content: Vec<ContentEntry>,
    pub term_index: BTreeMap<String, PostingList>,
    /// Never zero.
    pub total_docs: usize,
    /// Mean tier-3 token count, `DEFAULT_AVG_DOC_LENGTH` without prose.
    pub avg_doc_length: f64,
}

impl SearchIndex {
    /// An index with no entries, for a scope with no files.
    pub fn empty(scope_id: impl Into<String>) -> Self {
        SearchIndex {
            version: INDEX_VERSION.to_string(),
            created: Utc::now(),
            scope_id: scope_id.into(),
            file_hashes: BTreeMap::new(),
            titles: Vec::new(),
            metadata: Vec::new(),
            content: Vec::new(),
            term_index: BTreeMap::new(),
            total_docs: 1,
            avg_doc_length: DEFAULT_AVG_DOC_LENGTH,
        }
    }

    /// Does this index carry the current format version?
    pub fn is_current_version(&self) -> bool {
        self.version == INDEX_VERSION
    }

    /// Posting list for an already-normalized term.
    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.term_index.get(term)
    }

    /// O(1) id → title lookup, built once per search call.
    pub fn title_lookup(&self) -> HashMap<&str, &TitleEntry> {
        let mut lookup = HashMap::with_capacity(self.titles.len());
        for title in &self.titles {
            lookup.entry(title.id.as_str()).or_insert(title);
        }
        lookup
    }

    /// Is there anything to search?
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty() && self.metadata.is_empty() && self.content.is_empty()
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Why a result matched. Display only; ranking uses score and tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    /// A free term matched the name or id.
    Title,
    /// A quoted phrase appeared verbatim.
    Phrase,
    /// Type-filter browsing, no text matched.
    TypeFilter,
    /// A free term matched a tag.
    Tag,
    /// A free term matched an attribute key or value.
    Attribute,
    /// A free term matched prose.
    Content,
    /// A `field:value` filter matched.
    Field,
}

impl MatchType {
    /// Label matching the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Title => "title",
            MatchType::Phrase => "phrase",
            MatchType::TypeFilter => "typeFilter",
            MatchType::Tag => "tag",
            MatchType::Attribute => "attribute",
            MatchType::Content => "content",
            MatchType::Field => "field",
        }
    }
}

/// What the front-end gets back from a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub path: String,
    pub node_path: Vec<String>,
    /// Prose field, for tier-3 results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Context around the first match, for tier-3 results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    pub score: f64,
    pub tier: Tier,
    pub match_type: MatchType,
}
