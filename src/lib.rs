// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Tiered fuzzy search over structured story notes.
//!
//! A scope is a directory of YAML, JSON and Markdown files, each holding a
//! tree of nodes (characters, places, chapters, whatever the writer keeps).
//! This crate turns a scope into a three-tier index, caches it next to the
//! notes, and answers search-box queries against it in milliseconds.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   build/     │────▶│ inverted.rs  │────▶│   cache.rs   │
//! │ (discover,   │     │ (term index, │     │ (JSON file,  │
//! │  parse, walk)│     │  corpus stats│     │  CRC32 check)│
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        │                                         │
//!        ▼                                         ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                       manager.rs                        │
//! │   (per-scope worker, snapshot swap, events, progress)   │
//! └─────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   query.rs   │────▶│   search/    │────▶│  scoring/    │
//! │ (terms, type │     │ (T1 → T2 →   │     │ (BM25, boosts│
//! │  & field     │     │  T3, dedup)  │     │  ranking)    │
//! │  filters)    │     │              │     │              │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! # Tiers
//!
//! | Tier | Matches                 | Scoring                              |
//! |------|-------------------------|--------------------------------------|
//! | T1   | names and ids           | fuzzy hit × 3.0 × depth boost        |
//! | T2   | tags and attributes     | 1.3 per tag hit, 1.0 per attribute   |
//! | T3   | prose fields            | BM25 × field boost, phrases +2.0     |
//!
//! A node claimed by an earlier tier never shows up again in a later one.
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use loresift::{IndexManager, SearchOptions};
//!
//! let manager = IndexManager::new();
//! let scope = manager.initialize_for_scope("saga", "notes/saga")?;
//! scope.wait_ready(Duration::from_secs(30));
//!
//! for hit in scope.search("aya type:character", &SearchOptions::default()) {
//!     println!("{} {:.2} {}", hit.tier, hit.score, hit.name);
//! }
//! # Ok::<(), loresift::Error>(())
//! ```

pub mod build;
pub mod cache;
pub mod config;
pub mod error;
pub mod fuzzy;
pub mod inverted;
pub mod manager;
pub mod query;
pub mod scoring;
pub mod search;
pub mod tokenizer;
pub mod types;

pub mod testing;

pub use build::{
    DefaultDocumentModel, DocumentFormat, DocumentModel, FileSource, IndexBuilder, Node,
};
pub use cache::CacheMiss;
pub use config::{EngineConfig, SearchOptions};
pub use error::{Error, Result};
pub use fuzzy::{edit_distance, fuzzy_match, levenshtein_within};
pub use manager::{IndexEvent, IndexManager, ScopeHandle, ScopeState};
pub use query::{parse_query, FieldFilter, FilterField, ParsedQuery};
pub use scoring::bm25;
pub use search::{execute_search, search};
pub use tokenizer::{normalize, tokenize};
pub use types::{
    ContentEntry, MatchType, MetadataEntry, PostingEntry, PostingList, SearchIndex, SearchResult,
    Tier, TitleEntry, INDEX_VERSION,
};
