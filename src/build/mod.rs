// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Index building: files on disk in, a [`SearchIndex`] out.
//!
//! Four phases, each ending at a fixed progress mark:
//!
//! ```text
//!  0% ── discover ──▶ 10% ── parse + walk ──▶ 90% ── invert ──▶ 95% ── stats ──▶ 100%
//! ```
//!
//! Parsing dominates, so that's the phase that runs on the rayon pool (with
//! the `parallel` feature) and reports progress every `progress_batch` files.
//! `collect()` on an indexed parallel iterator keeps input order, so the
//! parallel and sequential builds produce identical indexes.
//!
//! One bad file never sinks a build. It gets a `warn!`, its hash is still
//! recorded (so an unchanged broken file doesn't invalidate the cache), and
//! the rest of the scope is indexed without it.

pub mod discover;
pub mod document;
pub mod walk;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cache::content_hash;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::inverted::{build_term_index, corpus_stats};
use crate::types::{SearchIndex, INDEX_VERSION};

pub use discover::{default_file_source, DirectoryWalker, FileSource, ManifestSource};
pub use document::{DefaultDocumentModel, DocumentFormat, DocumentModel, Node};
pub use walk::{index_document, EntrySet};

pub const PROGRESS_DISCOVERED: u8 = 10;
pub const PROGRESS_PARSED: u8 = 90;
pub const PROGRESS_INVERTED: u8 = 95;
pub const PROGRESS_DONE: u8 = 100;

/// Builds a scope's index from scratch.
#[derive(Clone)]
pub struct IndexBuilder {
    config: EngineConfig,
    model: Arc<dyn DocumentModel>,
    source: Option<Arc<dyn FileSource>>,
}

impl IndexBuilder {
    pub fn new(config: EngineConfig) -> Self {
        IndexBuilder {
            config,
            model: Arc::new(DefaultDocumentModel),
            source: None,
        }
    }

    pub fn with_document_model(mut self, model: Arc<dyn DocumentModel>) -> Self {
        self.model = model;
        self
    }

    /// Override enumeration. Without this, the root decides (manifest or walk).
    pub fn with_file_source(mut self, source: Arc<dyn FileSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Candidate files for `root`, through the configured or default source.
    pub fn discover(&self, root: &Path) -> Result<Vec<String>> {
        match &self.source {
            Some(source) => source.candidate_files(root),
            None => default_file_source(root, &self.config).candidate_files(root),
        }
    }

    pub fn build(&self, root: &Path, scope_id: &str) -> Result<SearchIndex> {
        self.build_with_progress(root, scope_id, &|_| {})
    }

    /// Build, calling `progress` with percentages along the way.
    ///
    /// `progress` may be called from rayon worker threads. Values reported by
    /// one build never decrease, though two threads can deliver theirs out of
    /// order.
    pub fn build_with_progress(
        &self,
        root: &Path,
        scope_id: &str,
        progress: &(dyn Fn(u8) + Sync),
    ) -> Result<SearchIndex> {
        let start = Instant::now();
        let reporter = ProgressReporter::new(progress);
        progress(0);

        // Phase 1: discover
        let files = self.discover(root)?;
        debug!(scope = scope_id, files = files.len(), "discovered candidate files");
        reporter.report(PROGRESS_DISCOVERED);

        if files.is_empty() {
            info!(scope = scope_id, "no indexable files, built empty index");
            reporter.report(PROGRESS_DONE);
            return Ok(SearchIndex::empty(scope_id));
        }

        // Phase 2: parse + walk
        let total = files.len();
        let batch = self.config.progress_batch.max(1);
        let done = AtomicUsize::new(0);
        let step = |relative: &String| {
            let parsed = self.parse_file(root, relative);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            if finished % batch == 0 || finished == total {
                reporter.report(parse_progress(finished, total));
            }
            parsed
        };

        #[cfg(feature = "parallel")]
        let parsed: Vec<ParsedFile> = files.par_iter().map(step).collect();
        #[cfg(not(feature = "parallel"))]
        let parsed: Vec<ParsedFile> = files.iter().map(step).collect();

        let mut file_hashes = BTreeMap::new();
        let mut entries = EntrySet::default();
        let mut failed = 0;
        for file in parsed {
            if let Some(hash) = file.hash {
                file_hashes.insert(file.path, hash);
            }
            if file.failed {
                failed += 1;
            }
            entries.extend(file.entries);
        }
        reporter.report(PROGRESS_PARSED);

        // Phases 3 and 4
        let index = assemble(scope_id, file_hashes, entries, || {
            reporter.report(PROGRESS_INVERTED)
        });
        reporter.report(PROGRESS_DONE);

        info!(
            scope = scope_id,
            files = total,
            failed,
            nodes = index.titles.len(),
            terms = index.term_index.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "index built"
        );
        Ok(index)
    }

    fn parse_file(&self, root: &Path, relative: &str) -> ParsedFile {
        let full = root.join(relative);
        let bytes = match fs::read(&full) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = relative, error = %err, "skipping unreadable file");
                return ParsedFile {
                    path: relative.to_string(),
                    hash: None,
                    entries: EntrySet::default(),
                    failed: true,
                };
            }
        };

        let hash = Some(content_hash(&bytes));
        match self.parse_bytes(relative, &bytes) {
            Ok(entries) => ParsedFile {
                path: relative.to_string(),
                hash,
                entries,
                failed: false,
            },
            Err(err) => {
                warn!(path = relative, error = %err, "skipping document that failed to parse");
                ParsedFile {
                    path: relative.to_string(),
                    hash,
                    entries: EntrySet::default(),
                    failed: true,
                }
            }
        }
    }

    fn parse_bytes(&self, relative: &str, bytes: &[u8]) -> Result<EntrySet> {
        let format = DocumentFormat::from_path(Path::new(relative))
            .ok_or_else(|| Error::parse(relative, "unrecognized document format"))?;
        let text = std::str::from_utf8(bytes).map_err(|e| Error::parse(relative, e))?;
        let node = self.model.parse(relative, text, format)?;
        Ok(index_document(relative, &node, &self.config.prose_fields))
    }
}

struct ParsedFile {
    path: String,
    hash: Option<String>,
    entries: EntrySet,
    failed: bool,
}

/// Keeps reported progress monotonic across threads.
struct ProgressReporter<'a> {
    sink: &'a (dyn Fn(u8) + Sync),
    last: AtomicU8,
}

impl<'a> ProgressReporter<'a> {
    fn new(sink: &'a (dyn Fn(u8) + Sync)) -> Self {
        ProgressReporter {
            sink,
            last: AtomicU8::new(0),
        }
    }

    fn report(&self, percent: u8) {
        let percent = percent.min(PROGRESS_DONE);
        if self.last.fetch_max(percent, Ordering::AcqRel) < percent {
            (self.sink)(percent);
        }
    }
}

/// 10% → 90% across the parse phase.
fn parse_progress(finished: usize, total: usize) -> u8 {
    let span = (PROGRESS_PARSED - PROGRESS_DISCOVERED) as usize;
    PROGRESS_DISCOVERED + (span * finished / total.max(1)) as u8
}

/// Turn walked entries into a complete index (phases 3 and 4).
///
/// Used by the builder and by anything that wants an index without touching
/// disk, such as tests and benchmarks.
pub fn assemble_index(
    scope_id: &str,
    file_hashes: BTreeMap<String, String>,
    entries: EntrySet,
) -> SearchIndex {
    assemble(scope_id, file_hashes, entries, || {})
}

fn assemble(
    scope_id: &str,
    file_hashes: BTreeMap<String, String>,
    entries: EntrySet,
    on_inverted: impl FnOnce(),
) -> SearchIndex {
    let term_index = build_term_index(&entries.titles, &entries.metadata, &entries.content);
    on_inverted();

    let (total_docs, avg_doc_length) = corpus_stats(&entries.titles, &entries.content);
    SearchIndex {
        version: INDEX_VERSION.to_string(),
        created: Utc::now(),
        scope_id: scope_id.to_string(),
        file_hashes,
        titles: entries.titles,
        metadata: entries.metadata,
        content: entries.content,
        term_index,
        total_docs,
        avg_doc_length,
    }
}
