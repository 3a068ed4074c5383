// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Candidate file enumeration.
//!
//! A scope root either lists its documents in a `manifest.json`:
//!
//! ```json
//! { "version": 1, "documents": ["characters/aya.yaml", "notes/dune.md"] }
//! ```
//!
//! or gets walked recursively. Both paths apply the same filters (known
//! extension, not the cache file, not hidden) and return paths relative to
//! the root with `/` separators, sorted, so a build sees files in the same
//! order on every platform.

use std::fs;
use std::path::{Component, Path};

use serde::Deserialize;
use walkdir::{DirEntry, WalkDir};

use crate::config::{EngineConfig, CONFIG_FILE_NAME};
use crate::error::{Error, Result};

/// File name that switches a scope to manifest enumeration.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Lists the files of a scope that should be indexed.
pub trait FileSource: Send + Sync {
    /// Relative paths, `/`-separated, sorted and de-duplicated.
    fn candidate_files(&self, root: &Path) -> Result<Vec<String>>;
}

#[derive(Deserialize, Clone, Debug)]
pub struct InputManifest {
    pub version: u32,
    pub documents: Vec<String>,
}

/// Shared filter for both enumeration strategies.
#[derive(Debug, Clone)]
struct CandidateFilter {
    extensions: Vec<String>,
    skip_hidden: bool,
    cache_file_name: String,
}

impl CandidateFilter {
    fn from_config(config: &EngineConfig) -> Self {
        CandidateFilter {
            extensions: config.extensions.clone(),
            skip_hidden: config.skip_hidden,
            cache_file_name: config.cache_file_name.clone(),
        }
    }

    fn accepts(&self, relative: &str) -> bool {
        let path = Path::new(relative);
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if file_name == self.cache_file_name || file_name == CONFIG_FILE_NAME {
            return false;
        }
        if self.skip_hidden && relative.split('/').any(|part| part.starts_with('.')) {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(false, |ext| {
                self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
            })
    }
}

/// Recursive directory walk.
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    filter: CandidateFilter,
}

impl DirectoryWalker {
    pub fn new(config: &EngineConfig) -> Self {
        DirectoryWalker {
            filter: CandidateFilter::from_config(config),
        }
    }
}

impl FileSource for DirectoryWalker {
    fn candidate_files(&self, root: &Path) -> Result<Vec<String>> {
        if !root.is_dir() {
            return Err(Error::ScopeNotFound(root.to_path_buf()));
        }

        let skip_hidden = self.filter.skip_hidden;
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !(skip_hidden && is_hidden(entry)));

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            if let Some(relative) = to_slash_path(relative) {
                if self.filter.accepts(&relative) {
                    files.push(relative);
                }
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map_or(false, |name| name.starts_with('.'))
}

/// Exactly the documents listed in `manifest.json`, minus anything filtered out.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    filter: CandidateFilter,
}

impl ManifestSource {
    pub fn new(config: &EngineConfig) -> Self {
        ManifestSource {
            filter: CandidateFilter::from_config(config),
        }
    }

    pub fn read_manifest(root: &Path) -> Result<InputManifest> {
        let path = root.join(MANIFEST_FILE_NAME);
        let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        serde_json::from_str(&text).map_err(|e| Error::parse(MANIFEST_FILE_NAME, e))
    }
}

impl FileSource for ManifestSource {
    fn candidate_files(&self, root: &Path) -> Result<Vec<String>> {
        if !root.is_dir() {
            return Err(Error::ScopeNotFound(root.to_path_buf()));
        }
        let manifest = Self::read_manifest(root)?;

        let mut files: Vec<String> = manifest
            .documents
            .iter()
            .filter_map(|doc| to_slash_path(Path::new(doc)))
            .filter(|doc| self.filter.accepts(doc))
            .collect();

        files.sort();
        files.dedup();
        Ok(files)
    }
}

/// Manifest enumeration when the root has a manifest, a directory walk otherwise.
pub fn default_file_source(root: &Path, config: &EngineConfig) -> Box<dyn FileSource> {
    if root.join(MANIFEST_FILE_NAME).is_file() {
        Box::new(ManifestSource::new(config))
    } else {
        Box::new(DirectoryWalker::new(config))
    }
}

/// Normal relative path to a `/`-joined string.
///
/// Absolute paths and paths that climb out with `..` have no place in a scope
/// and come back as `None`.
fn to_slash_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!parts.is_empty()).then(|| parts.join("/"))
}
