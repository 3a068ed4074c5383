// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! On-disk index cache: one JSON file per scope, next to the documents.
//!
//! A cache is only trusted if it passes three checks, cheapest first:
//!
//! 1. **Version**: `version` must equal [`INDEX_VERSION`]. No migration, a
//!    mismatch is a miss.
//! 2. **Age**: `created` must be within `max_cache_age_days`.
//! 3. **Sample**: up to `validation_sample_size` recorded files are re-read
//!    and re-hashed. One missing file or one changed hash is a miss.
//!
//! The sample is a trade-off: a corpus with thousands of files starts up in
//! the time it takes to hash ten, and in exchange an edit to an unsampled file
//! goes unnoticed until the cache ages out or something sampled changes. The
//! manager adds a cheap file-list comparison on top, which catches added and
//! removed files but not in-place edits.
//!
//! None of these failures is an error. A bad cache is just a cache miss, and
//! the reason goes to the log.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::types::{SearchIndex, INDEX_VERSION};

/// Where a scope's cache lives.
pub fn cache_path(root: &Path, config: &EngineConfig) -> PathBuf {
    root.join(&config.cache_file_name)
}

/// CRC32 of the file bytes as 8 lowercase hex digits.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:08x}", crc32fast::hash(bytes))
}

/// Why a cache was not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMiss {
    Missing,
    Unreadable(String),
    VersionMismatch(String),
    Expired { age_days: i64 },
    FileMissing(String),
    HashMismatch(String),
}

impl std::fmt::Display for CacheMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheMiss::Missing => write!(f, "no cache file"),
            CacheMiss::Unreadable(reason) => write!(f, "unreadable cache: {reason}"),
            CacheMiss::VersionMismatch(found) => {
                write!(f, "format version {found}, expected {INDEX_VERSION}")
            }
            CacheMiss::Expired { age_days } => write!(f, "cache is {age_days} days old"),
            CacheMiss::FileMissing(path) => write!(f, "{path} no longer exists"),
            CacheMiss::HashMismatch(path) => write!(f, "{path} changed since the cache was built"),
        }
    }
}

/// Read and check version and age. Content is not validated here.
pub fn load(root: &Path, config: &EngineConfig) -> std::result::Result<SearchIndex, CacheMiss> {
    let path = cache_path(root, config);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Err(CacheMiss::Missing),
        Err(err) => return Err(CacheMiss::Unreadable(err.to_string())),
    };

    let index: SearchIndex =
        serde_json::from_slice(&bytes).map_err(|e| CacheMiss::Unreadable(e.to_string()))?;

    if !index.is_current_version() {
        return Err(CacheMiss::VersionMismatch(index.version));
    }

    // A limit too large for a duration never expires.
    let age = Utc::now().signed_duration_since(index.created);
    if config.max_cache_age().map_or(false, |max| age > max) {
        return Err(CacheMiss::Expired {
            age_days: age.num_days(),
        });
    }

    Ok(index)
}

/// Re-hash a sample of the recorded files.
pub fn validate(
    index: &SearchIndex,
    root: &Path,
    sample_size: usize,
) -> std::result::Result<(), CacheMiss> {
    for (relative, expected) in sample_entries(&index.file_hashes, sample_size) {
        let bytes = match fs::read(root.join(relative)) {
            Ok(bytes) => bytes,
            Err(_) => return Err(CacheMiss::FileMissing(relative.clone())),
        };
        if content_hash(&bytes) != *expected {
            return Err(CacheMiss::HashMismatch(relative.clone()));
        }
    }
    Ok(())
}

/// Up to `n` entries, spread evenly across the (sorted) map.
///
/// Deterministic: the same map always yields the same sample.
pub fn sample_entries(hashes: &BTreeMap<String, String>, n: usize) -> Vec<(&String, &String)> {
    let len = hashes.len();
    if len <= n {
        return hashes.iter().collect();
    }
    if n == 0 {
        return Vec::new();
    }
    let picks: Vec<usize> = (0..n).map(|i| i * len / n).collect();
    let mut next = 0;
    hashes
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            if next < picks.len() && picks[next] == i {
                next += 1;
                Some(entry)
            } else {
                None
            }
        })
        .collect()
}

/// Load, then validate. `None` means "build from scratch".
pub fn load_valid(root: &Path, config: &EngineConfig, scope_id: &str) -> Option<SearchIndex> {
    let index = match load(root, config) {
        Ok(index) => index,
        Err(CacheMiss::Missing) => {
            debug!(scope = scope_id, "cache miss: no cache file");
            return None;
        }
        Err(miss) => {
            info!(scope = scope_id, reason = %miss, "cache miss");
            return None;
        }
    };

    if let Err(miss) = validate(&index, root, config.validation_sample_size) {
        info!(scope = scope_id, reason = %miss, "cache failed validation");
        return None;
    }

    debug!(
        scope = scope_id,
        files = index.file_hashes.len(),
        nodes = index.titles.len(),
        "cache hit"
    );
    Some(index)
}

/// Write the cache through a sibling temp file and rename it into place.
pub fn save(index: &SearchIndex, root: &Path, config: &EngineConfig) -> Result<()> {
    let path = cache_path(root, config);
    let tmp = root.join(format!("{}.tmp", config.cache_file_name));

    let bytes = serde_json::to_vec(index)?;
    fs::write(&tmp, &bytes).map_err(|e| Error::io(&tmp, e))?;
    if let Err(err) = fs::rename(&tmp, &path) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io(&path, err));
    }

    debug!(path = %path.display(), bytes = bytes.len(), "cache written");
    Ok(())
}

/// Delete a scope's cache. A cache that isn't there counts as removed.
pub fn remove(root: &Path, config: &EngineConfig) -> Result<()> {
    let path = cache_path(root, config);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not remove cache");
            Err(Error::io(path, err))
        }
    }
}
