// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Engine configuration.
//!
//! Everything has a default, so most scopes never need a config file. When a
//! scope root carries a `loresift.toml`, its keys override the defaults one
//! by one; keys it doesn't mention keep their default values.
//!
//! ```toml
//! max_cache_age_days = 3
//! extensions = ["md", "yaml"]
//! timeout_ms = 250
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Name of the optional per-scope config file.
pub const CONFIG_FILE_NAME: &str = "loresift.toml";

/// Default cache artifact name, written under each scope root.
pub const DEFAULT_CACHE_FILE_NAME: &str = ".loresift-index.json";

/// Largest `max_cache_age_days` that still converts to a duration.
pub const MAX_CACHE_AGE_DAYS: u64 = (i64::MAX / 1000 / 86_400) as u64;

/// Tunables for building, caching and searching an index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Cache artifact name, relative to the scope root.
    pub cache_file_name: String,
    /// Caches older than this are rebuilt regardless of their hashes.
    pub max_cache_age_days: u64,
    /// How many file hashes to re-check when validating a cache.
    pub validation_sample_size: usize,
    /// Files parsed between two progress reports.
    pub progress_batch: usize,
    /// File extensions (without the dot) considered indexable.
    pub extensions: Vec<String>,
    /// Skip dot-files and dot-directories during enumeration.
    pub skip_hidden: bool,
    /// Result limit when the caller doesn't give one.
    pub default_limit: usize,
    /// Advisory search budget in milliseconds.
    pub timeout_ms: u64,
    /// Node fields indexed as prose (tier 3).
    pub prose_fields: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cache_file_name: DEFAULT_CACHE_FILE_NAME.to_string(),
            max_cache_age_days: 7,
            validation_sample_size: 10,
            progress_batch: 10,
            extensions: ["md", "markdown", "yaml", "yml", "json"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skip_hidden: true,
            default_limit: 50,
            timeout_ms: 100,
            prose_fields: ["body", "summary", "description", "value"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Load `<root>/loresift.toml` if it exists, defaults otherwise.
    pub fn for_scope(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject settings that would make the engine misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.cache_file_name.trim().is_empty() {
            return Err(Error::Config("cache_file_name must not be empty".into()));
        }
        if self.cache_file_name.contains('/') || self.cache_file_name.contains('\\') {
            return Err(Error::Config(
                "cache_file_name must be a bare file name".into(),
            ));
        }
        if self.progress_batch == 0 {
            return Err(Error::Config("progress_batch must be at least 1".into()));
        }
        if self.default_limit == 0 {
            return Err(Error::Config("default_limit must be at least 1".into()));
        }
        if self.max_cache_age().is_none() {
            return Err(Error::Config(format!(
                "max_cache_age_days must be at most {}",
                MAX_CACHE_AGE_DAYS
            )));
        }
        Ok(())
    }

    /// Maximum cache age as a duration, `None` when it doesn't fit one.
    pub fn max_cache_age(&self) -> Option<chrono::Duration> {
        i64::try_from(self.max_cache_age_days)
            .ok()
            .and_then(chrono::Duration::try_days)
    }

    /// Search timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Set the cache file name.
    pub fn with_cache_file_name(mut self, name: impl Into<String>) -> Self {
        self.cache_file_name = name.into();
        self
    }

    /// Set the maximum cache age in days.
    pub fn with_max_cache_age_days(mut self, days: u64) -> Self {
        self.max_cache_age_days = days;
        self
    }

    /// Set how many hashes are sampled during cache validation.
    pub fn with_validation_sample_size(mut self, size: usize) -> Self {
        self.validation_sample_size = size;
        self
    }

    /// Set the number of files between progress reports.
    pub fn with_progress_batch(mut self, batch: usize) -> Self {
        self.progress_batch = batch.max(1);
        self
    }

    /// Replace the indexable extensions.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the default search timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Does this extension (without dot, any case) get indexed?
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Per-call search options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum number of results returned.
    pub limit: usize,
    /// Advisory budget, checked between tier 2 and tier 3.
    pub timeout: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl SearchOptions {
    /// Options carrying the config's default limit and timeout.
    pub fn from_config(config: &EngineConfig) -> Self {
        SearchOptions {
            limit: config.default_limit,
            timeout: config.timeout(),
        }
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
