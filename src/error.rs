// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The crate error type.
//!
//! Very little in here ever reaches a caller. Search and query parsing are
//! total functions, stale caches are a `None`, and per-document parse
//! failures are logged and skipped by the builder. What's left is the stuff
//! a user actually has to fix: a scope root that doesn't exist, a config
//! file that doesn't parse, a disk that won't give us our bytes.

use std::path::PathBuf;

/// Errors produced by index building, caching and configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The scope root does not exist or is not a directory.
    #[error("scope root does not exist: {}", .0.display())]
    ScopeNotFound(PathBuf),

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document could not be turned into a node tree.
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    /// The cache file could not be encoded or decoded.
    #[error("cache encoding error: {0}")]
    Cache(#[from] serde_json::Error),

    /// Configuration was rejected.
    #[error("invalid config: {0}")]
    Config(String),

    /// The background build thread could not be started.
    #[error("failed to spawn build worker: {0}")]
    Worker(#[source] std::io::Error),
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a parse error for a document path.
    pub fn parse(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
