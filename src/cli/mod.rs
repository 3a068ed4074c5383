// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the loresift command-line interface.
//!
//! Three subcommands: `index` to build (or load) a scope's index, `search` to
//! query it, and `inspect` to look at the cache file without rebuilding.
//! Each scope is a directory; its cache lives next to the notes it covers.

pub mod display;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use indicatif::ProgressBar;

use loresift::{
    cache, EngineConfig, IndexEvent, IndexManager, ScopeHandle, SearchIndex, SearchOptions,
    SearchResult,
};

use display::*;

/// Longest the CLI waits for a scope to finish building.
const BUILD_WAIT: Duration = Duration::from_secs(600);

/// How often the progress loop re-checks the scope between events.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(
    name = "loresift",
    about = "Tiered fuzzy search over structured story notes",
    version
)]
pub struct Cli {
    /// More logging (-v, -vv, -vvv). RUST_LOG wins when set and no -v is given.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// No logging at all
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a scope's index, or load it from cache when still valid
    Index {
        /// Scope root directory
        root: PathBuf,

        /// Scope id (defaults to the directory name)
        #[arg(long)]
        scope: Option<String>,

        /// Discard the cache and rebuild from scratch
        #[arg(long)]
        force: bool,
    },

    /// Search a scope
    Search {
        /// Scope root directory
        root: PathBuf,

        /// Query, e.g. `aya type:character -villain "time surfing"`
        query: String,

        /// Scope id (defaults to the directory name)
        #[arg(long)]
        scope: Option<String>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Search budget in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what the cache file under a scope root holds
    Inspect {
        /// Scope root directory
        root: PathBuf,
    },
}

/// The directory name, or "default" for paths like `/`.
pub fn default_scope_id(root: &Path) -> String {
    let resolved = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "default".to_string())
}

fn load_config(root: &Path) -> Result<EngineConfig, String> {
    EngineConfig::for_scope(root).map_err(|e| format!("Failed to load config: {}", e))
}

// ═══════════════════════════════════════════════════════════════════════════
// INDEX
// ═══════════════════════════════════════════════════════════════════════════

pub fn run_index(root: &Path, scope: Option<String>, force: bool) -> Result<(), String> {
    let config = load_config(root)?;
    let scope_id = scope.unwrap_or_else(|| default_scope_id(root));

    if force {
        cache::remove(root, &config).map_err(|e| format!("Failed to remove cache: {}", e))?;
    }

    let cache_file = cache::cache_path(root, &config);
    let manager = IndexManager::new().with_config(config);
    let start = Instant::now();
    let handle = manager
        .initialize_for_scope(&scope_id, root)
        .map_err(|e| format!("Failed to initialize scope: {}", e))?;
    let (index, from_cache) = wait_with_progress(&handle)?;
    let elapsed = start.elapsed();

    section_top("INDEX");
    row(&format!(" Scope     {}", themed(BLUE, &[BOLD], &scope_id)));
    row(&format!(
        " Source    {}",
        if from_cache {
            themed(GREEN, &[], "cache")
        } else {
            themed(YELLOW, &[], "fresh build")
        }
    ));
    row(&format!(" Files     {}", index.file_hashes.len()));
    row(&format!(" Nodes     {}", index.titles.len()));
    row(&format!(" Prose     {} entries", index.content.len()));
    row(&format!(" Terms     {}", index.term_index.len()));
    row(&format!(" Elapsed   {}", timing_ms(elapsed.as_secs_f64() * 1000.0)));
    row(&format!(
        " Cache     {}",
        truncate_path(&cache_file.display().to_string(), BOX_WIDTH - 12)
    ));
    section_bot();
    Ok(())
}

/// Follow the scope's events with a progress bar until it is ready.
///
/// Events published before `subscribe` are lost, so the loop also polls the
/// handle and stops once nothing is building anymore.
fn wait_with_progress(handle: &ScopeHandle) -> Result<(Arc<SearchIndex>, bool), String> {
    let events = handle.subscribe();
    let bar = ProgressBar::new(100);
    bar.set_style(progress_style());
    bar.set_prefix("Indexing");
    bar.set_position(u64::from(handle.build_progress()));

    let deadline = Instant::now() + BUILD_WAIT;
    while Instant::now() < deadline {
        match events.recv_timeout(POLL_INTERVAL) {
            Ok(IndexEvent::Progress { percent, .. }) => bar.set_position(u64::from(percent)),
            Ok(IndexEvent::Ready { index, from_cache, .. }) => {
                bar.finish_and_clear();
                return Ok((index, from_cache));
            }
            Ok(IndexEvent::Failed { message, .. }) => {
                bar.abandon();
                return Err(format!("Index build failed: {}", message));
            }
            Err(RecvTimeoutError::Timeout) => {
                if !handle.is_building() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    bar.finish_and_clear();
    match handle.index() {
        // Ready fired before we subscribed, so the source is unknown.
        Some(index) => Ok((index, false)),
        None => Err("Index did not become ready".to_string()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SEARCH
// ═══════════════════════════════════════════════════════════════════════════

pub fn run_search(
    root: &Path,
    query: &str,
    scope: Option<String>,
    limit: Option<usize>,
    timeout_ms: Option<u64>,
    json: bool,
) -> Result<(), String> {
    let config = load_config(root)?;
    let scope_id = scope.unwrap_or_else(|| default_scope_id(root));

    let mut options = SearchOptions::from_config(&config);
    if let Some(limit) = limit {
        options = options.with_limit(limit);
    }
    if let Some(ms) = timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }

    let manager = IndexManager::new().with_config(config);
    let handle = manager
        .initialize_for_scope(&scope_id, root)
        .map_err(|e| format!("Failed to initialize scope: {}", e))?;
    let index = handle
        .wait_ready(BUILD_WAIT)
        .ok_or_else(|| "Index did not become ready".to_string())?;

    let start = Instant::now();
    let results = loresift::search(&index, query, &options);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    if json {
        let text = serde_json::to_string_pretty(&results)
            .map_err(|e| format!("Failed to serialize results: {}", e))?;
        println!("{}", text);
    } else {
        print_results(query, &results, elapsed_ms);
    }
    Ok(())
}

fn print_results(query: &str, results: &[SearchResult], elapsed_ms: f64) {
    section_top("SEARCH");
    row(&format!(
        " {}  {} results in {}",
        themed(YELLOW, &[BOLD], &format!("\"{}\"", query)),
        results.len(),
        timing_ms(elapsed_ms)
    ));

    if results.is_empty() {
        section_bot();
        return;
    }

    section_mid("RESULTS");
    for (rank, result) in results.iter().enumerate() {
        row(&format!(
            " {:>2}. {} {} {} {}",
            rank + 1,
            tier_label(result.tier),
            score_value(result.score),
            themed(BLUE, &[BOLD], &result.name),
            match_type_label(result.match_type)
        ));

        let mut location = result.path.clone();
        if !result.node_path.is_empty() {
            location.push_str(" › ");
            location.push_str(&result.node_path.join(" › "));
        }
        if let Some(field) = &result.field {
            location.push_str(&format!(" [{}]", field));
        }
        row(&format!("       {}", themed(GRAY, &[], &truncate_path(&location, BOX_WIDTH - 8))));

        if let Some(snippet) = &result.snippet {
            row(&format!("       {}", truncate_snippet(snippet, BOX_WIDTH - 8)));
        }
    }
    section_bot();
}

/// Keep the head of a snippet; the match sits near its middle.
fn truncate_snippet(snippet: &str, max_len: usize) -> String {
    if snippet.chars().count() <= max_len {
        snippet.to_string()
    } else {
        let head: String = snippet.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// INSPECT
// ═══════════════════════════════════════════════════════════════════════════

pub fn run_inspect(root: &Path) -> Result<(), String> {
    let config = load_config(root)?;
    let path = cache::cache_path(root, &config);
    let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

    section_top("CACHE");
    row(&format!(" Path      {}", truncate_path(&path.display().to_string(), BOX_WIDTH - 12)));

    let index = match cache::load(root, &config) {
        Ok(index) => index,
        Err(miss) => {
            row(&format!(" Status    {}", themed(RED, &[BOLD], &miss.to_string())));
            section_bot();
            return Ok(());
        }
    };

    let age = Utc::now().signed_duration_since(index.created);
    let validation = match cache::validate(&index, root, config.validation_sample_size) {
        Ok(()) => themed(GREEN, &[], "valid"),
        Err(miss) => themed(YELLOW, &[], &format!("stale ({})", miss)),
    };

    row(&format!(" Status    {}", validation));
    row(&format!(" Size      {}", format_size(size)));
    row(&format!(" Version   {}", index.version));
    row(&format!(" Scope     {}", index.scope_id));
    row(&format!(
        " Created   {} ({}h ago)",
        index.created.format("%Y-%m-%d %H:%M:%S UTC"),
        age.num_hours()
    ));

    section_mid("CONTENTS");
    row(&format!(" Files     {}", index.file_hashes.len()));
    row(&format!(" Titles    {}", index.titles.len()));
    row(&format!(" Metadata  {}", index.metadata.len()));
    row(&format!(" Prose     {}", index.content.len()));
    row(&format!(" Terms     {}", index.term_index.len()));
    row(&format!(" Avg len   {:.1} tokens", index.avg_doc_length));

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for title in &index.titles {
        *by_type.entry(title.node_type.as_str()).or_default() += 1;
    }
    if !by_type.is_empty() {
        section_mid("TYPES");
        for (node_type, count) in by_type {
            row(&format!(" {} {}", pad_right(node_type, 20), count));
        }
    }
    section_bot();
    Ok(())
}
