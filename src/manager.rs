// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Index lifecycle: load from cache or build, then serve snapshots.
//!
//! One [`IndexManager`] holds any number of scopes, each an independent
//! [`ScopeHandle`] with its own state, snapshot, build lock and observers.
//!
//! # State machine
//!
//! ```text
//!            initialize                 cache valid
//!   Idle ───────────────▶ Loading ─────────────────────────▶ Ready
//!                            │                                 ▲  │
//!                            │ cache miss                      │  │ force_rebuild
//!                            ▼                                 │  ▼
//!                         Building ────────────────────────────┘ Building
//!                            │ build failed
//!                            ▼
//!                   Idle (or Ready, if an older snapshot exists)
//! ```
//!
//! # Threads
//!
//! Builds never run on the caller's thread. `initialize_for_scope` and
//! `force_rebuild` hand the work to a dedicated worker thread and return at
//! once. Readers take an `Arc` of the current snapshot; a finished build swaps
//! in a new one, so a reader never sees a half-built index and a search that
//! started on the old snapshot finishes on it.
//!
//! # Build lock
//!
//! At most one build runs per scope and at most one more waits behind it.
//! Asking again while one is already waiting does nothing: the waiting build
//! will read the files after the latest change anyway.

use std::collections::HashMap;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::build::{DefaultDocumentModel, DocumentModel, IndexBuilder, PROGRESS_DONE};
use crate::cache;
use crate::config::{EngineConfig, SearchOptions};
use crate::error::{Error, Result};
use crate::search::search;
use crate::types::{SearchIndex, SearchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    Idle,
    Loading,
    Building,
    Ready,
}

/// What a subscriber hears about a scope.
#[derive(Debug, Clone)]
pub enum IndexEvent {
    Progress {
        scope: String,
        percent: u8,
    },
    Ready {
        scope: String,
        index: Arc<SearchIndex>,
        from_cache: bool,
    },
    Failed {
        scope: String,
        message: String,
    },
}

type ReadyCallback = Arc<dyn Fn(&Arc<SearchIndex>) + Send + Sync>;
type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

#[derive(Default)]
struct Observers {
    ready: Vec<ReadyCallback>,
    progress: Vec<ProgressCallback>,
    channels: Vec<Sender<IndexEvent>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildRequest {
    /// Use the cache if it validates, build otherwise.
    LoadOrBuild,
    /// Delete the cache and build.
    Rebuild,
}

#[derive(Debug, Default)]
struct BuildSlot {
    running: bool,
    queued: Option<BuildRequest>,
}

/// One indexed scope.
pub struct ScopeHandle {
    id: String,
    root: PathBuf,
    builder: IndexBuilder,
    state: Mutex<ScopeState>,
    snapshot: RwLock<Option<Arc<SearchIndex>>>,
    progress: AtomicU8,
    slot: Mutex<BuildSlot>,
    observers: Mutex<Observers>,
    signal: Mutex<()>,
    changed: Condvar,
}

impl fmt::Debug for ScopeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeHandle")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("state", &self.state())
            .field("progress", &self.build_progress())
            .finish()
    }
}

impl ScopeHandle {
    fn new(id: &str, root: &Path, builder: IndexBuilder) -> Self {
        ScopeHandle {
            id: id.to_string(),
            root: root.to_path_buf(),
            builder,
            state: Mutex::new(ScopeState::Idle),
            snapshot: RwLock::new(None),
            progress: AtomicU8::new(0),
            slot: Mutex::new(BuildSlot::default()),
            observers: Mutex::new(Observers::default()),
            signal: Mutex::new(()),
            changed: Condvar::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &EngineConfig {
        self.builder.config()
    }

    pub fn state(&self) -> ScopeState {
        *self.state.lock()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ScopeState::Ready
    }

    /// The current snapshot. During a rebuild this is still the previous one.
    pub fn index(&self) -> Option<Arc<SearchIndex>> {
        self.snapshot.read().clone()
    }

    /// 0–100 for the build in flight, 100 once ready.
    pub fn build_progress(&self) -> u8 {
        self.progress.load(Ordering::Acquire)
    }

    /// Is a build running or waiting to run?
    pub fn is_building(&self) -> bool {
        let slot = self.slot.lock();
        slot.running || slot.queued.is_some()
    }

    /// Call `callback` with every new snapshot, on the worker thread.
    ///
    /// If a snapshot is already ready, `callback` also runs once right away.
    pub fn on_ready(&self, callback: impl Fn(&Arc<SearchIndex>) + Send + Sync + 'static) {
        let callback: ReadyCallback = Arc::new(callback);
        let current = {
            let mut observers = self.observers.lock();
            observers.ready.push(Arc::clone(&callback));
            self.index()
        };
        if let Some(index) = current {
            callback(&index);
        }
    }

    /// Call `callback` with each new progress percentage, on the worker thread.
    pub fn on_progress(&self, callback: impl Fn(u8) + Send + Sync + 'static) {
        self.observers.lock().progress.push(Arc::new(callback));
    }

    /// A channel of every event from now on. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<IndexEvent> {
        let (tx, rx) = unbounded();
        self.observers.lock().channels.push(tx);
        rx
    }

    /// Discard the cache and rebuild in the background.
    pub fn force_rebuild(self: &Arc<Self>) -> Result<()> {
        info!(scope = %self.id, "rebuild requested");
        self.request(BuildRequest::Rebuild)
    }

    /// Block until a snapshot exists, the timeout passes, or a build fails
    /// with nothing to fall back on.
    pub fn wait_ready(&self, timeout: Duration) -> Option<Arc<SearchIndex>> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.signal.lock();
        loop {
            if let Some(index) = self.index() {
                return Some(index);
            }
            if !self.is_building() {
                return None;
            }
            if self.changed.wait_until(&mut guard, deadline).timed_out() {
                return self.index();
            }
        }
    }

    /// Block until no build is running or queued. Returns false on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.signal.lock();
        loop {
            if !self.is_building() {
                return true;
            }
            if self.changed.wait_until(&mut guard, deadline).timed_out() {
                return !self.is_building();
            }
        }
    }

    /// Search the current snapshot. No snapshot, no results.
    pub fn search(&self, raw: &str, options: &SearchOptions) -> Vec<SearchResult> {
        match self.index() {
            Some(index) => search(&index, raw, options),
            None => Vec::new(),
        }
    }

    fn request(self: &Arc<Self>, request: BuildRequest) -> Result<()> {
        {
            let mut slot = self.slot.lock();
            if slot.running {
                match slot.queued {
                    None => slot.queued = Some(request),
                    Some(BuildRequest::LoadOrBuild) if request == BuildRequest::Rebuild => {
                        slot.queued = Some(request)
                    }
                    Some(_) => {}
                }
                debug!(scope = %self.id, ?request, "build in flight, request queued");
                return Ok(());
            }
            slot.running = true;
        }

        let handle = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("loresift-build-{}", self.id))
            .spawn(move || handle.run_worker(request));

        if let Err(err) = spawned {
            self.slot.lock().running = false;
            self.notify();
            return Err(Error::Worker(err));
        }
        Ok(())
    }

    fn run_worker(self: Arc<Self>, first: BuildRequest) {
        let mut request = first;
        loop {
            // A panicking build must still release the slot below.
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_once(request)));
            if let Err(payload) = outcome {
                let message = panic_message(payload.as_ref());
                error!(scope = %self.id, %message, "index build panicked");
                self.fail(format!("build panicked: {message}"));
            }
            let mut slot = self.slot.lock();
            match slot.queued.take() {
                Some(next) => request = next,
                None => {
                    slot.running = false;
                    break;
                }
            }
        }
        self.notify();
    }

    fn run_once(&self, request: BuildRequest) {
        let config = self.builder.config();
        self.progress.store(0, Ordering::Release);

        match request {
            BuildRequest::Rebuild => {
                // `remove` logs its own failure; a stale cache left behind is
                // overwritten by the save below anyway.
                let _ = cache::remove(&self.root, config);
            }
            BuildRequest::LoadOrBuild => {
                self.set_state(ScopeState::Loading);
                if let Some(index) = self.load_cache() {
                    self.publish(index, true);
                    return;
                }
            }
        }

        self.set_state(ScopeState::Building);
        self.emit(IndexEvent::Progress {
            scope: self.id.clone(),
            percent: 0,
        });

        let built = self
            .builder
            .build_with_progress(&self.root, &self.id, &|percent| self.set_progress(percent));

        match built {
            Ok(index) => {
                if let Err(err) = cache::save(&index, &self.root, config) {
                    warn!(scope = %self.id, error = %err, "could not persist index cache");
                }
                self.publish(index, false);
            }
            Err(err) => {
                error!(scope = %self.id, error = %err, "index build failed");
                self.fail(err.to_string());
            }
        }
    }

    /// Fall back to the previous snapshot, if any, and announce the failure.
    fn fail(&self, message: String) {
        let fallback = if self.snapshot.read().is_some() {
            ScopeState::Ready
        } else {
            ScopeState::Idle
        };
        self.set_state(fallback);
        if fallback == ScopeState::Ready {
            self.progress.store(PROGRESS_DONE, Ordering::Release);
        }
        self.emit(IndexEvent::Failed {
            scope: self.id.clone(),
            message,
        });
    }

    fn load_cache(&self) -> Option<SearchIndex> {
        let index = cache::load_valid(&self.root, self.config(), &self.id)?;

        if index.scope_id != self.id {
            info!(
                scope = %self.id,
                cached = %index.scope_id,
                "cache miss: built for another scope"
            );
            return None;
        }

        match self.builder.discover(&self.root) {
            Ok(files) if files.iter().eq(index.file_hashes.keys()) => Some(index),
            Ok(files) => {
                info!(
                    scope = %self.id,
                    cached = index.file_hashes.len(),
                    found = files.len(),
                    "cache miss: file list changed"
                );
                None
            }
            Err(err) => {
                warn!(scope = %self.id, error = %err, "could not list files to check cache");
                None
            }
        }
    }

    fn publish(&self, index: SearchIndex, from_cache: bool) {
        let index = Arc::new(index);
        self.set_progress(PROGRESS_DONE);

        info!(
            scope = %self.id,
            nodes = index.titles.len(),
            terms = index.term_index.len(),
            from_cache,
            "index ready"
        );
        let event = IndexEvent::Ready {
            scope: self.id.clone(),
            index: Arc::clone(&index),
            from_cache,
        };
        // Swap under the observer lock: `on_ready` either sees this snapshot
        // or is in the list below, never both.
        let ready = {
            let mut observers = self.observers.lock();
            *self.snapshot.write() = Some(Arc::clone(&index));
            self.set_state(ScopeState::Ready);
            observers.channels.retain(|tx| tx.send(event.clone()).is_ok());
            observers.ready.clone()
        };
        for callback in &ready {
            callback(&index);
        }
        self.notify();
    }

    fn set_state(&self, state: ScopeState) {
        let mut current = self.state.lock();
        if *current != state {
            debug!(scope = %self.id, from = ?*current, to = ?state, "state change");
            *current = state;
        }
    }

    /// Record and announce progress. Out-of-order reports are dropped.
    fn set_progress(&self, percent: u8) {
        let previous = self.progress.fetch_max(percent, Ordering::AcqRel);
        if percent > previous {
            self.emit(IndexEvent::Progress {
                scope: self.id.clone(),
                percent,
            });
        }
    }

    fn emit(&self, event: IndexEvent) {
        let progress = {
            let mut observers = self.observers.lock();
            observers
                .channels
                .retain(|tx| tx.send(event.clone()).is_ok());
            observers.progress.clone()
        };
        if let IndexEvent::Progress { percent, .. } = &event {
            for callback in &progress {
                callback(*percent);
            }
        }
    }

    fn notify(&self) {
        let _guard = self.signal.lock();
        self.changed.notify_all();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "(non-string panic)".to_string())
}

/// The arena of scopes, keyed by scope id.
pub struct IndexManager {
    scopes: RwLock<HashMap<String, Arc<ScopeHandle>>>,
    config: Option<EngineConfig>,
    model: Arc<dyn DocumentModel>,
}

impl Default for IndexManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexManager")
            .field("scopes", &self.scope_ids())
            .finish()
    }
}

impl IndexManager {
    /// Each scope reads `loresift.toml` from its root, if any.
    pub fn new() -> Self {
        IndexManager {
            scopes: RwLock::new(HashMap::new()),
            config: None,
            model: Arc::new(DefaultDocumentModel),
        }
    }

    /// Use this config for every scope instead of per-root files.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_document_model(mut self, model: Arc<dyn DocumentModel>) -> Self {
        self.model = model;
        self
    }

    /// Register a scope and start loading or building its index.
    ///
    /// Idempotent: a scope id that is already registered returns its existing
    /// handle and starts nothing. Fails only if `root` is not a directory, its
    /// config is invalid, or the worker thread can't be spawned.
    pub fn initialize_for_scope(
        &self,
        scope_id: &str,
        root: impl AsRef<Path>,
    ) -> Result<Arc<ScopeHandle>> {
        let root = root.as_ref();
        let mut scopes = self.scopes.write();
        if let Some(existing) = scopes.get(scope_id) {
            if existing.root() != root {
                warn!(
                    scope = scope_id,
                    registered = %existing.root().display(),
                    requested = %root.display(),
                    "scope already registered with a different root"
                );
            }
            return Ok(Arc::clone(existing));
        }

        if !root.is_dir() {
            return Err(Error::ScopeNotFound(root.to_path_buf()));
        }
        let config = match &self.config {
            Some(config) => {
                config.validate()?;
                config.clone()
            }
            None => EngineConfig::for_scope(root)?,
        };
        let builder = IndexBuilder::new(config).with_document_model(Arc::clone(&self.model));
        let handle = Arc::new(ScopeHandle::new(scope_id, root, builder));

        handle.request(BuildRequest::LoadOrBuild)?;
        scopes.insert(scope_id.to_string(), Arc::clone(&handle));
        info!(scope = scope_id, root = %root.display(), "scope initialized");
        Ok(handle)
    }

    pub fn scope(&self, scope_id: &str) -> Option<Arc<ScopeHandle>> {
        self.scopes.read().get(scope_id).cloned()
    }

    /// Registered scope ids, sorted.
    pub fn scope_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.scopes.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Forget a scope. A build in flight finishes on its own thread.
    pub fn remove_scope(&self, scope_id: &str) -> Option<Arc<ScopeHandle>> {
        self.scopes.write().remove(scope_id)
    }

    pub fn get_index(&self, scope_id: &str) -> Option<Arc<SearchIndex>> {
        self.scope(scope_id).and_then(|scope| scope.index())
    }

    pub fn is_ready(&self, scope_id: &str) -> bool {
        self.scope(scope_id).map_or(false, |scope| scope.is_ready())
    }

    pub fn build_progress(&self, scope_id: &str) -> u8 {
        self.scope(scope_id).map_or(0, |scope| scope.build_progress())
    }

    pub fn force_rebuild(&self, scope_id: &str) -> Result<()> {
        let scope = self
            .scope(scope_id)
            .ok_or_else(|| Error::ScopeNotFound(PathBuf::from(scope_id)))?;
        scope.force_rebuild()
    }

    /// Search a scope. Unknown scopes and scopes still loading give no results.
    pub fn search(&self, scope_id: &str, raw: &str, options: &SearchOptions) -> Vec<SearchResult> {
        match self.scope(scope_id) {
            Some(scope) => scope.search(raw, options),
            None => Vec::new(),
        }
    }
}
