//! Tests for the scope arena and background builds.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use loresift::build::{DefaultDocumentModel, DocumentFormat, DocumentModel, Node};
use loresift::{EngineConfig, Error, IndexEvent, IndexManager, ScopeState, SearchOptions, Tier};
use parking_lot::Mutex;

use super::common::{ids, ready_scope, sample_scope_dir, write_file, write_generated_corpus, WAIT};

#[test]
fn test_missing_root_fails_at_initialization() {
    let dir = tempfile::tempdir().unwrap();
    let manager = IndexManager::new();

    let err = manager
        .initialize_for_scope("gone", dir.path().join("missing"))
        .unwrap_err();
    assert!(matches!(err, Error::ScopeNotFound(_)));
    assert!(manager.scope("gone").is_none());
}

#[test]
fn test_ready_scope_reports_state() {
    let dir = sample_scope_dir();
    let manager = IndexManager::new();
    let (scope, index) = ready_scope(&manager, "saga", dir.path());

    assert_eq!(scope.state(), ScopeState::Ready);
    assert!(manager.is_ready("saga"));
    assert_eq!(manager.build_progress("saga"), 100);
    assert!(!scope.is_building());
    assert_eq!(index.titles.len(), 3);
    assert!(Arc::ptr_eq(&manager.get_index("saga").unwrap(), &index));
}

#[test]
fn test_initialization_is_idempotent() {
    let dir = sample_scope_dir();
    let manager = IndexManager::new();
    let (first, _) = ready_scope(&manager, "saga", dir.path());
    let second = manager.initialize_for_scope("saga", dir.path()).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(!second.is_building(), "no second build was started");
    assert_eq!(manager.scope_ids(), vec!["saga"]);
}

#[test]
fn test_scopes_are_independent() {
    let saga = sample_scope_dir();
    let other = tempfile::tempdir().unwrap();
    write_file(other.path(), "ship.yaml", "id: ship\ntype: vessel\nname: Aya Star\n");

    let manager = IndexManager::new();
    ready_scope(&manager, "saga", saga.path());
    ready_scope(&manager, "fleet", other.path());

    let opts = SearchOptions::default();
    assert_eq!(ids(&manager.search("saga", "aya", &opts)), vec!["aya"]);
    assert_eq!(ids(&manager.search("fleet", "aya", &opts)), vec!["ship"]);
    assert_eq!(manager.scope_ids(), vec!["fleet", "saga"]);

    assert!(manager.remove_scope("fleet").is_some());
    assert!(manager.search("fleet", "aya", &opts).is_empty());
    assert_eq!(ids(&manager.search("saga", "aya", &opts)), vec!["aya"]);
}

#[test]
fn test_unknown_scope_is_harmless() {
    let manager = IndexManager::new();
    assert!(manager.search("nope", "aya", &SearchOptions::default()).is_empty());
    assert!(manager.get_index("nope").is_none());
    assert!(!manager.is_ready("nope"));
    assert_eq!(manager.build_progress("nope"), 0);
    assert!(manager.force_rebuild("nope").is_err());
}

#[test]
fn test_force_rebuild_emits_progress_then_ready() {
    let dir = sample_scope_dir();
    let manager = IndexManager::new();
    let (scope, before) = ready_scope(&manager, "saga", dir.path());

    write_file(dir.path(), "places/vale.yaml", "id: vale\ntype: location\nname: Vale\n");
    let events = scope.subscribe();
    manager.force_rebuild("saga").unwrap();

    let mut percents = Vec::new();
    let after = loop {
        match events.recv_timeout(WAIT).expect("event before timeout") {
            IndexEvent::Progress { scope, percent } => {
                assert_eq!(scope, "saga");
                percents.push(percent);
            }
            IndexEvent::Ready { index, from_cache, .. } => {
                assert!(!from_cache, "a forced rebuild never reads the cache");
                break index;
            }
            IndexEvent::Failed { message, .. } => panic!("build failed: {message}"),
        }
    };

    assert_eq!(percents.first(), Some(&0));
    assert!(percents.windows(2).all(|w| w[0] < w[1]), "progress increases: {percents:?}");
    assert_eq!(before.titles.len(), 3, "old snapshot is untouched");
    assert_eq!(after.titles.len(), 4);
    assert!(Arc::ptr_eq(&scope.index().unwrap(), &after));
    assert_eq!(ids(&scope.search("vale", &SearchOptions::default())), vec!["vale"]);
}

#[test]
fn test_callbacks_see_ready_and_progress() {
    let dir = sample_scope_dir();
    let manager = IndexManager::new();
    let (scope, _) = ready_scope(&manager, "saga", dir.path());

    // Registered after the fact: fires once immediately.
    let ready_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ready_calls);
    scope.on_ready(move |index| {
        assert_eq!(index.scope_id, "saga");
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(ready_calls.load(Ordering::SeqCst), 1);

    let progress = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&progress);
    scope.on_progress(move |p| sink.lock().push(p));

    scope.force_rebuild().unwrap();
    assert!(scope.wait_idle(WAIT));

    assert_eq!(ready_calls.load(Ordering::SeqCst), 2);
    assert_eq!(progress.lock().last(), Some(&100));
}

#[test]
fn test_repeated_rebuild_requests_coalesce() {
    let dir = tempfile::tempdir().unwrap();
    write_generated_corpus(dir.path(), 300);
    let manager = IndexManager::new();
    let (scope, _) = ready_scope(&manager, "saga", dir.path());

    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let events = scope.subscribe();
    for _ in 0..5 {
        scope.force_rebuild().unwrap();
    }
    assert!(scope.wait_idle(WAIT));
    for event in events.try_iter() {
        if matches!(event, IndexEvent::Ready { .. }) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    // One running plus at most one queued.
    let n = builds.load(Ordering::SeqCst);
    assert!((1..=2).contains(&n), "expected 1 or 2 builds, got {n}");
    assert_eq!(scope.state(), ScopeState::Ready);
}

#[test]
fn test_manager_config_overrides_scope_files() {
    let dir = sample_scope_dir();
    write_file(dir.path(), "loresift.toml", "extensions = [\"json\"]\n");

    // Per-scope file: JSON only
    let (_, index) = ready_scope(&IndexManager::new(), "saga", dir.path());
    assert_eq!(index.titles.len(), 1);
    assert_eq!(index.titles[0].id, "maya");

    // Manager-wide config wins over the file
    let config = EngineConfig::default()
        .with_extensions(["yaml"])
        .with_cache_file_name(".other-cache.json");
    let manager = IndexManager::new().with_config(config);
    let (_, index) = ready_scope(&manager, "saga", dir.path());
    assert_eq!(index.titles.len(), 1);
    assert_eq!(index.titles[0].id, "aya");
}

#[test]
fn test_out_of_range_cache_age_fails_at_initialization() {
    let dir = sample_scope_dir();
    write_file(dir.path(), "loresift.toml", "max_cache_age_days = 9000000000000000\n");
    let err = IndexManager::new()
        .initialize_for_scope("saga", dir.path())
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let config = EngineConfig::default().with_max_cache_age_days(u64::MAX);
    let manager = IndexManager::new().with_config(config);
    let err = manager.initialize_for_scope("saga", dir.path()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(manager.scope("saga").is_none());
}

/// Uppercases every node name, to prove the document model is pluggable.
struct ShoutingModel;

impl DocumentModel for ShoutingModel {
    fn parse(&self, path: &str, text: &str, format: DocumentFormat) -> loresift::Result<Node> {
        let mut node = DefaultDocumentModel.parse(path, text, format)?;
        node.name = node.name.map(|name| name.to_uppercase());
        Ok(node)
    }
}

#[test]
fn test_custom_document_model() {
    let dir = sample_scope_dir();
    let manager = IndexManager::new().with_document_model(Arc::new(ShoutingModel));
    let (scope, _) = ready_scope(&manager, "saga", dir.path());

    let results = scope.search("dune", &SearchOptions::default());
    assert_eq!(results[0].name, "DUNE CITY");
    assert_eq!(results[0].tier, Tier::Title);
}

/// Panics on every parse while armed.
struct TripwireModel {
    armed: Arc<AtomicBool>,
}

impl DocumentModel for TripwireModel {
    fn parse(&self, path: &str, text: &str, format: DocumentFormat) -> loresift::Result<Node> {
        if self.armed.load(Ordering::SeqCst) {
            panic!("tripwire in {path}");
        }
        DefaultDocumentModel.parse(path, text, format)
    }
}

fn tripwire_manager(armed: bool) -> (IndexManager, Arc<AtomicBool>) {
    let armed = Arc::new(AtomicBool::new(armed));
    let model = TripwireModel {
        armed: Arc::clone(&armed),
    };
    (IndexManager::new().with_document_model(Arc::new(model)), armed)
}

#[test]
fn test_panicking_first_build_leaves_scope_usable() {
    let dir = sample_scope_dir();
    let (manager, armed) = tripwire_manager(true);

    let scope = manager.initialize_for_scope("saga", dir.path()).unwrap();
    assert!(scope.wait_idle(WAIT), "worker settles after a panic");
    assert!(!scope.is_building());
    assert_eq!(scope.state(), ScopeState::Idle);
    assert!(scope.index().is_none());
    assert!(scope.wait_ready(Duration::from_millis(10)).is_none());

    armed.store(false, Ordering::SeqCst);
    scope.force_rebuild().unwrap();
    let index = scope.wait_ready(WAIT).expect("rebuild after panic succeeds");
    assert!(scope.wait_idle(WAIT));
    assert_eq!(index.titles.len(), 3);
    assert!(scope.is_ready());
}

#[test]
fn test_panicking_rebuild_keeps_previous_snapshot() {
    let dir = sample_scope_dir();
    let (manager, armed) = tripwire_manager(false);
    let (scope, before) = ready_scope(&manager, "saga", dir.path());

    armed.store(true, Ordering::SeqCst);
    let events = scope.subscribe();
    scope.force_rebuild().unwrap();

    let message = loop {
        match events.recv_timeout(WAIT).expect("event before timeout") {
            IndexEvent::Failed { message, .. } => break message,
            IndexEvent::Ready { .. } => panic!("armed build must not publish"),
            IndexEvent::Progress { .. } => {}
        }
    };
    assert!(message.contains("panicked"), "unexpected message: {message}");
    assert!(scope.wait_idle(WAIT));
    assert_eq!(scope.state(), ScopeState::Ready);
    assert_eq!(scope.build_progress(), 100);
    assert!(Arc::ptr_eq(&scope.index().unwrap(), &before));
    assert_eq!(ids(&scope.search("aya", &SearchOptions::default())), vec!["aya"]);
}

#[test]
fn test_on_ready_never_repeats_a_snapshot() {
    let dir = sample_scope_dir();
    let manager = IndexManager::new();
    let (scope, _) = ready_scope(&manager, "saga", dir.path());

    for _ in 0..20 {
        scope.force_rebuild().unwrap();
        // Registered while the rebuild races to publish.
        let seen = Arc::new(Mutex::new(Vec::<Arc<loresift::SearchIndex>>::new()));
        let sink = Arc::clone(&seen);
        scope.on_ready(move |index| sink.lock().push(Arc::clone(index)));
        assert!(scope.wait_idle(WAIT));

        let seen = seen.lock();
        assert!(!seen.is_empty());
        for (i, a) in seen.iter().enumerate() {
            for b in &seen[i + 1..] {
                assert!(!Arc::ptr_eq(a, b), "snapshot delivered twice to one callback");
            }
        }
    }
}
