use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use patternpeek::catalog::{CATALOG, Category, PatternId};
use patternpeek::clock::ManualClock;
use patternpeek::content::{CatalogLoader, DocumentSource, FsLoader, generate_previews};
use patternpeek::loader::{LoadWorker, ResourceLoadError, ResourceLoader};
use patternpeek::placement::{PanelGeometry, Size};
use patternpeek::prefetch::{DEFAULT_DEBOUNCE, PrefetchCoordinator, PrefetchState};
use patternpeek::preview::{HoverPreviewController, PreviewData, Visibility};
use patternpeek::session::HoverSession;

fn pid(s: &str) -> PatternId {
    s.parse().expect("valid pattern id")
}

/// Lay down explanation + code for a few patterns.
fn write_content(root: &Path, ids: &[&str]) {
    for id in ids {
        let dir = root.join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("explanation.md"),
            format!("# {id}\n\nThe {id} pattern, in one paragraph.\n\n## More\n\nDetails."),
        )
        .unwrap();
        let code: Vec<String> = (1..=30).map(|i| format!("// {id} line {i}")).collect();
        fs::write(dir.join("code.txt"), code.join("\n")).unwrap();
    }
}

/// Pump until `done` holds or two seconds pass.
fn pump_until<E: patternpeek::loader::Executor>(
    session: &mut HoverSession<ManualClock, E>,
    mut done: impl FnMut(&HoverSession<ManualClock, E>) -> bool,
) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !done(session) {
        assert!(Instant::now() < deadline, "timed out waiting for loads");
        session.pump();
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn session_over(
    loader: Arc<dyn ResourceLoader>,
) -> (ManualClock, HoverSession<ManualClock, LoadWorker>) {
    let clock = ManualClock::new();
    let worker = LoadWorker::new(loader);
    let session = HoverSession::new(
        PrefetchCoordinator::new(clock.clone(), DEFAULT_DEBOUNCE),
        HoverPreviewController::new(PanelGeometry::default(), Size::new(1200, 900)),
        worker,
    );
    (clock, session)
}

#[test]
fn test_generated_previews_are_served() {
    let dir = tempfile::tempdir().unwrap();
    write_content(dir.path(), &["singleton", "observer"]);

    let report = generate_previews(dir.path(), 15).expect("generation should succeed");
    assert_eq!(report.written, vec![pid("singleton"), pid("observer")]);
    assert_eq!(report.skipped.len(), CATALOG.len() - 2);

    let loader = FsLoader::new(dir.path());
    let p = loader.load_preview(&pid("observer")).unwrap();
    assert_eq!(p.name, "Observer");
    assert_eq!(p.category, Category::Behavioral);
    assert_eq!(p.description, "The observer pattern, in one paragraph.");
    assert_eq!(p.code_preview.lines().count(), 15);
    assert_eq!(p.code_preview.lines().last(), Some("// observer line 15"));
}

#[test]
fn test_missing_preview_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    write_content(dir.path(), &["bridge"]);
    let loader = FsLoader::new(dir.path());
    assert_eq!(
        loader.load_preview(&pid("bridge")),
        Err(ResourceLoadError::NotFound { id: pid("bridge") })
    );
}

#[test]
fn test_hover_session_over_worker_thread() {
    let dir = tempfile::tempdir().unwrap();
    write_content(dir.path(), &["decorator"]);
    generate_previews(dir.path(), 15).unwrap();

    let fs_loader = Arc::new(FsLoader::new(dir.path()));
    let (clock, mut session) = session_over(fs_loader.clone());
    let id = pid("decorator");

    session.pointer_enter(&id, 100, 100);
    pump_until(&mut session, |s| s.preview().visibility() != Visibility::Loading);
    assert_eq!(session.preview().visibility(), Visibility::Visible);
    let rect = session.preview().placement().unwrap();
    assert_eq!((rect.left, rect.top), (120, 110));
    assert!(!fs_loader.is_warm(&id), "debounce has not elapsed yet");

    clock.advance(DEFAULT_DEBOUNCE);
    pump_until(&mut session, |s| s.prefetch().is_prefetched(&id));
    assert!(fs_loader.is_warm(&id));
    assert_eq!(session.prefetch().prefetched_count(), 1);
}

#[test]
fn test_broken_pattern_never_surfaces_errors() {
    let dir = tempfile::tempdir().unwrap();
    let (clock, mut session) = session_over(Arc::new(FsLoader::new(dir.path())));
    let id = pid("memento");

    session.pointer_enter(&id, 10, 10);
    pump_until(&mut session, |s| s.preview().visibility() != Visibility::Loading);
    assert_eq!(session.preview().visibility(), Visibility::Hidden);

    clock.advance(DEFAULT_DEBOUNCE);
    session.pump();
    pump_until(&mut session, |s| !s.is_loading());
    assert_eq!(session.prefetch().state(&id), PrefetchState::Idle);
    assert_eq!(session.prefetch().prefetched_count(), 0);
}

#[test]
fn test_leaving_early_skips_full_load() {
    let (clock, mut session) = session_over(Arc::new(CatalogLoader));
    let id = pid("strategy");
    session.pointer_enter(&id, 10, 10);
    clock.advance(Duration::from_millis(100));
    session.pointer_leave();
    clock.advance(Duration::from_secs(1));
    pump_until(&mut session, |s| !s.is_loading());
    assert_eq!(session.prefetch().state(&id), PrefetchState::Idle);
    assert_eq!(session.preview().visibility(), Visibility::Hidden);
}

/// Catalog text, except that full loads of `stuck` never return until the
/// gate's sender is dropped.
struct Stalled {
    stuck: PatternId,
    gate: Mutex<mpsc::Receiver<()>>,
}

impl ResourceLoader for Stalled {
    fn load_full(&self, id: &PatternId) -> Result<(), ResourceLoadError> {
        if *id == self.stuck {
            let _ = self.gate.lock().unwrap().recv();
        }
        CatalogLoader.load_full(id)
    }

    fn load_preview(&self, id: &PatternId) -> Result<PreviewData, ResourceLoadError> {
        CatalogLoader.load_preview(id)
    }
}

#[test]
fn test_stuck_full_load_does_not_block_next_hover() {
    let (open_gate, gate) = mpsc::channel::<()>();
    let loader = Arc::new(Stalled { stuck: pid("proxy"), gate: Mutex::new(gate) });
    let (clock, mut session) = session_over(loader);

    session.pointer_enter(&pid("proxy"), 10, 10);
    clock.advance(DEFAULT_DEBOUNCE);
    pump_until(&mut session, |s| s.prefetch().is_prefetching(&pid("proxy")));

    session.pointer_enter(&pid("facade"), 10, 40);
    pump_until(&mut session, |s| s.preview().visibility() == Visibility::Visible);
    assert_eq!(session.preview().hovered(), Some(&pid("facade")));

    clock.advance(DEFAULT_DEBOUNCE);
    pump_until(&mut session, |s| s.prefetch().is_prefetched(&pid("facade")));
    assert!(session.prefetch().is_prefetching(&pid("proxy")));

    let start = Instant::now();
    drop(session);
    assert!(start.elapsed() < Duration::from_millis(500));
    drop(open_gate);
}

#[test]
fn test_catalog_loader_covers_every_entry() {
    let loader = CatalogLoader;
    for entry in &CATALOG {
        let id = entry.pattern_id();
        let p = loader.load_preview(&id).unwrap();
        assert_eq!(p.name, entry.name);
        let doc = loader.document(&id).unwrap();
        assert!(doc.explanation.contains(entry.intent));
    }
}
