// Watch mode: regenerate the schema whenever sources change
//
// Three parties are involved. The notify backend forwards raw events over a
// channel, a debounce thread turns bursts of qualifying events into pass
// requests, and the calling thread runs passes one at a time. Requests that
// arrive while a pass is running collapse into a single follow-up pass.

use crate::analysis::Generator;
use crate::error::{Error, Result};
use crate::source::{DirectorySource, SourceProvider};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, SystemTime};

/// Upper bound on size/mtime polls for a file that keeps changing
const MAX_STABILITY_CHECKS: usize = 20;

/// Single-slot queue of pending passes
#[derive(Debug, Default)]
pub struct PassSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

#[derive(Debug, Default)]
struct SlotState {
    pending: bool,
    closed: bool,
}

impl PassSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a pass; returns false if one was already pending
    pub fn request(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let newly = !state.pending;
        state.pending = true;
        self.ready.notify_one();
        newly
    }

    /// Stop accepting work; a pending pass is still handed out
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.closed = true;
        self.ready.notify_all();
    }

    /// Block until a pass should run; false once closed and drained
    pub fn wait(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if state.pending {
                state.pending = false;
                return true;
            }
            if state.closed {
                return false;
            }
            state = self.ready.wait(state).unwrap_or_else(|e| e.into_inner());
        }
    }
}

/// Debounce and stability intervals
#[derive(Debug, Clone, Copy)]
pub struct WatchTiming {
    pub debounce: Duration,
    pub stability: Duration,
}

impl WatchTiming {
    pub fn from_millis(debounce_ms: u64, stability_ms: u64) -> Self {
        Self {
            debounce: Duration::from_millis(debounce_ms),
            stability: Duration::from_millis(stability_ms),
        }
    }
}

/// Decides which file-system events trigger a pass
#[derive(Debug, Clone)]
pub struct EventFilter {
    source: DirectorySource,
    output: PathBuf,
}

impl EventFilter {
    pub fn new(source: DirectorySource, output: PathBuf) -> Self {
        Self { source, output }
    }

    /// Source paths touched by an event that should trigger regeneration
    pub fn qualifying(&self, event: notify::Result<Event>) -> Vec<PathBuf> {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %Error::from(e), "watch error");
                return Vec::new();
            }
        };

        // a renamed or removed directory arrives as one extension-less path
        let structural = matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
        );

        match event.kind {
            EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => event
                .paths
                .into_iter()
                .filter(|p| *p != self.output)
                .filter(|p| self.source.accepts(p) || (structural && self.source.may_contain(p)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Run an initial pass, then regenerate on every settled change until the
/// watcher goes away
///
/// A watcher that cannot start is logged and leaves the initial pass as the
/// only one.
pub fn watch(generator: &mut Generator) -> Result<()> {
    let config = generator.config().clone();

    let mut source_config = config.source.clone();
    if let Ok(root) = source_config.root.canonicalize() {
        source_config.root = root;
    }
    let source = DirectorySource::from_config(&source_config)?;
    let output = config
        .output
        .path
        .canonicalize()
        .unwrap_or_else(|_| config.output.path.clone());

    run_logged(generator, &source);

    let (tx, rx) = mpsc::channel();
    let mut watcher = match notify::recommended_watcher(tx) {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::error!(error = %Error::from(e), "cannot start file watcher");
            return Ok(());
        }
    };
    if let Err(e) = watcher.watch(source.root(), RecursiveMode::Recursive) {
        tracing::error!(
            root = %source.root().display(),
            error = %Error::from(e),
            "cannot watch source directory"
        );
        return Ok(());
    }

    tracing::info!(root = %source.root().display(), "watching for changes");

    let slot = Arc::new(PassSlot::new());
    let timing = WatchTiming::from_millis(config.watch.debounce_ms, config.watch.stability_ms);
    let filter = EventFilter::new(source.clone(), output);
    let debouncer = {
        let slot = Arc::clone(&slot);
        thread::spawn(move || debounce_events(rx, &filter, &slot, timing))
    };

    while slot.wait() {
        run_logged(generator, &source);
    }

    drop(watcher);
    if debouncer.join().is_err() {
        tracing::error!("debounce thread panicked");
    }
    Ok(())
}

/// One pass; failures are logged and the loop keeps going
fn run_logged(generator: &mut Generator, source: &dyn SourceProvider) {
    match generator.run_pass(source) {
        Ok(report) => tracing::info!("{}", report.summary()),
        Err(e) if e.is_fatal_for_pass() => {
            tracing::error!(error = %e, "cannot write schema, previous file left in place")
        }
        Err(e) => tracing::error!(error = %e, "regeneration failed"),
    }
}

/// Collapse bursts of events into pass requests
fn debounce_events(
    rx: Receiver<notify::Result<Event>>,
    filter: &EventFilter,
    slot: &PassSlot,
    timing: WatchTiming,
) {
    let mut connected = true;

    while connected {
        let mut changed: BTreeSet<PathBuf> = match rx.recv() {
            Ok(event) => filter.qualifying(event).into_iter().collect(),
            Err(_) => break,
        };
        if changed.is_empty() {
            continue;
        }

        // wait for a quiet period
        loop {
            match rx.recv_timeout(timing.debounce) {
                Ok(event) => changed.extend(filter.qualifying(event)),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    connected = false;
                    break;
                }
            }
        }

        for path in &changed {
            wait_until_stable(path, timing.stability);
        }

        let first = changed.iter().next().map(|p| p.display().to_string()).unwrap_or_default();
        tracing::info!(files = changed.len(), first = %first, "change detected, regenerating");
        if !slot.request() {
            tracing::debug!("pass already pending, coalesced");
        }
    }

    slot.close();
}

/// Poll size and mtime until two consecutive readings agree
pub fn wait_until_stable(path: &Path, interval: Duration) -> bool {
    let mut last = snapshot(path);
    for _ in 0..MAX_STABILITY_CHECKS {
        thread::sleep(interval);
        let current = snapshot(path);
        if current == last {
            return true;
        }
        last = current;
    }
    tracing::debug!(path = %path.display(), "file still changing, reading anyway");
    false
}

fn snapshot(path: &Path) -> Option<(u64, Option<SystemTime>)> {
    let meta = std::fs::metadata(path).ok()?;
    Some((meta.len(), meta.modified().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};
    use std::sync::mpsc::Sender;

    #[test]
    fn test_slot_coalesces_requests() {
        let slot = PassSlot::new();
        assert!(slot.request());
        assert!(slot.wait());

        // a pass is running; a burst of requests arrives
        assert!(slot.request());
        assert!(!slot.request());
        assert!(!slot.request());

        // exactly one follow-up
        slot.close();
        assert!(slot.wait());
        assert!(!slot.wait());
    }

    #[test]
    fn test_slot_close_drains_pending() {
        let slot = PassSlot::new();
        slot.request();
        slot.close();
        assert!(slot.wait());
        assert!(!slot.wait());
    }

    #[test]
    fn test_slot_close_wakes_waiter() {
        let slot = Arc::new(PassSlot::new());
        let waiter = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.wait())
        };
        thread::sleep(Duration::from_millis(20));
        slot.close();
        assert!(!waiter.join().unwrap());
    }

    #[test]
    fn test_slot_serializes_worker() {
        let slot = Arc::new(PassSlot::new());
        let passes = Arc::new(Mutex::new(0usize));
        let worker = {
            let slot = Arc::clone(&slot);
            let passes = Arc::clone(&passes);
            thread::spawn(move || {
                while slot.wait() {
                    *passes.lock().unwrap() += 1;
                }
            })
        };

        slot.request();
        slot.close();
        worker.join().unwrap();
        assert_eq!(*passes.lock().unwrap(), 1);
    }

    fn filter() -> EventFilter {
        let config = SourceConfig {
            root: PathBuf::from("/app/src"),
            ..SourceConfig::default()
        };
        EventFilter::new(
            DirectorySource::from_config(&config).unwrap(),
            PathBuf::from("/app/prisma/schema.prisma"),
        )
    }

    #[test]
    fn test_filter_accepts_source_changes() {
        let f = filter();
        let created = Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("/app/src/member.ts"));
        assert_eq!(f.qualifying(Ok(created)), vec![PathBuf::from("/app/src/member.ts")]);

        let modified = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/app/src/visit.ts"));
        assert_eq!(f.qualifying(Ok(modified)).len(), 1);

        let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path(PathBuf::from("/app/src/old.ts"));
        assert_eq!(f.qualifying(Ok(removed)).len(), 1);
    }

    #[test]
    fn test_filter_ignores_noise() {
        let f = filter();
        let access = Event::new(EventKind::Access(AccessKind::Any)).add_path(PathBuf::from("/app/src/member.ts"));
        assert!(f.qualifying(Ok(access)).is_empty());

        let metadata = Event::new(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)))
            .add_path(PathBuf::from("/app/src/member.ts"));
        assert!(f.qualifying(Ok(metadata)).is_empty());

        let output = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("/app/prisma/schema.prisma"));
        assert!(f.qualifying(Ok(output)).is_empty());

        let excluded = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/app/src/node_modules/x/index.d.ts"));
        assert!(f.qualifying(Ok(excluded)).is_empty());

        let styles = Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("/app/src/app.css"));
        assert!(f.qualifying(Ok(styles)).is_empty());

        assert!(f.qualifying(Err(notify::Error::generic("boom"))).is_empty());
    }

    #[test]
    fn test_filter_accepts_directory_moves() {
        let f = filter();
        let renamed = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path(PathBuf::from("/app/src/models"));
        assert_eq!(f.qualifying(Ok(renamed)), vec![PathBuf::from("/app/src/models")]);

        let removed = Event::new(EventKind::Remove(RemoveKind::Folder)).add_path(PathBuf::from("/app/src/models"));
        assert_eq!(f.qualifying(Ok(removed)).len(), 1);

        let created = Event::new(EventKind::Create(CreateKind::Folder)).add_path(PathBuf::from("/app/src/legacy"));
        assert_eq!(f.qualifying(Ok(created)).len(), 1);

        // content changes on directories carry no information
        let touched = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Any)))
            .add_path(PathBuf::from("/app/src/models"));
        assert!(f.qualifying(Ok(touched)).is_empty());

        let vendored = Event::new(EventKind::Remove(RemoveKind::Folder))
            .add_path(PathBuf::from("/app/src/node_modules/pkg"));
        assert!(f.qualifying(Ok(vendored)).is_empty());
    }

    fn fast_timing() -> WatchTiming {
        WatchTiming::from_millis(30, 2)
    }

    fn spawn_debouncer(slot: &Arc<PassSlot>) -> (Sender<notify::Result<Event>>, thread::JoinHandle<()>) {
        let (tx, rx) = mpsc::channel();
        let slot = Arc::clone(slot);
        let f = filter();
        let handle = thread::spawn(move || debounce_events(rx, &f, &slot, fast_timing()));
        (tx, handle)
    }

    fn source_event(path: &str) -> notify::Result<Event> {
        Ok(Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(PathBuf::from(path)))
    }

    #[test]
    fn test_debounce_burst_requests_one_pass() {
        let slot = Arc::new(PassSlot::new());
        let (tx, handle) = spawn_debouncer(&slot);

        for path in ["/app/src/member.ts", "/app/src/visit.ts", "/app/src/member.ts"] {
            tx.send(source_event(path)).unwrap();
        }
        assert!(slot.wait());

        drop(tx);
        handle.join().unwrap();
        assert!(!slot.wait());
    }

    #[test]
    fn test_debounce_coalesces_while_pass_pending() {
        let slot = Arc::new(PassSlot::new());
        let (tx, handle) = spawn_debouncer(&slot);

        // two separate bursts, nobody takes the first request
        tx.send(source_event("/app/src/member.ts")).unwrap();
        thread::sleep(Duration::from_millis(150));
        tx.send(source_event("/app/src/visit.ts")).unwrap();
        thread::sleep(Duration::from_millis(150));

        drop(tx);
        handle.join().unwrap();
        assert!(slot.wait());
        assert!(!slot.wait());
    }

    #[test]
    fn test_debounce_ignores_output_and_noise() {
        let slot = Arc::new(PassSlot::new());
        let (tx, handle) = spawn_debouncer(&slot);

        tx.send(source_event("/app/prisma/schema.prisma")).unwrap();
        tx.send(source_event("/app/src/app.css")).unwrap();
        tx.send(Err(notify::Error::generic("boom"))).unwrap();

        drop(tx);
        handle.join().unwrap();
        assert!(!slot.wait());
    }

    #[test]
    fn test_wait_until_stable() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("member.ts");
        std::fs::write(&path, "interface Member {}").unwrap();
        assert!(wait_until_stable(&path, Duration::from_millis(5)));
        assert!(wait_until_stable(&dir.path().join("gone.ts"), Duration::from_millis(5)));
    }
}
