//! Filesystem watching for incremental rebuilds.
//!
//! Events from `notify` are debounced and fed to the Director's
//! incremental entry points, one path at a time. A failed rebuild is
//! logged and the loop keeps running; only watcher-setup failures abort.

use crate::director::Director;
use crate::error::{AbortError, Result};
use crate::log;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::RecvTimeoutError,
    },
    time::{Duration, Instant},
};

const DEBOUNCE_MS: u64 = 300;

/// Editor artifacts that fire events but never matter.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

const fn is_relevant(event: &Event) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
}

/// Batches rapid file events so one save does not trigger several builds.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<PathBuf> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            // Long poll; the stop flag is still checked on every wakeup.
            Duration::from_millis(1000)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

/// Rebuild whatever a batch of changed paths touches.
fn handle_changes(director: &mut Director, paths: &[PathBuf]) {
    for path in paths {
        let result = if path.is_dir() {
            director.process_directory(path)
        } else if path.is_file() {
            director.process_file(path)
        } else {
            // Deleted between the event and now.
            Ok(())
        };

        if let Err(err) = result {
            log!("watch"; "rebuild failed for {}", path.display());
            log!("watch"; "{err}");
        }
    }
}

/// Watch the site tree and rebuild on changes until `stop` is set.
///
/// Blocks the calling thread; the serve loop runs this on a dedicated
/// thread with a Director built there.
pub fn watch_site(director: &mut Director, stop: &Arc<AtomicBool>) -> Result<()> {
    let site_path = director.site_path().to_path_buf();
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)
        .map_err(|err| AbortError::msg(format!("failed to create file watcher: {err}")))?;
    watcher
        .watch(&site_path, RecursiveMode::Recursive)
        .map_err(|err| {
            AbortError::msg(format!("failed to watch {}: {err}", site_path.display()))
        })?;

    log!("watch"; "watching {} ...", site_path.display());
    let mut debouncer = Debouncer::new();

    while !stop.load(Ordering::SeqCst) {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Ok(_)) => {}
            Ok(Err(err)) => log!("watch"; "watcher error: {err}"),
            Err(RecvTimeoutError::Timeout) => {
                if debouncer.ready() {
                    handle_changes(director, &debouncer.take());
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_files_detected() {
        assert!(is_temp_file(Path::new("a.swp")));
        assert!(is_temp_file(Path::new("a.md~")));
        assert!(is_temp_file(Path::new(".hidden")));
        assert!(!is_temp_file(Path::new("index.md")));
    }

    #[test]
    fn test_debounce_batches_and_dedupes() {
        let mut debouncer = Debouncer::new();
        let event = |path: &str| Event {
            kind: EventKind::Modify(notify::event::ModifyKind::Any),
            paths: vec![PathBuf::from(path)],
            attrs: Default::default(),
        };

        debouncer.add(event("a.md"));
        debouncer.add(event("a.md"));
        debouncer.add(event("b.md"));
        debouncer.add(event("c.swp"));
        assert!(!debouncer.ready());

        std::thread::sleep(Duration::from_millis(DEBOUNCE_MS + 50));
        assert!(debouncer.ready());
        let paths = debouncer.take();
        assert_eq!(paths, vec![PathBuf::from("a.md"), PathBuf::from("b.md")]);
        assert!(!debouncer.ready());
    }
}
