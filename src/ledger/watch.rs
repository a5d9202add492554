//! Best-effort watch on the ledger directory.
//!
//! Another editor process writing the journal is the only signal this
//! process gets that the shared balance moved. Bursts of filesystem events
//! are collapsed: the callback fires once the directory has been quiet for
//! [`DEBOUNCE`].

use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{DopamineError, Result};

/// Quiet period before a change is reported.
pub const DEBOUNCE: Duration = Duration::from_millis(200);

/// Messages consumed by the debounce thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchSignal {
    Changed,
    Stop,
}

/// Handle to a running watcher. Dropping it stops the watch.
pub struct LedgerWatcher {
    watcher: Option<RecommendedWatcher>,
    signals: Sender<WatchSignal>,
    worker: Option<JoinHandle<()>>,
}

impl LedgerWatcher {
    /// Watch `dir` and call `on_change` after each debounced burst of
    /// journal writes.
    pub fn spawn<F>(dir: &Path, on_change: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (signals, rx) = mpsc::channel();

        let events = signals.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if is_journal_write(&event) => {
                let _ = events.send(WatchSignal::Changed);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "ledger watch error"),
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        let worker = thread::Builder::new()
            .name("ledger-watch".to_string())
            .spawn(move || debounce_loop(rx, DEBOUNCE, on_change))
            .map_err(|e| DopamineError::watch(format!("failed to start watch thread: {}", e)))?;

        tracing::debug!(dir = %dir.display(), "watching ledger directory");

        Ok(Self {
            watcher: Some(watcher),
            signals,
            worker: Some(worker),
        })
    }
}

impl Drop for LedgerWatcher {
    fn drop(&mut self) {
        self.watcher.take();
        let _ = self.signals.send(WatchSignal::Stop);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for LedgerWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerWatcher")
            .field("running", &self.worker.is_some())
            .finish()
    }
}

fn is_journal_write(event: &Event) -> bool {
    let relevant_kind = matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_));
    relevant_kind
        && event.paths.iter().any(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with("transactions-") && name.ends_with(".jsonl"))
        })
}

/// Collapse bursts of `Changed` signals and call `on_change` once per burst.
///
/// Returns on `Stop` or when every sender is gone. A burst cut short by
/// `Stop` is not reported.
pub fn debounce_loop<F>(rx: Receiver<WatchSignal>, quiet: Duration, mut on_change: F)
where
    F: FnMut(),
{
    while let Ok(WatchSignal::Changed) = rx.recv() {
        loop {
            match rx.recv_timeout(quiet) {
                Ok(WatchSignal::Changed) => continue,
                Ok(WatchSignal::Stop) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => break,
            }
        }
        on_change();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn counting_loop(quiet: Duration) -> (Sender<WatchSignal>, Arc<AtomicUsize>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let handle = thread::spawn(move || {
            debounce_loop(rx, quiet, move || {
                seen.fetch_add(1, Ordering::SeqCst);
            })
        });
        (tx, count, handle)
    }

    #[test]
    fn test_burst_reported_once() {
        let (tx, count, handle) = counting_loop(Duration::from_millis(50));

        for _ in 0..5 {
            tx.send(WatchSignal::Changed).unwrap();
        }
        thread::sleep(Duration::from_millis(300));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tx.send(WatchSignal::Changed).unwrap();
        thread::sleep(Duration::from_millis(300));
        assert_eq!(count.load(Ordering::SeqCst), 2);

        tx.send(WatchSignal::Stop).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_stop_exits_without_reporting() {
        let (tx, count, handle) = counting_loop(Duration::from_secs(5));
        tx.send(WatchSignal::Changed).unwrap();
        tx.send(WatchSignal::Stop).unwrap();
        handle.join().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disconnect_exits() {
        let (tx, _count, handle) = counting_loop(Duration::from_millis(10));
        drop(tx);
        handle.join().unwrap();
    }

    #[test]
    fn test_spawn_on_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let result = LedgerWatcher::spawn(&dir.path().join("missing"), || {});
        assert!(result.is_err());
    }

    #[test]
    fn test_drop_stops_watcher() {
        let dir = TempDir::new().unwrap();
        let watcher = LedgerWatcher::spawn(dir.path(), || {}).unwrap();
        drop(watcher);
    }

    #[test]
    fn test_journal_write_filter() {
        let event = Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(Path::new("/l/transactions-2025-01.jsonl").to_path_buf());
        assert!(is_journal_write(&event));

        let event = Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(Path::new("/l/transactions-2025-01.tmp").to_path_buf());
        assert!(!is_journal_write(&event));

        let event = Event::new(EventKind::Remove(notify::event::RemoveKind::Any))
            .add_path(Path::new("/l/transactions-2025-01.jsonl").to_path_buf());
        assert!(!is_journal_write(&event));
    }
}
