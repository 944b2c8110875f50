// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::info;

use crate::errors::{Result, StagehandError};
use crate::watch::debounce::{WatchBatch, run_watch_loop};
use crate::watch::patterns::WatchBinding;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive; dropping this handle
/// releases the watch bindings and stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher observing `root` recursively.
///
/// Matching change events are debounced and coalesced; each closed window
/// yields at most one [`WatchBatch`] on `batch_tx`.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Vec<WatchBinding>,
    window: Duration,
    batch_tx: mpsc::Sender<WatchBatch>,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so event paths relativize against a stable base.
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    let bindings = Arc::new(bindings);

    // Channel from the synchronous notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // tracing is not reliably usable from the notify thread.
                    eprintln!("stagehand: failed to forward watch event: {err}");
                }
            }
            Err(err) => {
                eprintln!("stagehand: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .map_err(|e| StagehandError::Config(format!("starting file watcher: {e}")))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| StagehandError::Config(format!("watching {root:?}: {e}")))?;

    info!(root = ?root, bindings = bindings.len(), "file watcher started");

    tokio::spawn(run_watch_loop(root, bindings, window, event_rx, batch_tx));

    Ok(WatcherHandle { _inner: watcher })
}
