// src/watch/debounce.rs

//! Debounced coalescing of filesystem events.
//!
//! The watcher is a single loop consuming an event queue: every matching
//! change lands in the [`Coalescer`], and when the debounce window closes the
//! accumulated binding hits are flushed as one [`WatchBatch`]. A multi-file
//! save, or a change matching several overlapping bindings, therefore
//! produces exactly one batch with the union of the triggered task names.
//!
//! The `Coalescer` itself is a pure state machine with an injected clock, so
//! the coalescing rules are testable without a filesystem or timers.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::reload::ChangeCategory;
use crate::watch::hash::HashGate;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchBinding;

/// One coalesced trigger: the union of task names (and reload-only
/// categories) collected during a debounce window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchBatch {
    pub tasks: BTreeSet<String>,
    /// Categories contributed by bindings with no tasks (reload-only).
    pub categories: BTreeSet<ChangeCategory>,
}

impl WatchBatch {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.categories.is_empty()
    }

    /// Union another batch into this one (used when batches queue up behind
    /// an in-flight run).
    pub fn merge(&mut self, other: WatchBatch) {
        self.tasks.extend(other.tasks);
        self.categories.extend(other.categories);
    }
}

/// Pure coalescing state for the watcher loop.
///
/// The window is fixed from the *first* event of a batch — a steady stream
/// of saves cannot starve the flush.
#[derive(Debug)]
pub struct Coalescer {
    window: Duration,
    deadline: Option<Instant>,
    hits: BTreeSet<usize>,
    paths: BTreeSet<PathBuf>,
}

impl Coalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            hits: BTreeSet::new(),
            paths: BTreeSet::new(),
        }
    }

    /// Record that `path` matched the bindings at `binding_indices`.
    ///
    /// The first note after an idle period arms the flush deadline.
    pub fn note<I>(&mut self, binding_indices: I, path: PathBuf, now: Instant)
    where
        I: IntoIterator<Item = usize>,
    {
        let mut any = false;
        for idx in binding_indices {
            self.hits.insert(idx);
            any = true;
        }
        if !any {
            return;
        }
        self.paths.insert(path);
        if self.deadline.is_none() {
            self.deadline = Some(now + self.window);
        }
    }

    /// Deadline at which the current window closes, if one is open.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Close the window and take everything accumulated in it.
    pub fn take(&mut self) -> (BTreeSet<usize>, BTreeSet<PathBuf>) {
        self.deadline = None;
        (
            std::mem::take(&mut self.hits),
            std::mem::take(&mut self.paths),
        )
    }
}

/// The watcher loop: consume raw filesystem events, match them against the
/// bindings, coalesce per debounce window, gate on content hashes, and send
/// the resulting batches to the orchestrator.
///
/// Runs until the event channel closes (watcher dropped) or the batch
/// receiver goes away (orchestrator shut down).
pub(crate) async fn run_watch_loop(
    root: PathBuf,
    bindings: Arc<Vec<WatchBinding>>,
    window: Duration,
    mut event_rx: mpsc::UnboundedReceiver<notify::Event>,
    batch_tx: mpsc::Sender<WatchBatch>,
) {
    let mut coalescer = Coalescer::new(window);
    let mut gate = Some(HashGate::new());

    loop {
        let deadline = coalescer.deadline();

        tokio::select! {
            maybe_event = event_rx.recv() => {
                let Some(event) = maybe_event else { break };
                if matches!(event.kind, notify::EventKind::Access(_)) {
                    continue;
                }
                debug!(?event, "received filesystem event");

                let now = Instant::now();
                for path in event.paths {
                    let Some(rel) = relative_str(&root, &path) else {
                        warn!(?path, ?root, "could not relativize event path");
                        continue;
                    };
                    let matched: Vec<usize> = bindings
                        .iter()
                        .enumerate()
                        .filter(|(_, b)| b.matches(&rel))
                        .map(|(i, _)| i)
                        .collect();
                    if !matched.is_empty() {
                        debug!(path = %rel, bindings = ?matched, "change matched bindings");
                        coalescer.note(matched, path, now);
                    }
                }
            }

            _ = sleep_until_deadline(deadline), if deadline.is_some() => {
                let (hits, paths) = coalescer.take();
                let batch = match evaluate_batch(&root, &bindings, &mut gate, hits, paths).await {
                    Some(batch) => batch,
                    None => continue,
                };
                if batch.is_empty() {
                    continue;
                }
                if batch_tx.send(batch).await.is_err() {
                    debug!("batch receiver closed; stopping watch loop");
                    break;
                }
            }
        }
    }

    debug!("watch loop finished");
}

/// Resolve a window's binding hits into a batch, applying hash gating.
///
/// Hashing reads file contents, so it runs on the blocking pool; the gate is
/// moved in and out of the closure to keep its cache across windows.
async fn evaluate_batch(
    root: &PathBuf,
    bindings: &Arc<Vec<WatchBinding>>,
    gate_slot: &mut Option<HashGate>,
    hits: BTreeSet<usize>,
    paths: BTreeSet<PathBuf>,
) -> Option<WatchBatch> {
    let mut gate = gate_slot.take().unwrap_or_default();
    let root = root.clone();
    let bindings = Arc::clone(bindings);

    let joined = tokio::task::spawn_blocking(move || {
        let mut batch = WatchBatch::default();
        for idx in hits {
            let Some(binding) = bindings.get(idx) else { continue };
            if !gate.content_changed(&root, binding, &paths) {
                continue;
            }
            batch.tasks.extend(binding.tasks().iter().cloned());
            if binding.tasks().is_empty() {
                if let Some(category) = binding.category() {
                    batch.categories.insert(category);
                }
            }
        }
        (batch, gate)
    })
    .await;

    match joined {
        Ok((batch, gate)) => {
            *gate_slot = Some(gate);
            Some(batch)
        }
        Err(err) => {
            warn!(error = %err, "hash gating task panicked; dropping window");
            *gate_slot = Some(HashGate::new());
            None
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
