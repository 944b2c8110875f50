// src/reload.rs

//! Reload signalling for connected dev-server clients.
//!
//! The core does not speak any transport itself; it broadcasts
//! [`ReloadSignal`]s on a channel that an external server subscribes to and
//! forwards to browsers however it likes.

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::runner::RunReport;

/// Which slice of the build output a change touched.
///
/// Carried in reload signals so a client can choose between a full page
/// reload and a lighter in-place update (e.g. style injection for `Styles`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeCategory {
    Markup,
    Styles,
    Scripts,
    Images,
    Assets,
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeCategory::Markup => "markup",
            ChangeCategory::Styles => "styles",
            ChangeCategory::Scripts => "scripts",
            ChangeCategory::Images => "images",
            ChangeCategory::Assets => "assets",
        };
        f.write_str(s)
    }
}

/// Reload message delivered to subscribed clients.
///
/// An empty category set means "something changed, do a full reload".
#[derive(Debug, Clone)]
pub struct ReloadSignal {
    pub run_id: u64,
    pub categories: BTreeSet<ChangeCategory>,
}

/// Broadcasts reload signals after successful watch-triggered runs.
#[derive(Debug)]
pub struct ReloadNotifier {
    tx: broadcast::Sender<ReloadSignal>,
}

impl ReloadNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to reload signals (one receiver per connected client).
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadSignal> {
        self.tx.subscribe()
    }

    /// Decide and broadcast for a settled watch-triggered run.
    ///
    /// A fully successful run broadcasts the rebuilt categories (plus any
    /// reload-only categories from the triggering batch) and returns `true`.
    /// A failed run broadcasts nothing — the developer should see the error,
    /// not a reload into broken output — and returns `false`.
    pub fn notify(&self, report: &RunReport, extra: &BTreeSet<ChangeCategory>) -> bool {
        if !report.succeeded() {
            let failed: Vec<&str> = report.failed().map(|r| r.name.as_str()).collect();
            let skipped: Vec<&str> = report.skipped().map(|r| r.name.as_str()).collect();
            warn!(
                run_id = report.run_id,
                ?failed,
                ?skipped,
                "rebuild failed; not signalling reload"
            );
            return false;
        }

        let mut categories = report.categories_rebuilt();
        categories.extend(extra.iter().copied());

        self.broadcast(report.run_id, categories);
        true
    }

    /// Broadcast a reload without an associated run (reload-only bindings).
    pub fn broadcast(&self, run_id: u64, categories: BTreeSet<ChangeCategory>) {
        info!(run_id, categories = ?categories, "signalling reload");
        if self.tx.receiver_count() > 0 {
            let _ = self.tx.send(ReloadSignal { run_id, categories });
        } else {
            debug!(run_id, "no reload clients connected");
        }
    }
}
