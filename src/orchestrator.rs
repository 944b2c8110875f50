// src/orchestrator.rs

//! Top-level coordination.
//!
//! The orchestrator owns the registry, the runner, and the reload notifier.
//! A one-shot invocation resolves the requested tasks and executes the plan;
//! a serve invocation additionally builds the dev graph, starts the file
//! watcher, and stays active rebuilding on coalesced change batches until
//! interrupted.

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::resolve;
use crate::errors::Result;
use crate::registry::TaskRegistry;
use crate::reload::ReloadNotifier;
use crate::runner::{RunReport, TaskRunner};
use crate::watch::{WatchBatch, WatchBinding, spawn_watcher};

/// Phase of the orchestrator over a single invocation.
///
/// `Idle → Resolving → Running → (Serving | Done | Failed)`; `Serving` is
/// indefinite and only ends on an external interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Resolving,
    Running,
    Serving,
    Done,
    Failed,
}

pub struct Orchestrator {
    registry: TaskRegistry,
    runner: TaskRunner,
    notifier: ReloadNotifier,
    serve_task: String,
    phase: RunPhase,
    run_counter: u64,
}

impl Orchestrator {
    pub fn new(
        registry: TaskRegistry,
        runner: TaskRunner,
        notifier: ReloadNotifier,
        serve_task: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            runner,
            notifier,
            serve_task: serve_task.into(),
            phase: RunPhase::Idle,
            run_counter: 0,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn notifier(&self) -> &ReloadNotifier {
        &self.notifier
    }

    fn set_phase(&mut self, phase: RunPhase) {
        if phase != self.phase {
            debug!(from = ?self.phase, to = ?phase, "phase transition");
            self.phase = phase;
        }
    }

    /// Resolve and execute the given targets once.
    ///
    /// Resolution errors (unknown task, dependency cycle) and failed runs
    /// both land the orchestrator in `Failed`; a failed run surfaces as the
    /// aggregate build error listing every failed and skipped task.
    pub async fn run_once(&mut self, targets: &[String]) -> Result<RunReport> {
        self.set_phase(RunPhase::Resolving);
        let plan = match resolve(&self.registry, targets) {
            Ok(plan) => plan,
            Err(err) => {
                self.set_phase(RunPhase::Failed);
                return Err(err);
            }
        };

        self.set_phase(RunPhase::Running);
        let report = self.execute_plan_stages(&plan).await;

        match report.to_error() {
            Some(err) => {
                self.set_phase(RunPhase::Failed);
                Err(err)
            }
            None => {
                self.set_phase(RunPhase::Done);
                Ok(report)
            }
        }
    }

    /// Build the serve graph, then stay active: watch, rebuild, notify.
    ///
    /// The initial build failing is fatal. Once serving, a failed rebuild is
    /// reported and the watch session continues — a bad edit must not kill
    /// the dev session. Terminates on Ctrl-C, releasing the watch bindings;
    /// detached service processes are killed as the runtime shuts down.
    pub async fn serve(
        &mut self,
        root: &Path,
        bindings: Vec<WatchBinding>,
        debounce: Duration,
    ) -> Result<()> {
        self.set_phase(RunPhase::Resolving);
        let targets = vec![self.serve_task.clone()];
        let plan = match resolve(&self.registry, &targets) {
            Ok(plan) => plan,
            Err(err) => {
                self.set_phase(RunPhase::Failed);
                return Err(err);
            }
        };

        self.set_phase(RunPhase::Running);
        let report = self.execute_plan_stages(&plan).await;
        if let Some(err) = report.to_error() {
            self.set_phase(RunPhase::Failed);
            return Err(err);
        }

        let (batch_tx, mut batch_rx) = mpsc::channel::<WatchBatch>(64);
        let _watcher = spawn_watcher(root, bindings, debounce, batch_tx)?;

        self.set_phase(RunPhase::Serving);
        info!(task = %self.serve_task, "serving; watching for changes (Ctrl-C to stop)");

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    if let Err(err) = signal {
                        warn!(error = %err, "failed to listen for Ctrl-C; shutting down");
                    }
                    info!("shutdown requested; releasing watch bindings");
                    break;
                }
                maybe_batch = batch_rx.recv() => {
                    let Some(batch) = maybe_batch else { break };
                    self.run_batch(batch, &mut batch_rx).await?;
                }
            }
        }

        self.set_phase(RunPhase::Idle);
        Ok(())
    }

    /// Run one coalesced batch, then immediately run anything that queued up
    /// behind it. Batches never run concurrently; events arriving while a
    /// run is in flight start their own cycle right after it settles.
    async fn run_batch(
        &mut self,
        first: WatchBatch,
        batch_rx: &mut mpsc::Receiver<WatchBatch>,
    ) -> Result<()> {
        let mut batch = first;

        loop {
            // Union anything already waiting into this cycle.
            while let Ok(more) = batch_rx.try_recv() {
                batch.merge(more);
            }

            if batch.tasks.is_empty() {
                // Reload-only binding: nothing to build, just signal clients.
                if !batch.categories.is_empty() {
                    self.run_counter += 1;
                    self.notifier
                        .broadcast(self.run_counter, batch.categories.clone());
                }
            } else {
                let targets: Vec<String> = batch.tasks.iter().cloned().collect();
                info!(?targets, "change detected; rebuilding");

                // Bindings come from the validated config, so a resolution
                // error here is a genuine configuration bug and fatal even
                // in serve mode.
                let plan = resolve(&self.registry, &targets)?;
                let report = self.execute_plan_stages(&plan).await;

                // Failed rebuilds are reported by the notifier and the
                // watch session continues.
                self.notifier.notify(&report, &batch.categories);
            }

            match batch_rx.try_recv() {
                Ok(next) => batch = next,
                Err(_) => return Ok(()),
            }
        }
    }

    async fn execute_plan_stages(&mut self, plan: &crate::dag::ExecutionPlan) -> RunReport {
        self.run_counter += 1;
        self.runner
            .execute(&self.registry, plan, self.run_counter)
            .await
    }
}
