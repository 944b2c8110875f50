// src/runner/runner.rs

//! Stage-by-stage plan execution.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, warn};

use crate::dag::ExecutionPlan;
use crate::registry::TaskRegistry;
use crate::runner::context::RunContext;
use crate::runner::report::{RunReport, TaskResult, TaskStatus};

/// Executes a staged [`ExecutionPlan`].
///
/// All tasks within a stage run concurrently (optionally bounded by a
/// worker-count ceiling); the runner waits for every task in a stage to
/// settle before advancing. A task whose prerequisite did not succeed is
/// skipped without ever invoking its action; unrelated tasks keep running
/// and their filesystem effects stand — nothing is rolled back.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    max_workers: Option<usize>,
}

impl TaskRunner {
    /// `max_workers = None` leaves concurrency bounded only by stage width.
    pub fn new(max_workers: Option<usize>) -> Self {
        Self { max_workers }
    }

    pub async fn execute(
        &self,
        registry: &TaskRegistry,
        plan: &ExecutionPlan,
        run_id: u64,
    ) -> RunReport {
        let limiter = self
            .max_workers
            .map(|n| Arc::new(Semaphore::new(n.max(1))));

        let mut statuses: HashMap<String, TaskStatus> = HashMap::new();

        for (stage_idx, stage) in plan.stages.iter().enumerate() {
            debug!(run_id, stage = stage_idx, tasks = ?stage, "starting stage");

            let mut join: JoinSet<(String, TaskStatus)> = JoinSet::new();
            let mut dispatched: Vec<String> = Vec::new();

            for name in stage {
                let Some(task) = registry.get(name) else {
                    warn!(task = %name, "planned task missing from registry");
                    statuses.insert(
                        name.clone(),
                        TaskStatus::Failed {
                            cause: "task not registered".to_string(),
                        },
                    );
                    continue;
                };

                // Skip when any direct prerequisite ended in anything other
                // than success; transitive failures propagate through the
                // chain of skips.
                if let Some(blocked_on) = task.needs.iter().find(|dep| {
                    statuses
                        .get(dep.as_str())
                        .map(|s| !s.is_success())
                        .unwrap_or(false)
                }) {
                    info!(
                        run_id,
                        task = %name,
                        blocked_on = %blocked_on,
                        "skipping task; prerequisite did not succeed"
                    );
                    statuses.insert(
                        name.clone(),
                        TaskStatus::Skipped {
                            blocked_on: blocked_on.clone(),
                        },
                    );
                    continue;
                }

                let action = Arc::clone(&task.action);
                let ctx = RunContext::new(run_id, name.clone());
                let limiter = limiter.clone();
                let task_name = name.clone();

                dispatched.push(name.clone());
                join.spawn(async move {
                    let _permit = match limiter {
                        Some(sem) => match sem.acquire_owned().await {
                            Ok(permit) => Some(permit),
                            Err(_) => {
                                return (
                                    task_name,
                                    TaskStatus::Failed {
                                        cause: "worker pool closed".to_string(),
                                    },
                                );
                            }
                        },
                        None => None,
                    };

                    let span = ctx.span();
                    let status = match action.run(&ctx).instrument(span).await {
                        Ok(()) => TaskStatus::Success,
                        Err(err) => TaskStatus::Failed {
                            cause: format!("{err:#}"),
                        },
                    };
                    (task_name, status)
                });
            }

            while let Some(joined) = join.join_next().await {
                match joined {
                    Ok((name, status)) => {
                        match &status {
                            TaskStatus::Success => info!(run_id, task = %name, "task succeeded"),
                            TaskStatus::Failed { cause } => {
                                warn!(run_id, task = %name, cause = %cause, "task failed")
                            }
                            TaskStatus::Skipped { .. } => {}
                        }
                        statuses.insert(name, status);
                    }
                    Err(join_err) => {
                        error!(run_id, error = %join_err, "task future aborted");
                    }
                }
            }

            // Anything dispatched that never reported back (a panicked
            // action) counts as failed so dependents do not run on top of it.
            for name in dispatched {
                statuses.entry(name).or_insert(TaskStatus::Failed {
                    cause: "task action panicked".to_string(),
                });
            }
        }

        let results: Vec<TaskResult> = plan
            .stages
            .iter()
            .flatten()
            .map(|name| TaskResult {
                name: name.clone(),
                category: registry.get(name).and_then(|t| t.category),
                status: statuses.remove(name).unwrap_or(TaskStatus::Failed {
                    cause: "task never ran".to_string(),
                }),
            })
            .collect();

        RunReport { run_id, results }
    }
}
